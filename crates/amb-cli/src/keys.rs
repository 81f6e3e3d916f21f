//! # Approver Role Keys
//!
//! One Ed25519 seed per approver role, stored hex-encoded as
//! `<keys-dir>/<role>.key` (e.g. `keys/role_a.key`). The seeds sign
//! approval calls against a local registry; the derived addresses form
//! the registry's role table.

use std::path::{Path, PathBuf};

use amb_core::Role;
use amb_ledger::Ed25519KeyPair;
use amb_registry::RoleTable;
use anyhow::{bail, Context, Result};

/// Path of the seed file for `role` under `dir`.
pub fn key_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("{}.key", role.as_str()))
}

/// Decode a 64-character hex seed.
pub fn parse_seed(hex: &str) -> Result<[u8; 32]> {
    let hex = hex.trim();
    if hex.len() != 64 {
        bail!("seed must be 64 hex characters, got {}", hex.len());
    }
    let mut seed = [0u8; 32];
    for (i, byte) in seed.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .with_context(|| format!("invalid hex at offset {}", i * 2))?;
    }
    Ok(seed)
}

fn encode_seed(seed: &[u8; 32]) -> String {
    seed.iter().map(|b| format!("{b:02x}")).collect()
}

/// The three approver key pairs.
#[derive(Debug)]
pub struct RoleKeys {
    keys: Vec<(Role, Ed25519KeyPair)>,
}

impl RoleKeys {
    /// Load every role's seed from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut keys = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let path = key_path(dir, role);
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {role} key from {}", path.display()))?;
            let seed = parse_seed(&raw).with_context(|| format!("parsing {}", path.display()))?;
            keys.push((role, Ed25519KeyPair::from_seed(&seed)));
        }
        Ok(Self { keys })
    }

    /// Load existing seeds from `dir`, generating any that are missing.
    ///
    /// With `force`, every seed is regenerated.
    pub fn load_or_generate(dir: &Path, force: bool) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating key directory {}", dir.display()))?;
        for role in Role::ALL {
            let path = key_path(dir, role);
            if path.exists() && !force {
                tracing::debug!(%role, path = %path.display(), "keeping existing key");
                continue;
            }
            let seed: [u8; 32] = rand::random();
            std::fs::write(&path, encode_seed(&seed))
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(%role, path = %path.display(), "generated role key");
        }
        Self::load(dir)
    }

    /// Key pair holding `role`.
    pub fn get(&self, role: Role) -> &Ed25519KeyPair {
        // `load` fills every role in `Role::ALL` order.
        &self.keys[role_index(role)].1
    }

    /// Iterate over `(role, key)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &Ed25519KeyPair)> {
        self.keys.iter().map(|(role, key)| (*role, key))
    }

    /// Registry role table derived from the key addresses.
    pub fn role_table(&self) -> Result<RoleTable> {
        RoleTable::new(
            self.get(Role::RoleA).address(),
            self.get(Role::RoleB).address(),
            self.get(Role::RoleC).address(),
        )
        .context("building role table")
    }
}

fn role_index(role: Role) -> usize {
    match role {
        Role::RoleA => 0,
        Role::RoleB => 1,
        Role::RoleC => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_hex_round_trips() {
        let seed = [0xabu8; 32];
        assert_eq!(parse_seed(&encode_seed(&seed)).unwrap(), seed);
        assert_eq!(parse_seed(&format!("{}\n", encode_seed(&seed))).unwrap(), seed);
    }

    #[test]
    fn malformed_seed_rejected() {
        assert!(parse_seed("abcd").is_err());
        assert!(parse_seed(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn generated_keys_are_stable_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let first = RoleKeys::load_or_generate(dir.path(), false).unwrap();
        let second = RoleKeys::load_or_generate(dir.path(), false).unwrap();
        for role in Role::ALL {
            assert_eq!(first.get(role).address(), second.get(role).address());
            assert!(key_path(dir.path(), role).exists());
        }
        let table = first.role_table().unwrap();
        assert_eq!(table.holder(Role::RoleB), first.get(Role::RoleB).address());
    }

    #[test]
    fn force_regenerates_keys() {
        let dir = tempfile::tempdir().unwrap();
        let first = RoleKeys::load_or_generate(dir.path(), false).unwrap();
        let second = RoleKeys::load_or_generate(dir.path(), true).unwrap();
        assert_ne!(first.get(Role::RoleA).address(), second.get(Role::RoleA).address());
    }

    #[test]
    fn missing_key_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RoleKeys::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("role_a"));
    }
}

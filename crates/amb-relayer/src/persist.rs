//! # Relayer State Persistence
//!
//! The relayer's per-asset records and registry cursor, as one JSON file.
//! Writes go to a sibling temp file, are synced, and are renamed into
//! place, so a crash mid-write leaves the previous snapshot intact.
//!
//! The snapshot is advisory. [`PersistedState::trusted`] keeps only
//! `Confirmed` records; everything else is re-derived from the ledgers on
//! startup.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use amb_core::AssetId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::RelayerError;
use crate::state::{RelayPhase, RelayRecord};

/// Serialized relayer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Registry event sequence processed up to.
    pub registry_cursor: u64,
    /// Per-asset records.
    pub assets: BTreeMap<AssetId, RelayRecord>,
}

impl PersistedState {
    /// Drop every record that is not `Confirmed`.
    pub fn trusted(mut self) -> Self {
        self.assets
            .retain(|_, record| record.phase == RelayPhase::Confirmed);
        self
    }
}

/// A state file on disk. Saves are serialized.
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateFile {
    /// Bind to `path`. Nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// File location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is an empty state.
    pub fn load(&self) -> Result<PersistedState, RelayerError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedState::default())
            }
            Err(e) => return Err(self.error(e)),
        };
        serde_json::from_str(&raw).map_err(|e| self.error(e))
    }

    /// Replace the snapshot atomically.
    pub fn save(&self, state: &PersistedState) -> Result<(), RelayerError> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| self.error(e))?;
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp).map_err(|e| self.error(e))?;
        file.write_all(&json).map_err(|e| self.error(e))?;
        file.sync_all().map_err(|e| self.error(e))?;
        drop(file);
        std::fs::rename(&tmp, &self.path).map_err(|e| self.error(e))
    }

    fn error(&self, e: impl std::fmt::Display) -> RelayerError {
        RelayerError::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

//! # Deploy Subcommands
//!
//! - `amb deploy`: generate (or reuse) the approver role keys and write a
//!   deployment record naming where the registry, verifier, and mint gate
//!   live.
//! - `amb deployment show`: print a record and report missing components.
//!
//! Local deployments use `local://` locations. The verifier location
//! carries the circuit id, so a bridge started against a record written
//! for a different circuit refuses to run.

use std::path::{Path, PathBuf};

use amb_core::{Component, DeploymentRecord};
use amb_zkp::{MockProofSystem, ProofService};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::keys::RoleKeys;

/// Location of the in-process approval registry.
pub const LOCAL_REGISTRY: &str = "local://approval-registry";

/// Location of the in-process mint gate.
pub const LOCAL_MINT_GATE: &str = "local://mint-gate";

/// Location of the in-process verifier for `circuit_id`.
pub fn local_verifier(circuit_id: &str) -> String {
    format!("local://verifier/{circuit_id}")
}

/// Arguments for `amb deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Network label written into the record.
    #[arg(long, default_value = "local")]
    pub network: String,

    /// Where to write the deployment record.
    #[arg(long, default_value = "deployment.json")]
    pub out: PathBuf,

    /// Directory holding one seed file per approver role.
    #[arg(long, default_value = "keys")]
    pub keys_dir: PathBuf,

    /// Regenerate role keys even if they already exist.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `amb deployment`.
#[derive(Args, Debug)]
pub struct DeploymentArgs {
    #[command(subcommand)]
    pub command: DeploymentCommand,
}

/// Deployment record subcommands.
#[derive(Subcommand, Debug)]
pub enum DeploymentCommand {
    /// Print a deployment record.
    Show {
        /// Record to read.
        #[arg(default_value = "deployment.json")]
        file: PathBuf,

        /// Print the raw JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
}

/// Execute `amb deploy`.
pub fn run_deploy(args: &DeployArgs) -> Result<u8> {
    let keys = RoleKeys::load_or_generate(&args.keys_dir, args.force)?;
    let prover = MockProofSystem::default();
    let record = local_record(&args.network, prover.circuit_id());
    record
        .save(&args.out)
        .with_context(|| format!("writing deployment record to {}", args.out.display()))?;

    println!("Deployment record written to {}", args.out.display());
    println!("  network: {}", record.network);
    for (component, location) in &record.components {
        println!("  {component}: {location}");
    }
    println!("Approver keys in {}", args.keys_dir.display());
    for (role, key) in keys.iter() {
        println!("  {role}: {}", key.address());
    }
    Ok(0)
}

/// Execute `amb deployment`.
pub fn run_deployment(args: &DeploymentArgs) -> Result<u8> {
    match &args.command {
        DeploymentCommand::Show { file, json } => show(file, *json),
    }
}

fn show(file: &Path, json: bool) -> Result<u8> {
    let record = DeploymentRecord::load(file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("network:    {}", record.network);
        println!("created_at: {}", record.created_at);
        for component in Component::ALL {
            match record.get(component) {
                Some(location) => println!("  {component}: {location}"),
                None => println!("  {component}: <missing>"),
            }
        }
    }
    let missing = record.missing();
    if missing.is_empty() {
        Ok(0)
    } else {
        tracing::warn!(?missing, "deployment record is incomplete");
        Ok(1)
    }
}

/// A record placing every component in-process.
pub fn local_record(network: &str, circuit_id: &str) -> DeploymentRecord {
    DeploymentRecord::new(network)
        .with(Component::ApprovalRegistry, LOCAL_REGISTRY)
        .with(Component::Verifier, local_verifier(circuit_id))
        .with(Component::MintGate, LOCAL_MINT_GATE)
}

/// Check that `record` describes an in-process deployment whose verifier
/// matches `circuit_id`.
pub fn check_local(record: &DeploymentRecord, circuit_id: &str) -> Result<()> {
    let registry = record.require(Component::ApprovalRegistry)?;
    let gate = record.require(Component::MintGate)?;
    let verifier = record.require(Component::Verifier)?;
    for (component, location) in [
        (Component::ApprovalRegistry, registry),
        (Component::MintGate, gate),
        (Component::Verifier, verifier),
    ] {
        if !location.starts_with("local://") {
            bail!("{component} at {location} is not a local deployment");
        }
    }
    let expected = local_verifier(circuit_id);
    if verifier != expected {
        bail!("deployed verifier {verifier} does not match prover circuit ({expected})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_writes_complete_record() {
        let dir = tempfile::tempdir().unwrap();
        let args = DeployArgs {
            network: "local".to_string(),
            out: dir.path().join("deployment.json"),
            keys_dir: dir.path().join("keys"),
            force: false,
        };
        assert_eq!(run_deploy(&args).unwrap(), 0);

        let record = DeploymentRecord::load(&args.out).unwrap();
        assert!(record.missing().is_empty());
        let circuit = MockProofSystem::default().circuit_id().to_string();
        check_local(&record, &circuit).unwrap();
        assert!(RoleKeys::load(&args.keys_dir).is_ok());
    }

    #[test]
    fn show_flags_missing_components() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.json");
        DeploymentRecord::new("local")
            .with(Component::ApprovalRegistry, LOCAL_REGISTRY)
            .save(&path)
            .unwrap();
        assert_eq!(show(&path, false).unwrap(), 1);

        local_record("local", "mock:abc").save(&path).unwrap();
        assert_eq!(show(&path, true).unwrap(), 0);
    }

    #[test]
    fn verifier_mismatch_rejected() {
        let record = local_record("local", "mock:other");
        let err = check_local(&record, "mock:abc").unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn remote_locations_rejected() {
        let record = local_record("testnet", "mock:abc")
            .with(Component::MintGate, "https://rpc.example/mint-gate");
        assert!(check_local(&record, "mock:abc").is_err());
    }

    #[test]
    fn missing_component_rejected() {
        let record = DeploymentRecord::new("local");
        let err = check_local(&record, "mock:abc").unwrap_err();
        assert!(err.to_string().contains("approvalRegistry"));
    }
}

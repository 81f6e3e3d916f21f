//! # Status Subcommand
//!
//! Reads a relayer state file and prints the tracked assets. Works against
//! a stopped relayer; a running one exposes the same data at
//! `GET /v1/relays`.

use std::path::PathBuf;

use amb_core::AssetId;
use amb_relayer::{PersistedState, RelayPhase, RelayRecord, StateFile};
use anyhow::{bail, Result};
use clap::Args;

/// Arguments for `amb status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Relayer state file.
    #[arg(long, default_value = "relayer-state.json")]
    pub state: PathBuf,

    /// Show only this asset, with its full phase history.
    #[arg(long)]
    pub asset: Option<u64>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Execute `amb status`.
///
/// Exits 1 when any tracked asset is `FAILED`, or when `--asset` names an
/// asset the file does not track.
pub fn run_status(args: &StatusArgs) -> Result<u8> {
    if !args.state.exists() {
        bail!("state file {} does not exist", args.state.display());
    }
    let state = StateFile::new(&args.state).load()?;

    if let Some(asset) = args.asset {
        let Some(record) = state.assets.get(&AssetId(asset)) else {
            eprintln!("asset {asset} is not tracked in {}", args.state.display());
            return Ok(1);
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(record)?);
        } else {
            print_record(record);
        }
        return Ok(u8::from(matches!(record.phase, RelayPhase::Failed { .. })));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_table(&state);
    }
    let failed = state
        .assets
        .values()
        .any(|r| matches!(r.phase, RelayPhase::Failed { .. }));
    Ok(u8::from(failed))
}

fn print_table(state: &PersistedState) {
    println!("registry cursor: {}", state.registry_cursor);
    if state.assets.is_empty() {
        println!("no tracked assets");
        return;
    }
    println!(
        "{:<12} {:<32} {:>7} {:>7}  LAST ERROR",
        "ASSET", "PHASE", "PROOFS", "SUBMITS"
    );
    for record in state.assets.values() {
        println!(
            "{:<12} {:<32} {:>7} {:>7}  {}",
            record.asset_id.0,
            record.phase.to_string(),
            record.proving_attempts,
            record.submission_attempts,
            record.last_error.as_deref().unwrap_or("-"),
        );
    }
}

fn print_record(record: &RelayRecord) {
    println!("asset:       {}", record.asset_id.0);
    println!("phase:       {}", record.phase);
    println!("proofs:      {}", record.proving_attempts);
    println!("submissions: {}", record.submission_attempts);
    if let Some(fingerprint) = &record.proof_fingerprint {
        println!("proof:       {fingerprint}");
    }
    if let Some(block) = record.mint_block {
        println!("mint block:  {block}");
    }
    if let Some(error) = &record.last_error {
        println!("last error:  {error}");
    }
    println!("history:");
    for transition in &record.history {
        println!("  {}  {} -> {}", transition.at, transition.from, transition.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amb_relayer::FailureReason;

    fn write_state(dir: &std::path::Path, phase: RelayPhase) -> PathBuf {
        let path = dir.join("relayer-state.json");
        let mut record = RelayRecord::new(AssetId(42));
        record.phase = phase;
        let mut state = PersistedState {
            registry_cursor: 9,
            ..PersistedState::default()
        };
        state.assets.insert(AssetId(42), record);
        StateFile::new(&path).save(&state).unwrap();
        path
    }

    #[test]
    fn confirmed_state_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_state(dir.path(), RelayPhase::Confirmed);
        let args = StatusArgs {
            state: path,
            asset: None,
            json: false,
        };
        assert_eq!(run_status(&args).unwrap(), 0);
    }

    #[test]
    fn failed_asset_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_state(
            dir.path(),
            RelayPhase::Failed {
                reason: FailureReason::MintNotObserved,
            },
        );
        let args = StatusArgs {
            state: path,
            asset: Some(42),
            json: true,
        };
        assert_eq!(run_status(&args).unwrap(), 1);
    }

    #[test]
    fn untracked_asset_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_state(dir.path(), RelayPhase::Confirmed);
        let args = StatusArgs {
            state: path,
            asset: Some(7),
            json: false,
        };
        assert_eq!(run_status(&args).unwrap(), 1);
    }

    #[test]
    fn missing_state_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = StatusArgs {
            state: dir.path().join("absent.json"),
            asset: None,
            json: false,
        };
        assert!(run_status(&args).is_err());
    }
}

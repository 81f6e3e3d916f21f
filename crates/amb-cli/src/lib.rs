//! # amb-cli: Operator CLI for the Approval-Mint Bridge
//!
//! Provides the `amb` command-line interface.
//!
//! ## Subcommands
//!
//! - `amb deploy`: Generate approver role keys and write a deployment record.
//! - `amb deployment show`: Print a deployment record and flag missing components.
//! - `amb run`: Run both ledgers, the relayer, and the HTTP API in one process.
//! - `amb status`: Inspect a relayer state file.
//!
//! ```bash
//! amb deploy --network local --out deployment.json --keys-dir keys
//! amb -v run --deployment deployment.json --keys-dir keys \
//!     --recipient 0x5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e --demo 42
//! amb status --state relayer-state.json --asset 42
//! ```

pub mod deploy;
pub mod keys;
pub mod run;
pub mod status;

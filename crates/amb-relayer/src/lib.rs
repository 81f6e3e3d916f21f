//! # amb-relayer: Relayer Saga
//!
//! The off-ledger process that connects the two ledgers. For every asset
//! the registry reports fully approved, the relayer walks a per-asset
//! state machine:
//!
//! ```text
//! Idle → Notified → Proving → Submitting → Confirming → Confirmed
//!                      │           │            │
//!                      └───────────┴────────────┴──→ Failed(reason)
//! ```
//!
//! ## Consistency Model
//!
//! There is no cross-ledger transaction. The relayer is a saga
//! coordinator whose every step is safe to repeat:
//!
//! - Notifications are at-least-once; a duplicate for an asset already
//!   past `Idle` is a no-op.
//! - The mint gate is checked before proving and again before
//!   submitting. `AlreadyMinted` on submission counts as success.
//! - Local state is advisory. On restart the relayer trusts only its
//!   `Confirmed` entries and re-derives everything else by scanning the
//!   registry for aggregated assets the gate has not minted.
//!
//! ## Modules
//!
//! - [`config`]: YAML/JSON configuration with `AMB_*` overrides.
//! - [`state`]: the per-asset phase machine.
//! - [`persist`]: atomic JSON persistence of relayer state.
//! - [`ports`]: the ledger-facing traits and their in-process adapters.
//! - [`service`]: the saga driver and subscription loop.
//! - [`health`], [`retry`], [`shutdown`]: operational support.

pub mod config;
pub mod error;
pub mod health;
pub mod persist;
pub mod ports;
pub mod retry;
pub mod service;
pub mod shutdown;
pub mod state;

pub use config::{ConfigError, RelayerConfig};
pub use error::{ErrorClass, RelayerError};
pub use health::{HealthReport, HealthTracker, Link, LinkHealth};
pub use persist::{PersistedState, StateFile};
pub use ports::{ApprovalFeed, FeedBatch, LocalMintTarget, LocalRegistryFeed, MintTarget};
pub use retry::RetryPolicy;
pub use service::{RelayerService, RelayerStats, RelayerView};
pub use shutdown::{ShutdownController, ShutdownSignal};
pub use state::{FailureReason, PhaseTransition, RelayPhase, RelayRecord, TransitionError};

//! # amb-ledger: Ledger Substrate
//!
//! Both sides of the bridge run on a ledger that serializes writes per key
//! and publishes notifications. This crate models that substrate in-process
//! so the registry and mint gate can be written against the guarantees a
//! real ledger gives them, and no more:
//!
//! - [`LedgerStore`]: key-value state with per-key atomic
//!   read-modify-write. A failed transaction leaves no trace.
//! - [`EventLog`]: durable, replayable notifications with monotonically
//!   increasing sequence numbers. Consumers resume from a cursor and must
//!   tolerate redelivery.
//! - [`BlockClock`] and [`TxReceipt`]: block height of inclusion.
//! - [`SignedCall`]: an Ed25519-signed call envelope. Verification yields
//!   the caller [`Address`](amb_core::Address), which is what role checks
//!   run against.

pub mod block;
pub mod error;
pub mod events;
pub mod keys;
pub mod signed;
pub mod store;

pub use block::{BlockClock, TxReceipt};
pub use error::LedgerError;
pub use events::{EventLog, LedgerEvent};
pub use keys::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use signed::SignedCall;
pub use store::LedgerStore;

//! # amb-mint: Mint Gate
//!
//! The public-ledger component. `mint_with_proof` is one atomic
//! transaction per asset id:
//!
//! 1. `AlreadyMinted` if the asset is minted.
//! 2. `PublicInputMismatch` unless `public_inputs[0] == asset_id`.
//! 3. `InvalidProof` unless the embedded verifier accepts the proof.
//! 4. Record the owner, mark minted, emit `Minted`.
//!
//! Steps 1 through 4 run while the asset's key is held, so concurrent
//! submissions for the same asset serialize and at most one succeeds.
//! `minted == true` implies a proof verifying against `[asset_id]` was
//! accepted.

pub mod error;
pub mod gate;

pub use error::MintError;
pub use gate::{MintEvent, MintGate, MintReceipt, MintRecord};

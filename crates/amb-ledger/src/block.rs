//! # Block Heights and Receipts
//!
//! Each ledger orders accepted transactions into blocks. The in-process
//! ledgers include one transaction per block, so the height is a simple
//! atomic counter.

use std::sync::atomic::{AtomicU64, Ordering};

use amb_core::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monotonic block height counter for one ledger.
#[derive(Debug, Default)]
pub struct BlockClock {
    height: AtomicU64,
}

impl BlockClock {
    /// A clock at height zero (genesis).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current height.
    pub fn height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }

    /// Seal a new block and return its height.
    pub fn next_block(&self) -> u64 {
        self.height.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Seal a block for a transaction and return its receipt.
    pub fn include(&self) -> TxReceipt {
        TxReceipt {
            tx_id: Uuid::new_v4(),
            block_height: self.next_block(),
            included_at: Timestamp::now(),
        }
    }
}

/// Proof of inclusion for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction identifier.
    pub tx_id: Uuid,
    /// Block in which the transaction was included.
    pub block_height: u64,
    /// Inclusion time.
    pub included_at: Timestamp,
}

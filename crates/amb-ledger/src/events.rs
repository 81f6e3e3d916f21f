//! # Event Log
//!
//! Ledger notifications. Every emitted event gets the next sequence number
//! (starting at 1) and the block height it was emitted in. The log is
//! append-only and replayable: a subscriber holds a cursor (the last
//! sequence number it processed, 0 for "from genesis") and asks for
//! everything after it.
//!
//! Delivery is at-least-once. A subscriber that persists its cursor only
//! after handling an event will see that event again if it crashes in
//! between, and consumers must be written for that.

use std::sync::Arc;

use amb_core::Timestamp;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// One emitted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent<E> {
    /// Position in the log, starting at 1.
    pub seq: u64,
    /// Block in which the emitting transaction was included.
    pub block_height: u64,
    /// Emission time.
    pub emitted_at: Timestamp,
    /// Component-specific event body.
    pub payload: E,
}

/// Append-only, replayable notification log for one component.
#[derive(Debug)]
pub struct EventLog<E> {
    entries: Arc<RwLock<Vec<LedgerEvent<E>>>>,
    head: Arc<watch::Sender<u64>>,
}

impl<E> Clone for EventLog<E> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            head: Arc::clone(&self.head),
        }
    }
}

impl<E: Clone> Default for EventLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> EventLog<E> {
    /// An empty log.
    pub fn new() -> Self {
        let (head, _) = watch::channel(0);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            head: Arc::new(head),
        }
    }

    /// Append an event and wake subscribers. Returns its sequence number.
    pub fn emit(&self, block_height: u64, payload: E) -> u64 {
        let seq = {
            let mut entries = self.entries.write();
            let seq = entries.len() as u64 + 1;
            entries.push(LedgerEvent {
                seq,
                block_height,
                emitted_at: Timestamp::now(),
                payload,
            });
            seq
        };
        self.head.send_replace(seq);
        tracing::trace!(seq, block_height, "event emitted");
        seq
    }

    /// Up to `limit` events with `seq > cursor`, in order.
    pub fn events_since(&self, cursor: u64, limit: usize) -> Vec<LedgerEvent<E>> {
        let entries = self.entries.read();
        let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(entries.len());
        entries[start..].iter().take(limit).cloned().collect()
    }

    /// Sequence number of the newest event, 0 if empty.
    pub fn head(&self) -> u64 {
        *self.head.borrow()
    }

    /// Wait until an event with `seq > cursor` exists.
    ///
    /// Returns immediately if one already does.
    pub async fn wait_beyond(&self, cursor: u64) {
        let mut rx = self.head.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|head| *head > cursor).await;
    }
}

//! # Ledger Key-Value State
//!
//! [`LedgerStore`] is the storage a component contract owns on its ledger.
//! It is never exposed raw; components wrap it and offer only their typed
//! operations, so every write passes through the component's guards.
//!
//! ## Atomicity
//!
//! [`LedgerStore::transact`] runs a closure against a working copy of one
//! record while holding that key's shard lock. The copy is committed only
//! when the closure returns `Ok`. Concurrent transactions on the same key
//! are serialized; a failed transaction leaves the stored record (or its
//! absence) exactly as it was.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Per-key linearizable key-value store.
///
/// Absent keys read as `V::default()`; records are created lazily by the
/// first successful transaction on a key.
#[derive(Debug)]
pub struct LedgerStore<K, V>
where
    K: Eq + Hash,
{
    records: Arc<DashMap<K, V>>,
}

impl<K: Eq + Hash, V> Clone for LedgerStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<K, V> Default for LedgerStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }
}

impl<K, V> LedgerStore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + Default,
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a record. Absent keys yield `V::default()`.
    pub fn read(&self, key: &K) -> V {
        self.records
            .get(key)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Whether a record has ever been written for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    /// Atomically read-validate-update one record.
    pub fn transact<R, E>(&self, key: K, f: impl FnOnce(&mut V) -> Result<R, E>) -> Result<R, E> {
        match self.records.entry(key) {
            Entry::Occupied(mut occupied) => {
                let mut working = occupied.get().clone();
                let out = f(&mut working)?;
                occupied.insert(working);
                Ok(out)
            }
            Entry::Vacant(vacant) => {
                let mut working = V::default();
                let out = f(&mut working)?;
                vacant.insert(working);
                Ok(out)
            }
        }
    }

    /// Snapshot of all records matching `predicate`.
    pub fn select(&self, predicate: impl Fn(&K, &V) -> bool) -> Vec<(K, V)> {
        self.records
            .iter()
            .filter(|r| predicate(r.key(), r.value()))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Count of records matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&V) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(r.value())).count()
    }

    /// Number of keys with a stored record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record has been written yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

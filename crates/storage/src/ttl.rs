//! Expiry index for the local substrate's cache tier
//!
//! Maps expiry horizon (epoch millis) → set of keys expiring then, using a
//! BTreeMap so a range query finds everything expired before a given
//! instant in O(expired count) instead of O(cache size).

use std::collections::{BTreeMap, HashSet};

/// Expiry index: expiry horizon → keys
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    index: BTreeMap<u64, HashSet<String>>,
}

impl ExpiryIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            index: BTreeMap::new(),
        }
    }

    /// Register a key expiring at the given horizon
    pub fn insert(&mut self, expires_at: u64, key: String) {
        self.index.entry(expires_at).or_default().insert(key);
    }

    /// Unregister a key (deleted or overwritten before expiry)
    ///
    /// If the horizon's set becomes empty the entry is dropped entirely.
    pub fn remove(&mut self, expires_at: u64, key: &str) {
        if let Some(keys) = self.index.get_mut(&expires_at) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&expires_at);
            }
        }
    }

    /// All keys expired at or before `now`
    pub fn find_expired(&self, now: u64) -> Vec<String> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Drop every entry at or before `now`, returning how many keys were
    /// removed
    pub fn remove_expired(&mut self, now: u64) -> usize {
        let horizons: Vec<u64> = self.index.range(..=now).map(|(ts, _)| *ts).collect();

        let mut count = 0;
        for horizon in horizons {
            if let Some(keys) = self.index.remove(&horizon) {
                count += keys.len();
            }
        }
        count
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.index.clear();
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total number of keys tracked
    pub fn len(&self) -> usize {
        self.index.values().map(|keys| keys.len()).sum()
    }
}

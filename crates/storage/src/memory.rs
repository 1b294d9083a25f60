//! Concurrent in-memory tier
//!
//! Thin wrapper over DashMap with the operations the overflow coordinator
//! needs: point reads and writes, bulk insert, and the drain used when the
//! tier is flushed to disk.
//!
//! # Design
//!
//! - DashMap: sharded by the configured concurrency hint, lock-free reads
//! - FxHasher: O(1) lookups, fast non-crypto hash
//! - No ordering guarantee across keys

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHasher};
use spillkv_core::{OverflowConfig, SpillKey, SpillValue};
use std::hash::BuildHasherDefault;

/// Point-in-time copy of the tier's entries
pub type Snapshot<K, V> = FxHashMap<K, V>;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Thread-safe key-unique container holding the hot working set
#[derive(Debug)]
pub struct MemoryTier<K: SpillKey, V: SpillValue> {
    entries: DashMap<K, V, FxBuildHasher>,
}

impl<K: SpillKey, V: SpillValue> MemoryTier<K, V> {
    /// Create an empty tier
    ///
    /// # Panics
    ///
    /// Panics if `shard_amount` is not a power of two greater than one.
    /// [`OverflowConfig::shard_amount`] always satisfies this.
    pub fn new(capacity: usize, shard_amount: usize) -> Self {
        MemoryTier {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                FxBuildHasher::default(),
                shard_amount,
            ),
        }
    }

    /// Create a tier sized from store configuration
    pub fn from_config(config: &OverflowConfig) -> Self {
        Self::new(config.effective_capacity(), config.shard_amount())
    }

    /// Get a clone of the value stored under `key`
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Whether `key` is present
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert, returning the previous value for `key`
    #[inline]
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Insert every entry, later entries winning on duplicate keys
    pub fn insert_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.entries.insert(key, value);
        }
    }

    /// Remove `key`, returning its value
    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tier is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move every entry out of the tier
    ///
    /// Each key is taken with its own removal, so a concurrent `remove` of
    /// the same key either gets the value or misses; never both. Entries
    /// inserted while the drain runs may or may not be taken.
    pub fn drain(&self) -> Snapshot<K, V> {
        let keys: Vec<K> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        let mut drained = FxHashMap::with_capacity_and_hasher(keys.len(), Default::default());
        for key in keys {
            if let Some((key, value)) = self.entries.remove(&key) {
                drained.insert(key, value);
            }
        }
        drained
    }

    /// Insert only the entries whose key is not already present
    ///
    /// Returns the number inserted.
    pub fn insert_missing<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut inserted = 0;
        for (key, value) in entries {
            if let Entry::Vacant(slot) = self.entries.entry(key) {
                slot.insert(value);
                inserted += 1;
            }
        }
        inserted
    }
}

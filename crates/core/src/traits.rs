//! Key/value bounds and the unified map contract
//!
//! `OverflowStore` is the single key-value interface callers program
//! against. Whether an operation resolves in memory or via disk is an
//! implementation detail of the store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Bound for keys that can live in memory and in a snapshot file
pub trait SpillKey: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> SpillKey for T where T: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{}

/// Bound for values that can live in memory and in a snapshot file
pub trait SpillValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> SpillValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Unified key-value contract
///
/// Mirrors a concurrent map: every method takes `&self` and may be called
/// from many threads at once.
pub trait OverflowStore<K: SpillKey, V: SpillValue>: Send + Sync {
    /// Look up `key`, returning a clone of its value if present
    fn get(&self, key: &K) -> Option<V>;

    /// Insert `value` under `key`, returning the previous value held in memory
    fn put(&self, key: K, value: V) -> Option<V>;

    /// Insert every entry of `batch`
    fn put_all(&self, batch: HashMap<K, V>);

    /// Remove `key`, returning the value if it was removed from memory
    fn remove(&self, key: &K) -> Option<V>;
}

//! Overflow coordinator
//!
//! `OverflowMap` behaves as an ordinary concurrent map until memory use
//! reaches the configured threshold. From then on:
//!
//! - put/put_all: on breach, the memory tier is flushed to the full-store
//!   file (replacing its previous content) before the new entry lands
//! - get: a memory miss parks the memory tier in the temp file, scans the
//!   full-store file, and reloads the parked entries
//! - remove: a memory miss parks the memory tier, rewrites the full-store
//!   file without the key, and reloads the parked entries
//!
//! # Locking
//!
//! The disk store sits behind one mutex. Mutating calls hold it across the
//! breach check, the flush, and the insert, so no two writers can both
//! flush on the same breach. Memory hits on get and remove never take it.
//! Flushes drain the memory tier key by key before writing, so a lock-free
//! remove either takes a key or misses it and queues on the lock. Fallbacks
//! re-check memory once they hold the lock, since the key may have been
//! parked by another thread's fallback.
//!
//! If parked entries cannot be reloaded, the temp file is retained and no
//! further fallback parks anything until its entries are back in memory.
//!
//! # Errors
//!
//! `get`, `put`, `put_all`, and `remove` log disk failures and degrade to an
//! empty result. The `try_*` variants run the same sequences and return the
//! failure instead.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use spillkv_core::{OverflowConfig, OverflowStore, Result, SnapshotPaths, SpillKey, SpillValue};
use spillkv_durability::{DiskStore, SnapshotError};
use spillkv_storage::{HeapMonitor, MemoryProbe, MemoryTier, SystemMemoryProbe};
use tracing::{debug, error, info, warn};

use crate::stats::{Counters, OverflowStats};

/// Memory-bounded map that spills to disk under memory pressure
pub struct OverflowMap<K: SpillKey, V: SpillValue> {
    config: OverflowConfig,
    memory: MemoryTier<K, V>,
    monitor: HeapMonitor,
    disk: Mutex<DiskStore<K, V>>,
    /// One-way: set on the first observed breach, never cleared
    spilled: AtomicBool,
    /// Temp file holds parked entries that failed to reload
    parked_retained: AtomicBool,
    counters: Counters,
}

impl<K: SpillKey, V: SpillValue> OverflowMap<K, V> {
    /// Open a map that samples system memory
    pub fn new(config: OverflowConfig) -> Result<Self> {
        Self::with_probe(config, Arc::new(SystemMemoryProbe))
    }

    /// Open a map that samples memory through `probe`
    pub fn with_probe(config: OverflowConfig, probe: Arc<dyn MemoryProbe>) -> Result<Self> {
        config.validate()?;

        let monitor = HeapMonitor::new(probe, config.spill_threshold_mb);
        info!(
            target: "spillkv::overflow",
            full = %config.paths.full.display(),
            temp = %config.paths.temp.display(),
            threshold_mb = monitor.threshold_mb(),
            "Overflow map opened"
        );

        Ok(OverflowMap {
            memory: MemoryTier::from_config(&config),
            monitor,
            disk: Mutex::new(DiskStore::new(config.paths.clone())),
            spilled: AtomicBool::new(false),
            parked_retained: AtomicBool::new(false),
            counters: Counters::default(),
            config,
        })
    }

    /// Open a map that samples system memory, seeded with `entries`
    ///
    /// The entries go in as one batch after a single breach check, like
    /// [`try_put_all`](Self::try_put_all).
    pub fn from_entries<I>(config: OverflowConfig, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let map = Self::new(config)?;
        map.try_put_all(entries)?;
        Ok(map)
    }

    // ========================================================================
    // Map contract
    // ========================================================================

    /// Look up `key`, falling back to the full-store file on a memory miss
    pub fn get(&self, key: &K) -> Option<V> {
        self.absorb("get", self.try_get(key))
    }

    /// Insert `value` under `key`
    ///
    /// Returns the previous value held in memory. After a flush this is
    /// always `None`, since memory was emptied before the insert.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let disk = self.disk.lock();
        if let Err(e) = self
            .recover_parked(&disk)
            .and_then(|()| self.spill_if_breached(&disk))
        {
            self.log_absorbed("put", &e);
        }
        self.memory.insert(key, value)
    }

    /// Insert every entry of `batch` after one breach check
    pub fn put_all<I>(&self, batch: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let disk = self.disk.lock();
        if let Err(e) = self
            .recover_parked(&disk)
            .and_then(|()| self.spill_if_breached(&disk))
        {
            self.log_absorbed("put_all", &e);
        }
        self.memory.insert_all(batch);
    }

    /// Remove `key`
    ///
    /// Returns the value only when it was removed from memory. Removal from
    /// the full-store file always reports `None`.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.absorb("remove", self.try_remove(key))
    }

    // ========================================================================
    // Fallible variants
    // ========================================================================

    /// Like [`get`](Self::get), surfacing disk failures
    pub fn try_get(&self, key: &K) -> Result<Option<V>> {
        if let Some(value) = self.memory.get(key) {
            return Ok(Some(value));
        }
        if !self.is_spilled() {
            return Ok(None);
        }

        let disk = self.disk.lock();
        self.recover_parked(&disk)?;
        if let Some(value) = self.memory.get(key) {
            return Ok(Some(value));
        }

        let found = self.with_memory_parked(&disk, |disk| disk.find_key(disk.full_path(), key))?;
        self.counters.record_lookup(found.is_some());
        debug!(target: "spillkv::overflow", hit = found.is_some(), "Lookup resolved via disk");
        Ok(found)
    }

    /// Like [`put`](Self::put), but a failed flush aborts before the insert
    pub fn try_put(&self, key: K, value: V) -> Result<Option<V>> {
        let disk = self.disk.lock();
        self.recover_parked(&disk)?;
        self.spill_if_breached(&disk)?;
        Ok(self.memory.insert(key, value))
    }

    /// Like [`put_all`](Self::put_all), but a failed flush aborts before the insert
    pub fn try_put_all<I>(&self, batch: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let disk = self.disk.lock();
        self.recover_parked(&disk)?;
        self.spill_if_breached(&disk)?;
        self.memory.insert_all(batch);
        Ok(())
    }

    /// Like [`remove`](Self::remove), surfacing disk failures
    pub fn try_remove(&self, key: &K) -> Result<Option<V>> {
        if let Some(value) = self.memory.remove(key) {
            return Ok(Some(value));
        }
        if !self.is_spilled() {
            return Ok(None);
        }

        let disk = self.disk.lock();
        self.recover_parked(&disk)?;
        if let Some(value) = self.memory.remove(key) {
            return Ok(Some(value));
        }

        let removed =
            self.with_memory_parked(&disk, |disk| disk.remove_key(disk.full_path(), key))?;
        if removed {
            self.counters.record_removal();
        }
        debug!(target: "spillkv::overflow", removed, "Removal resolved via disk");
        Ok(None)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Whether a breach has ever been observed
    pub fn is_spilled(&self) -> bool {
        self.spilled.load(Ordering::Acquire)
    }

    /// Number of entries currently in memory
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Whether memory currently holds no entries
    pub fn is_memory_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Whether `key` is in memory, without consulting disk
    pub fn contains_in_memory(&self, key: &K) -> bool {
        self.memory.contains_key(key)
    }

    /// Counter snapshot
    pub fn stats(&self) -> OverflowStats {
        self.counters.snapshot()
    }

    /// Configuration this map was opened with
    pub fn config(&self) -> &OverflowConfig {
        &self.config
    }

    /// Snapshot file locations
    pub fn paths(&self) -> &SnapshotPaths {
        &self.config.paths
    }

    /// Effective spill threshold in megabytes
    pub fn threshold_mb(&self) -> u64 {
        self.monitor.threshold_mb()
    }

    // ========================================================================
    // Disk sequences (caller holds the disk lock)
    // ========================================================================

    fn spill_if_breached(&self, disk: &DiskStore<K, V>) -> Result<()> {
        if !self.monitor.breached() {
            return Ok(());
        }
        if !self.spilled.swap(true, Ordering::AcqRel) {
            info!(
                target: "spillkv::overflow",
                threshold_mb = self.monitor.threshold_mb(),
                "Memory threshold breached, spilling to disk"
            );
        }

        let info = disk
            .flush_and_clear(&self.memory, disk.full_path())
            .map_err(|e| self.record_failure(e))?;
        self.counters.record_spill();
        debug!(
            target: "spillkv::overflow",
            entries = info.entries,
            size_bytes = info.size_bytes,
            "Memory tier spilled to full snapshot"
        );
        Ok(())
    }

    /// Bring back entries left in a retained temp file
    ///
    /// Entries already in memory win over their parked copies. While the
    /// file stays unreadable this fails, which keeps callers from parking
    /// over it.
    fn recover_parked(&self, disk: &DiskStore<K, V>) -> Result<()> {
        if !self.parked_retained.load(Ordering::Acquire) {
            return Ok(());
        }
        let parked = disk.read_snapshot(disk.temp_path()).map_err(|e| {
            error!(
                target: "spillkv::overflow",
                temp = %disk.temp_path().display(),
                error = %e,
                "Retained temp snapshot still unreadable"
            );
            self.record_failure(e)
        })?;
        let restored = self.memory.insert_missing(parked);
        self.parked_retained.store(false, Ordering::Release);
        info!(target: "spillkv::overflow", restored, "Recovered parked entries from retained temp snapshot");

        if let Err(e) = disk.discard(disk.temp_path()) {
            warn!(target: "spillkv::overflow", error = %e, "Failed to delete temp snapshot");
        }
        Ok(())
    }

    /// Park memory in the temp file, run `step`, then restore memory
    ///
    /// Memory is restored whether or not `step` succeeds. The temp file is
    /// deleted once its entries are back in memory. If they cannot be read
    /// back, the file is retained for [`recover_parked`](Self::recover_parked).
    fn with_memory_parked<T, F>(&self, disk: &DiskStore<K, V>, step: F) -> Result<T>
    where
        F: FnOnce(&DiskStore<K, V>) -> std::result::Result<T, SnapshotError>,
    {
        disk.flush_and_clear(&self.memory, disk.temp_path())
            .map_err(|e| self.record_failure(e))?;

        let outcome = step(disk).map_err(|e| self.record_failure(e));

        let parked = disk.read_snapshot(disk.temp_path()).map_err(|e| {
            error!(
                target: "spillkv::overflow",
                temp = %disk.temp_path().display(),
                error = %e,
                "Failed to reload parked entries, temp snapshot retained"
            );
            self.parked_retained.store(true, Ordering::Release);
            self.record_failure(e)
        })?;
        self.memory.insert_all(parked);

        if let Err(e) = disk.discard(disk.temp_path()) {
            warn!(target: "spillkv::overflow", error = %e, "Failed to delete temp snapshot");
        }

        outcome
    }

    fn record_failure(&self, e: SnapshotError) -> spillkv_core::Error {
        self.counters.record_failure();
        e.into()
    }

    fn absorb<T: Default>(&self, op: &'static str, result: Result<T>) -> T {
        result.unwrap_or_else(|e| {
            self.log_absorbed(op, &e);
            T::default()
        })
    }

    fn log_absorbed(&self, op: &'static str, e: &spillkv_core::Error) {
        warn!(target: "spillkv::overflow", op, error = %e, "Disk sequence failed");
    }
}

impl<K: SpillKey, V: SpillValue> OverflowStore<K, V> for OverflowMap<K, V> {
    fn get(&self, key: &K) -> Option<V> {
        OverflowMap::get(self, key)
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        OverflowMap::put(self, key, value)
    }

    fn put_all(&self, batch: HashMap<K, V>) {
        OverflowMap::put_all(self, batch)
    }

    fn remove(&self, key: &K) -> Option<V> {
        OverflowMap::remove(self, key)
    }
}

impl<K: SpillKey, V: SpillValue> fmt::Debug for OverflowMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverflowMap")
            .field("paths", &self.config.paths)
            .field("monitor", &self.monitor)
            .field("memory_len", &self.memory.len())
            .field("spilled", &self.is_spilled())
            .finish_non_exhaustive()
    }
}

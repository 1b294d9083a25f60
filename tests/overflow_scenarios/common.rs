//! Shared helpers for scenario tests

use spillkv::{FixedMemoryProbe, OverflowConfig, OverflowMap, Snapshot, SpillKey, SpillValue};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Probe with plenty of free memory: 8 GiB total, 6 GiB available
pub fn probe() -> Arc<FixedMemoryProbe> {
    Arc::new(FixedMemoryProbe::new_mb(8192, 6144))
}

/// Map that breaches on every mutating call
pub fn always_spilling<K: SpillKey, V: SpillValue>(dir: &TempDir) -> OverflowMap<K, V> {
    let config = OverflowConfig::in_dir(dir.path()).with_spill_threshold_mb(0);
    OverflowMap::with_probe(config, probe()).unwrap()
}

/// Map with the default threshold, which never breaches here
pub fn never_spilling<K: SpillKey, V: SpillValue>(dir: &TempDir) -> OverflowMap<K, V> {
    OverflowMap::with_probe(OverflowConfig::in_dir(dir.path()), probe()).unwrap()
}

/// Read the snapshot at `path` as written by a map of the same types
pub fn read_snapshot<K: SpillKey, V: SpillValue>(path: &Path) -> Snapshot<K, V> {
    let disk: spillkv::DiskStore<K, V> =
        spillkv::DiskStore::new(spillkv::SnapshotPaths::new(path, path.with_extension("unused")));
    disk.read_snapshot(path).unwrap()
}

/// Number of files in `dir`
pub fn file_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

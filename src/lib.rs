//! spillkv - memory-bounded key-value map that spills to disk
//!
//! `OverflowMap` behaves as an ordinary concurrent map until memory use
//! reaches a configured threshold. It then writes its whole in-memory
//! content to a snapshot file and keeps serving: reads that miss in memory
//! fall back to a linear scan of that file.
//!
//! # Quick Start
//!
//! ```no_run
//! use spillkv::{OverflowConfig, OverflowMap};
//!
//! let config = OverflowConfig::in_dir("/tmp/spillkv").with_spill_threshold_mb(4096);
//! let map: OverflowMap<String, Vec<u8>> = OverflowMap::new(config)?;
//!
//! map.put("user:123".to_string(), b"Alice".to_vec());
//! assert_eq!(map.get(&"user:123".to_string()), Some(b"Alice".to_vec()));
//! # Ok::<(), spillkv::Error>(())
//! ```
//!
//! # Architecture
//!
//! - [`MemoryTier`]: DashMap holding the hot working set
//! - [`HeapMonitor`]: decides when memory use has reached the threshold
//! - [`DiskStore`]: whole-snapshot reads and writes of the full and temp files
//! - [`OverflowMap`]: the only component that decides between memory and disk
//!
//! This is not an LRU cache (a spill moves everything), not an indexed disk
//! format, and not a durable transactional store.

pub use spillkv_core::{
    ConfigError, Error, OverflowConfig, OverflowStore, Result, SnapshotPaths, SpillKey,
    SpillValue,
};
pub use spillkv_durability::{DiskStore, SnapshotError, SnapshotInfo};
pub use spillkv_engine::{OverflowMap, OverflowStats};
pub use spillkv_storage::{
    FixedMemoryProbe, HeapMonitor, MemoryProbe, MemorySample, MemoryTier, Snapshot,
    SystemMemoryProbe,
};

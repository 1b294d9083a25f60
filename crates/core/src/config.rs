//! Store configuration
//!
//! Construction-time settings for an overflow store: how the in-memory tier
//! is sized, when to spill, and which two files the disk tier owns.

use std::path::{Path, PathBuf};

/// Default file name of the full-store snapshot
pub const DEFAULT_FULL_FILE: &str = "spillkv-full.snap";

/// Default file name of the temp-store snapshot
pub const DEFAULT_TEMP_FILE: &str = "spillkv-temp.snap";

/// The two snapshot files owned by one store instance
///
/// Two stores pointing at the same paths overwrite each other's snapshots,
/// so give every instance its own directory with [`SnapshotPaths::in_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    /// File holding the long-lived spilled content
    pub full: PathBuf,
    /// File used transiently during lookup/removal fallbacks
    pub temp: PathBuf,
}

impl SnapshotPaths {
    /// Use explicit full and temp paths
    pub fn new(full: impl Into<PathBuf>, temp: impl Into<PathBuf>) -> Self {
        SnapshotPaths {
            full: full.into(),
            temp: temp.into(),
        }
    }

    /// Place both files under `dir` with their default names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        SnapshotPaths {
            full: dir.join(DEFAULT_FULL_FILE),
            temp: dir.join(DEFAULT_TEMP_FILE),
        }
    }
}

impl Default for SnapshotPaths {
    /// Both files relative to the process working directory
    fn default() -> Self {
        SnapshotPaths::new(DEFAULT_FULL_FILE, DEFAULT_TEMP_FILE)
    }
}

/// Overflow store configuration
#[derive(Debug, Clone)]
pub struct OverflowConfig {
    /// Expected number of entries held in memory
    pub initial_capacity: usize,
    /// Target fill ratio; allocation is `initial_capacity / load_factor`
    pub load_factor: f32,
    /// Expected number of concurrently writing threads (shard count hint)
    pub concurrency_hint: usize,
    /// Memory ceiling in megabytes; `None` means total memory at construction
    pub spill_threshold_mb: Option<u64>,
    /// Snapshot file locations
    pub paths: SnapshotPaths,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        OverflowConfig {
            initial_capacity: 16,
            load_factor: 0.75,
            concurrency_hint: 16,
            spill_threshold_mb: None,
            paths: SnapshotPaths::default(),
        }
    }
}

impl OverflowConfig {
    /// Default configuration with both snapshot files under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        OverflowConfig {
            paths: SnapshotPaths::in_dir(dir),
            ..Default::default()
        }
    }

    /// Set initial capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set load factor
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Set concurrency hint
    pub fn with_concurrency_hint(mut self, hint: usize) -> Self {
        self.concurrency_hint = hint;
        self
    }

    /// Set the spill threshold in megabytes
    ///
    /// `0` breaches on every mutating call.
    pub fn with_spill_threshold_mb(mut self, threshold_mb: u64) -> Self {
        self.spill_threshold_mb = Some(threshold_mb);
        self
    }

    /// Set snapshot paths
    pub fn with_paths(mut self, paths: SnapshotPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Number of slots to allocate up front
    pub fn effective_capacity(&self) -> usize {
        (self.initial_capacity as f64 / f64::from(self.load_factor)).ceil() as usize
    }

    /// Shard count derived from the concurrency hint
    ///
    /// Always a power of two and at least 2.
    pub fn shard_amount(&self) -> usize {
        self.concurrency_hint.max(2).next_power_of_two()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if self.concurrency_hint == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency_hint));
        }
        if self.paths.full == self.paths.temp {
            return Err(ConfigError::PathCollision(self.paths.full.clone()));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Load factor must be finite and positive
    #[error("Invalid load factor: {0}")]
    InvalidLoadFactor(f32),

    /// Concurrency hint must be positive
    #[error("Invalid concurrency hint: {0}")]
    InvalidConcurrency(usize),

    /// Full and temp snapshot paths must differ
    #[error("Full and temp snapshot paths are the same: {}", .0.display())]
    PathCollision(PathBuf),
}

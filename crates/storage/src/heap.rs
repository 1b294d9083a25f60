//! Memory pressure monitoring
//!
//! `HeapMonitor` answers one question per mutating call: has memory use
//! reached the configured ceiling? There is no smoothing or hysteresis, so
//! calls made near the boundary may alternate between breached and not.
//!
//! # Threshold
//!
//! The threshold is a ceiling in megabytes. A breach is observed when free
//! memory falls to `total - threshold` or below, i.e. when memory in use
//! reaches the threshold:
//!
//! - `0` breaches on every call
//! - the default (total memory at construction) breaches only when no
//!   memory at all is free, which effectively disables spilling

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// One reading of system memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySample {
    /// Total memory in bytes
    pub total_bytes: u64,
    /// Memory still available for allocation, in bytes
    pub available_bytes: u64,
}

impl MemorySample {
    /// Bytes currently in use
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Total memory in whole megabytes
    pub fn total_mb(&self) -> u64 {
        self.total_bytes / BYTES_PER_MB
    }

    /// Available memory in whole megabytes
    pub fn available_mb(&self) -> u64 {
        self.available_bytes / BYTES_PER_MB
    }
}

/// Source of memory readings
pub trait MemoryProbe: Send + Sync {
    /// Take a reading, or `None` if memory cannot be measured here
    fn sample(&self) -> Option<MemorySample>;
}

/// Reads system memory from the operating system
///
/// On Linux this parses `MemTotal:` and `MemAvailable:` from
/// `/proc/meminfo`. Other platforms report no sample.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemoryProbe;

impl SystemMemoryProbe {
    /// Parse a `/proc/meminfo` body
    pub fn parse_meminfo(meminfo: &str) -> Option<MemorySample> {
        let parse_kb = |prefix: &str| -> Option<u64> {
            meminfo
                .lines()
                .find(|l| l.starts_with(prefix))
                .and_then(|l| l.split_whitespace().nth(1).and_then(|s| s.parse().ok()))
        };

        let total_kb = parse_kb("MemTotal:")?;
        let available_kb = parse_kb("MemAvailable:")?;
        Some(MemorySample {
            total_bytes: total_kb.saturating_mul(1024),
            available_bytes: available_kb.saturating_mul(1024),
        })
    }
}

impl MemoryProbe for SystemMemoryProbe {
    #[cfg(target_os = "linux")]
    fn sample(&self) -> Option<MemorySample> {
        match std::fs::read_to_string("/proc/meminfo") {
            Ok(meminfo) => Self::parse_meminfo(&meminfo),
            Err(e) => {
                debug!(target: "spillkv::heap", error = %e, "Failed to read /proc/meminfo");
                None
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn sample(&self) -> Option<MemorySample> {
        None
    }
}

/// Probe reporting whatever it was last told
///
/// Readings can be changed through a shared reference, so a test or an
/// embedding application can drive memory pressure directly.
#[derive(Debug)]
pub struct FixedMemoryProbe {
    total_bytes: AtomicU64,
    available_bytes: AtomicU64,
}

impl FixedMemoryProbe {
    /// Create a probe with the given readings in megabytes
    pub fn new_mb(total_mb: u64, available_mb: u64) -> Self {
        FixedMemoryProbe {
            total_bytes: AtomicU64::new(total_mb.saturating_mul(BYTES_PER_MB)),
            available_bytes: AtomicU64::new(available_mb.saturating_mul(BYTES_PER_MB)),
        }
    }

    /// Change the available reading
    pub fn set_available_mb(&self, available_mb: u64) {
        self.available_bytes
            .store(available_mb.saturating_mul(BYTES_PER_MB), Ordering::Relaxed);
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn sample(&self) -> Option<MemorySample> {
        Some(MemorySample {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            available_bytes: self.available_bytes.load(Ordering::Relaxed),
        })
    }
}

/// Decides whether memory use has reached the spill threshold
pub struct HeapMonitor {
    probe: Arc<dyn MemoryProbe>,
    threshold_mb: u64,
}

impl HeapMonitor {
    /// Create a monitor over `probe`
    ///
    /// With `threshold_mb` unset the threshold is the total memory reported
    /// at construction. If the probe reports nothing, the threshold is
    /// unbounded and the monitor never breaches.
    pub fn new(probe: Arc<dyn MemoryProbe>, threshold_mb: Option<u64>) -> Self {
        let threshold_mb = threshold_mb.unwrap_or_else(|| {
            probe
                .sample()
                .map(|sample| sample.total_mb())
                .unwrap_or(u64::MAX)
        });
        debug!(target: "spillkv::heap", threshold_mb, "Heap monitor configured");
        HeapMonitor {
            probe,
            threshold_mb,
        }
    }

    /// Configured threshold in megabytes
    pub fn threshold_mb(&self) -> u64 {
        self.threshold_mb
    }

    /// Sample memory once and compare against the threshold
    pub fn breached(&self) -> bool {
        let Some(sample) = self.probe.sample() else {
            trace!(target: "spillkv::heap", "No memory sample, treating as not breached");
            return false;
        };
        let breached = sample.used_bytes() >= self.threshold_mb.saturating_mul(BYTES_PER_MB);
        trace!(
            target: "spillkv::heap",
            available_mb = sample.available_mb(),
            threshold_mb = self.threshold_mb,
            breached,
            "Sampled memory"
        );
        breached
    }
}

impl fmt::Debug for HeapMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapMonitor")
            .field("threshold_mb", &self.threshold_mb)
            .finish_non_exhaustive()
    }
}

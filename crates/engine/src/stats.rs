//! Operation counters for the overflow map
//!
//! Counters use Relaxed ordering: they are observational only and do not
//! synchronize any other memory operation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the overflow map's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverflowStats {
    /// Completed spills of the memory tier to the full-store file
    pub spills: u64,
    /// Lookups that fell back to scanning the full-store file
    pub disk_lookups: u64,
    /// Disk lookups that found the key
    pub disk_hits: u64,
    /// Removals that deleted a key from the full-store file
    pub disk_removals: u64,
    /// Disk sequences that failed
    pub disk_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    spills: AtomicU64,
    disk_lookups: AtomicU64,
    disk_hits: AtomicU64,
    disk_removals: AtomicU64,
    disk_failures: AtomicU64,
}

impl Counters {
    pub(crate) fn record_spill(&self) {
        self.spills.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup(&self, hit: bool) {
        self.disk_lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.disk_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_removal(&self) {
        self.disk_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.disk_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> OverflowStats {
        OverflowStats {
            spills: self.spills.load(Ordering::Relaxed),
            disk_lookups: self.disk_lookups.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            disk_removals: self.disk_removals.load(Ordering::Relaxed),
            disk_failures: self.disk_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = Counters::default();
        assert_eq!(counters.snapshot(), OverflowStats::default());
    }

    #[test]
    fn test_lookup_counts_hits_separately() {
        let counters = Counters::default();
        counters.record_lookup(true);
        counters.record_lookup(false);
        counters.record_spill();

        let stats = counters.snapshot();
        assert_eq!(stats.disk_lookups, 2);
        assert_eq!(stats.disk_hits, 1);
        assert_eq!(stats.spills, 1);
    }
}

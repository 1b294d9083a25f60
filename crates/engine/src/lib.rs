//! Overflow engine for spillkv
//!
//! This crate ties the memory tier, the heap monitor, and the disk store
//! together behind one map interface:
//! - OverflowMap: spill-on-write, lookup fallback, removal fallback
//! - OverflowStats: operation counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod stats;

pub use coordinator::OverflowMap;
pub use stats::OverflowStats;

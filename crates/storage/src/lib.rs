//! In-memory layer for spillkv
//!
//! This crate implements the hot side of the store:
//! - MemoryTier: DashMap-backed concurrent container for the working set
//! - HeapMonitor: samples available memory and decides whether the
//!   configured threshold is breached
//!
//! # Performance
//!
//! - get(): Lock-free via DashMap
//! - insert(): Only locks target shard
//! - FxHasher: fast non-crypto hash

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod heap;
pub mod memory;

pub use heap::{FixedMemoryProbe, HeapMonitor, MemoryProbe, MemorySample, SystemMemoryProbe};
pub use memory::{MemoryTier, Snapshot};

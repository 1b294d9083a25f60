//! Durability layer for spillkv
//!
//! This crate handles everything that touches disk:
//!
//! - Snapshot frame format (magic, version, bincode-encoded entries)
//! - DiskStore: whole-snapshot write, read, linear key search, and
//!   read-all/mutate/write-all removal
//! - Flush-and-clear: moving the memory tier's entries into a file
//!
//! Disk lookups are linear scans; there is no index and no write-ahead
//! log. The last completed write to a path wins.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod disk_store;
pub mod frame;

pub use disk_store::DiskStore;
pub use frame::{SnapshotError, SnapshotInfo, SNAPSHOT_MAGIC, SNAPSHOT_VERSION_1};

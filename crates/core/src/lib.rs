//! Core types and traits for spillkv
//!
//! This crate defines the foundational pieces shared by every layer:
//! - Error: Error type hierarchy
//! - Config: Construction-time configuration (capacity, threshold, paths)
//! - Traits: Key/value bounds and the unified `OverflowStore` contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod traits;

pub use config::{ConfigError, OverflowConfig, SnapshotPaths};
pub use error::{Error, Result};
pub use traits::{OverflowStore, SpillKey, SpillValue};

//! Overflow map scenario tests
//!
//! End-to-end behavior of the public API against real snapshot files.

mod common;

mod instance_isolation;
mod no_spill;
mod spill_sequence;

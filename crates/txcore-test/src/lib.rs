//! TXCore Test Harness - Fuzzing and stress testing for observable collections
//!
//! This crate provides:
//! - Recording and failing listeners
//! - Seeded operation fuzzing against a plain `Vec` model
//! - Concurrent mutation stress runs
//! - End-to-end scenario tests

pub mod fuzzer;
pub mod recorder;
pub mod scenarios;
pub mod stress;

pub use fuzzer::*;
pub use recorder::*;
pub use stress::*;

//! Bookguard Test Harness - Simulated host and exploit validation
//!
//! This crate provides:
//! - In-memory items and containers implementing the host traits
//! - A priority-ordered event bus and the three host events
//! - A chunk store that refuses oversized records, reproducing the rollback
//! - A simulated server driving edits, opens, transfers, saves and restarts
//! - End-to-end rollback exploit scenarios
//! - Seeded payload fuzzing

pub mod world;
pub mod bus;
pub mod chunk;
pub mod server;
pub mod scenario;
pub mod fuzzer;

pub use world::*;
pub use bus::*;
pub use chunk::*;
pub use server::*;
pub use scenario::*;
pub use fuzzer::*;

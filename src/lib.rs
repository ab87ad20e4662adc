//! bandit-lab — multi-armed bandit simulation harness
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod arm;
pub mod strategy;
pub mod engine;
pub mod report;
pub mod storage;

//! Core engine — the simulate → aggregate pipeline.

pub mod aggregator;
pub mod runner;

pub use aggregator::{aggregate, rank};
pub use runner::Runner;

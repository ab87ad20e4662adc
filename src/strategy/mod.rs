//! Strategy abstraction — the pluggable "bandit".
//!
//! The engine only ever talks to a strategy through [`Strategy`]: ask for a
//! recommendation, then report the payout of every recommended arm. Whatever
//! policy a strategy follows (exploration, memory of past pulls, ...) stays
//! private to it.

pub mod uniform;

use crate::types::ArmId;

/// A decision policy that recommends arms and learns from their payouts.
///
/// One instance is used for every run and epoch of a `Runner::simulate`
/// call. The runner never resets it between runs; a strategy that wants
/// independent runs has to reset itself.
pub trait Strategy {
    /// Display name, unique within a runner. Results are keyed by it.
    fn id(&self) -> &str;

    /// Recommend `size` distinct arm ids from the eligible set.
    ///
    /// When `size` exceeds the number of eligible arms the contract cannot
    /// be met; the strategy may return fewer ids, but any repeated id makes
    /// the runner abort the simulation.
    fn recommend(&mut self, size: usize) -> Vec<ArmId>;

    /// Payout of one recommended arm, delivered right after it was pulled,
    /// in recommendation order. `payout` is `>= 0` and often exactly `0`.
    fn feedback(&mut self, arm_id: &str, payout: f64);
}

/// Per-arm statistics a strategy can accumulate from feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArmStats {
    pub pulls: u64,
    pub total_payout: f64,
}

impl ArmStats {
    pub fn record(&mut self, payout: f64) {
        self.pulls += 1;
        self.total_payout += payout;
    }

    /// Mean payout per pull; zero before the first pull.
    pub fn mean(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.total_payout / self.pulls as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Uniform-random baseline.
//!
//! Recommends a uniformly random subset of the eligible arms every epoch and
//! ignores what it learns when choosing. Useful as the floor every real
//! policy should beat, and for smoke-testing configurations.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use super::{ArmStats, Strategy};
use crate::types::ArmId;

pub struct UniformRandom {
    id: String,
    arm_ids: Vec<ArmId>,
    stats: BTreeMap<ArmId, ArmStats>,
    rng: StdRng,
}

impl UniformRandom {
    /// Create the baseline with an OS-seeded random source. Repeated ids in
    /// `arm_ids` are dropped, keeping the first occurrence.
    pub fn new(id: impl Into<String>, arm_ids: Vec<ArmId>) -> Self {
        let mut seen = HashSet::new();
        let arm_ids = arm_ids
            .into_iter()
            .filter(|a| seen.insert(a.clone()))
            .collect();
        Self {
            id: id.into(),
            arm_ids,
            stats: BTreeMap::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Same as [`UniformRandom::new`] with a reproducible seed.
    pub fn with_seed(id: impl Into<String>, arm_ids: Vec<ArmId>, seed: u64) -> Self {
        let mut s = Self::new(id, arm_ids);
        s.rng = StdRng::seed_from_u64(seed);
        s
    }

    pub fn arm_ids(&self) -> &[ArmId] {
        &self.arm_ids
    }

    /// Statistics gathered from feedback, keyed by arm id.
    pub fn stats(&self) -> &BTreeMap<ArmId, ArmStats> {
        &self.stats
    }
}

impl Strategy for UniformRandom {
    fn id(&self) -> &str {
        &self.id
    }

    fn recommend(&mut self, size: usize) -> Vec<ArmId> {
        if size > self.arm_ids.len() {
            warn!(
                strategy = %self.id,
                requested = size,
                eligible = self.arm_ids.len(),
                "Recommendation size exceeds eligible arms, returning all of them"
            );
        }
        self.arm_ids
            .choose_multiple(&mut self.rng, size)
            .cloned()
            .collect()
    }

    fn feedback(&mut self, arm_id: &str, payout: f64) {
        self.stats.entry(arm_id.to_string()).or_default().record(payout);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Simulation runner.
//!
//! Plays every strategy against the shared arm population for a number of
//! runs × epochs, validating each recommendation and recording the total
//! payout of every epoch.

use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info};

use crate::arm::Arm;
use crate::strategy::Strategy;
use crate::types::{SimError, TrialResults};

pub struct Runner {
    arms: HashMap<String, Arm>,
    strategies: Vec<Box<dyn Strategy>>,
}

impl Runner {
    /// Build a runner. Strategy ids must be unique since results are keyed
    /// by them; arms are keyed by their own id (a later arm with the same id
    /// replaces an earlier one).
    pub fn new(
        arms: impl IntoIterator<Item = Arm>,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Result<Self, SimError> {
        let mut seen = HashSet::new();
        for s in &strategies {
            if !seen.insert(s.id().to_string()) {
                return Err(SimError::DuplicateStrategy(s.id().to_string()));
            }
        }
        let arms = arms
            .into_iter()
            .map(|arm| (arm.id().to_string(), arm))
            .collect();
        Ok(Self { arms, strategies })
    }

    /// Arm ids in sorted order.
    pub fn arm_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.arms.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run every strategy `runs` times for `epochs` epochs each.
    ///
    /// Per epoch: ask the strategy for `recommendation_size` arms, reject
    /// the whole simulation if the recommendation repeats an id, then pull
    /// each arm in order, feeding its payout back to the strategy before the
    /// next pull. Strategy state carries over from run to run.
    pub fn simulate(
        &mut self,
        runs: usize,
        epochs: usize,
        recommendation_size: usize,
    ) -> Result<TrialResults, SimError> {
        let mut results = TrialResults::new();

        for strategy in self.strategies.iter_mut() {
            let strategy_id = strategy.id().to_string();
            info!(
                strategy = %strategy_id,
                runs,
                epochs,
                recommendation_size,
                "Simulating strategy"
            );

            let mut strategy_runs = Vec::with_capacity(runs);
            for run in 0..runs {
                let mut run_payouts = Vec::with_capacity(epochs);

                for epoch in 0..epochs {
                    let recommendation = strategy.recommend(recommendation_size);

                    if has_duplicates(&recommendation) {
                        error!(
                            strategy = %strategy_id,
                            run,
                            epoch,
                            recommendation = ?recommendation,
                            "Recommendation contains duplicated entries, aborting simulation"
                        );
                        return Err(SimError::DuplicateRecommendation {
                            strategy: strategy_id,
                            run,
                            epoch,
                            recommendation,
                        });
                    }

                    if let Some(missing) = recommendation.iter().find(|id| !self.arms.contains_key(*id)) {
                        error!(strategy = %strategy_id, arm_id = %missing, "Unknown arm recommended");
                        return Err(SimError::UnknownArm {
                            strategy: strategy_id,
                            arm_id: missing.clone(),
                        });
                    }

                    let mut epoch_payout = 0.0;
                    for arm_id in &recommendation {
                        let payout = match self.arms.get_mut(arm_id) {
                            Some(arm) => arm.pull(),
                            None => 0.0, // checked above
                        };
                        epoch_payout += payout;
                        strategy.feedback(arm_id, payout);
                    }

                    run_payouts.push(epoch_payout);
                }

                debug!(
                    strategy = %strategy_id,
                    run,
                    total = run_payouts.iter().sum::<f64>(),
                    "Run complete"
                );
                strategy_runs.push(run_payouts);
            }

            let mean_total = if runs > 0 {
                strategy_runs.iter().map(|r| r.iter().sum::<f64>()).sum::<f64>() / runs as f64
            } else {
                0.0
            };
            info!(
                strategy = %strategy_id,
                mean_total_payout = format!("{mean_total:.4}"),
                "Strategy simulation complete"
            );
            results.push(strategy_id, strategy_runs);
        }

        Ok(results)
    }
}

fn has_duplicates(recommendation: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(recommendation.len());
    !recommendation.iter().all(|id| seen.insert(id.as_str()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs that
//! describe the simulation parameters, the arm population, and the
//! strategies to compare. `build_arms` / `build_strategies` turn the
//! description into live engine inputs.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use tracing::warn;

use crate::arm::{Arm, Payout};
use crate::strategy::uniform::UniformRandom;
use crate::strategy::Strategy;
use crate::types::{AggregationMode, Scale};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub arms: Vec<ArmConfig>,
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub runs: usize,
    pub epochs: usize,
    pub recommendation_size: usize,
    #[serde(default = "default_mode")]
    pub mode: AggregationMode,
    #[serde(default)]
    pub scale: Scale,
    /// Seeds every arm and strategy when set; OS entropy otherwise.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Where to persist the raw trial table (JSON).
    #[serde(default)]
    pub results_path: Option<String>,
    /// Where to write the chart data (JSON).
    #[serde(default)]
    pub plot_path: Option<String>,
}

fn default_mode() -> AggregationMode {
    AggregationMode::Cumulative
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArmConfig {
    pub id: String,
    pub activation_probability: f64,
    pub payout: PayoutConfig,
}

/// Payout distribution, tagged by `kind`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoutConfig {
    Constant { value: f64 },
    Normal { mean: f64, std_dev: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { rate: f64 },
}

impl PayoutConfig {
    pub fn build(&self) -> Result<Payout> {
        let payout = match *self {
            PayoutConfig::Constant { value } => Payout::constant(value),
            PayoutConfig::Normal { mean, std_dev } => Payout::normal(mean, std_dev)?,
            PayoutConfig::Uniform { low, high } => Payout::uniform(low, high)?,
            PayoutConfig::Exponential { rate } => Payout::exponential(rate)?,
        };
        Ok(payout)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub id: String,
    pub kind: StrategyKind,
    /// Eligible arms; all configured arms when omitted.
    #[serde(default)]
    pub arms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    UniformRandom,
}

impl StrategyConfig {
    /// Distinct arms this strategy may recommend, given `total` configured arms.
    pub fn eligible_count(&self, total: usize) -> usize {
        match &self.arms {
            Some(arms) => arms.iter().collect::<HashSet<_>>().len(),
            None => total,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run meaningfully.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if sim.runs == 0 || sim.epochs == 0 || sim.recommendation_size == 0 {
            bail!("runs, epochs and recommendation_size must all be positive");
        }
        if self.arms.is_empty() {
            bail!("at least one arm must be configured");
        }
        if self.strategies.is_empty() {
            bail!("at least one strategy must be configured");
        }

        let mut arm_ids = HashSet::new();
        for arm in &self.arms {
            if !arm_ids.insert(arm.id.as_str()) {
                bail!("duplicate arm id: {}", arm.id);
            }
            if !(0.0..=1.0).contains(&arm.activation_probability) {
                bail!(
                    "arm {} has activation probability {} outside [0, 1]",
                    arm.id,
                    arm.activation_probability
                );
            }
        }

        let mut strategy_ids = HashSet::new();
        for strategy in &self.strategies {
            if !strategy_ids.insert(strategy.id.as_str()) {
                bail!("duplicate strategy id: {}", strategy.id);
            }
            if let Some(eligible) = &strategy.arms {
                if let Some(unknown) = eligible.iter().find(|a| !arm_ids.contains(a.as_str())) {
                    bail!("strategy {} lists unknown arm {unknown}", strategy.id);
                }
            }
        }

        for strategy in &self.strategies {
            let eligible = strategy.eligible_count(self.arms.len());
            if sim.recommendation_size > eligible {
                warn!(
                    strategy = %strategy.id,
                    recommendation_size = sim.recommendation_size,
                    eligible,
                    "Recommendation size exceeds the strategy's eligible arms; it cannot avoid duplicates"
                );
            }
        }
        Ok(())
    }

    /// Ids of strategies with fewer eligible arms than `recommendation_size`.
    pub fn undersized_strategies(&self) -> Vec<&str> {
        self.strategies
            .iter()
            .filter(|s| self.simulation.recommendation_size > s.eligible_count(self.arms.len()))
            .map(|s| s.id.as_str())
            .collect()
    }

    /// Build the arm population. With a seed, arm `i` draws from `seed + i`.
    pub fn build_arms(&self) -> Result<Vec<Arm>> {
        self.arms
            .iter()
            .enumerate()
            .map(|(i, cfg)| -> Result<Arm> {
                let payout = cfg
                    .payout
                    .build()
                    .with_context(|| format!("Invalid payout for arm {}", cfg.id))?;
                let arm = Arm::new(cfg.id.clone(), cfg.activation_probability, payout)?;
                Ok(match self.simulation.seed {
                    Some(seed) => arm.with_seed(seed.wrapping_add(i as u64)),
                    None => arm,
                })
            })
            .collect()
    }

    /// Build the strategies in configuration order. Seeded strategies draw
    /// from a stream disjoint from the arms' seeds.
    pub fn build_strategies(&self) -> Vec<Box<dyn Strategy>> {
        let all_arms: Vec<String> = self.arms.iter().map(|a| a.id.clone()).collect();
        self.strategies
            .iter()
            .enumerate()
            .map(|(i, cfg)| {
                let eligible = cfg.arms.clone().unwrap_or_else(|| all_arms.clone());
                let strategy: Box<dyn Strategy> = match (cfg.kind, self.simulation.seed) {
                    (StrategyKind::UniformRandom, Some(seed)) => Box::new(UniformRandom::with_seed(
                        cfg.id.clone(),
                        eligible,
                        seed.wrapping_add(STRATEGY_SEED_OFFSET + i as u64),
                    )),
                    (StrategyKind::UniformRandom, None) => {
                        Box::new(UniformRandom::new(cfg.id.clone(), eligible))
                    }
                };
                strategy
            })
            .collect()
    }
}

const STRATEGY_SEED_OFFSET: u64 = 1 << 32;

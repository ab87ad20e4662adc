//! Shared types for the bandit harness.
//!
//! The result tables, aggregation options, and the domain error enum live
//! here so that the arm, strategy, engine, and report modules can depend on
//! them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an arm. Unique within one runner.
pub type ArmId = String;

// ---------------------------------------------------------------------------
// Trial result table
// ---------------------------------------------------------------------------

/// Every run of a single strategy: `runs[r][e]` is the total payout of
/// epoch `e` in run `r`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTrials {
    pub strategy_id: String,
    pub runs: Vec<Vec<f64>>,
}

/// Raw output of `Runner::simulate`, one entry per strategy in runner order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialResults {
    pub strategies: Vec<StrategyTrials>,
}

impl TrialResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// All runs recorded for a strategy, if it took part.
    pub fn get(&self, strategy_id: &str) -> Option<&[Vec<f64>]> {
        self.strategies
            .iter()
            .find(|s| s.strategy_id == strategy_id)
            .map(|s| s.runs.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyTrials> {
        self.strategies.iter()
    }

    /// Strategy ids in the order they were simulated.
    pub fn strategy_ids(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.strategy_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub(crate) fn push(&mut self, strategy_id: String, runs: Vec<Vec<f64>>) {
        self.strategies.push(StrategyTrials { strategy_id, runs });
    }
}

// ---------------------------------------------------------------------------
// Aggregated series
// ---------------------------------------------------------------------------

/// How per-run payouts are condensed into one curve per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Mean payout across runs at each epoch.
    Average,
    /// Running sum of the per-epoch mean.
    Cumulative,
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationMode::Average => write!(f, "average"),
            AggregationMode::Cumulative => write!(f, "cumulative"),
        }
    }
}

impl FromStr for AggregationMode {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "average" | "avg" | "mean" => Ok(AggregationMode::Average),
            "cumulative" | "cum" => Ok(AggregationMode::Cumulative),
            _ => Err(SimError::UnknownMode(s.to_string())),
        }
    }
}

/// Vertical axis scale requested from a chart renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Linear => write!(f, "linear"),
            Scale::Log => write!(f, "log"),
        }
    }
}

impl FromStr for Scale {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Scale::Linear),
            "log" | "logarithmic" => Ok(Scale::Log),
            _ => Err(SimError::UnknownScale(s.to_string())),
        }
    }
}

/// One aggregated curve, `values.len() == epochs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySeries {
    pub strategy_id: String,
    pub values: Vec<f64>,
}

impl StrategySeries {
    /// Value at the last epoch, `None` for an empty series.
    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Aggregator output, one curve per strategy in simulation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSeries {
    pub mode: AggregationMode,
    pub series: Vec<StrategySeries>,
}

impl AggregatedSeries {
    pub fn get(&self, strategy_id: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.strategy_id == strategy_id)
            .map(|s| s.values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategySeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for the simulation core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error(
        "Recommendation {recommendation:?} from strategy '{strategy}' contains duplicated entries \
         (run {run}, epoch {epoch})"
    )]
    DuplicateRecommendation {
        strategy: String,
        run: usize,
        epoch: usize,
        recommendation: Vec<ArmId>,
    },

    #[error("Strategy '{strategy}' recommended unknown arm '{arm_id}'")]
    UnknownArm { strategy: String, arm_id: ArmId },

    #[error("Strategy id '{0}' is used more than once")]
    DuplicateStrategy(String),

    #[error("Arm '{arm_id}' has activation probability {probability}, expected 0 <= p <= 1")]
    InvalidProbability { arm_id: ArmId, probability: f64 },

    #[error("Invalid payout distribution: {0}")]
    InvalidPayout(String),

    #[error("Unknown aggregation mode: '{0}' (expected 'average' or 'cumulative')")]
    UnknownMode(String),

    #[error("Unknown scale: '{0}' (expected 'linear' or 'log')")]
    UnknownScale(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Strategy '{strategy}' has {found} where {expected} were requested")]
    ShapeMismatch {
        strategy: String,
        expected: String,
        found: String,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Arms — stochastic reward sources.
//!
//! An arm activates with a fixed probability and, when it does, pays out a
//! draw from its payout distribution clamped at zero. Each arm owns its own
//! random source so tests can inject deterministic sequences.

use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use std::fmt;

use crate::types::{ArmId, SimError};

// ---------------------------------------------------------------------------
// Payout distributions
// ---------------------------------------------------------------------------

type PayoutFn = Box<dyn FnMut(&mut dyn RngCore) -> f64>;

/// Function evaluated when an arm activates.
pub enum Payout {
    Constant(f64),
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Exponential(Exp<f64>),
    /// Caller-supplied function; receives the arm's random source.
    Custom(PayoutFn),
}

impl Payout {
    pub fn constant(value: f64) -> Self {
        Payout::Constant(value)
    }

    /// Gaussian payout. `std_dev` must be finite and non-negative.
    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, SimError> {
        if !(std_dev >= 0.0 && std_dev.is_finite()) || !mean.is_finite() {
            return Err(SimError::InvalidPayout(format!(
                "normal needs a finite mean and a non-negative finite std_dev, got ({mean}, {std_dev})"
            )));
        }
        Normal::new(mean, std_dev)
            .map(Payout::Normal)
            .map_err(|e| SimError::InvalidPayout(format!("normal({mean}, {std_dev}): {e}")))
    }

    /// Uniform payout over `[low, high]`.
    pub fn uniform(low: f64, high: f64) -> Result<Self, SimError> {
        Uniform::new_inclusive(low, high)
            .map(Payout::Uniform)
            .map_err(|e| SimError::InvalidPayout(format!("uniform({low}, {high}): {e}")))
    }

    /// Exponential payout with the given rate (mean `1 / rate`).
    pub fn exponential(rate: f64) -> Result<Self, SimError> {
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(SimError::InvalidPayout(format!(
                "exponential rate must be positive and finite, got {rate}"
            )));
        }
        Exp::new(rate)
            .map(Payout::Exponential)
            .map_err(|e| SimError::InvalidPayout(format!("exponential({rate}): {e}")))
    }

    /// Wrap a zero-argument function, e.g. a closure over an external source.
    pub fn custom<F>(mut f: F) -> Self
    where
        F: FnMut() -> f64 + 'static,
    {
        Payout::Custom(Box::new(move |_rng: &mut dyn RngCore| f()))
    }

    /// Wrap a function that draws from the arm's own random source.
    pub fn custom_with_rng<F>(f: F) -> Self
    where
        F: FnMut(&mut dyn RngCore) -> f64 + 'static,
    {
        Payout::Custom(Box::new(f))
    }

    fn draw(&mut self, rng: &mut dyn RngCore) -> f64 {
        match self {
            Payout::Constant(v) => *v,
            Payout::Normal(d) => d.sample(rng),
            Payout::Uniform(d) => d.sample(rng),
            Payout::Exponential(d) => d.sample(rng),
            Payout::Custom(f) => f(rng),
        }
    }
}

impl fmt::Debug for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payout::Constant(v) => write!(f, "Constant({v})"),
            Payout::Normal(d) => write!(f, "Normal(mean={}, std_dev={})", d.mean(), d.std_dev()),
            Payout::Uniform(d) => write!(f, "Uniform({d:?})"),
            Payout::Exponential(d) => write!(f, "Exponential({d:?})"),
            Payout::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Arm
// ---------------------------------------------------------------------------

pub struct Arm {
    id: ArmId,
    activation_probability: f64,
    payout: Payout,
    rng: Box<dyn RngCore>,
}

impl Arm {
    /// Build an arm with an OS-seeded random source.
    pub fn new(
        id: impl Into<ArmId>,
        activation_probability: f64,
        payout: Payout,
    ) -> Result<Self, SimError> {
        let id = id.into();
        if !(0.0..=1.0).contains(&activation_probability) {
            return Err(SimError::InvalidProbability {
                arm_id: id,
                probability: activation_probability,
            });
        }
        Ok(Self {
            id,
            activation_probability,
            payout,
            rng: Box::new(StdRng::from_os_rng()),
        })
    }

    /// Replace the random source with a seeded `StdRng`.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Pull the arm once.
    ///
    /// Draws a uniform sample in `[0, 1)`; at or below the activation
    /// probability the payout function is evaluated and clamped to `>= 0`,
    /// otherwise the pull pays nothing. A probability of exactly zero never
    /// activates.
    pub fn pull(&mut self) -> f64 {
        let sample: f64 = self.rng.random();
        if self.activation_probability > 0.0 && sample <= self.activation_probability {
            // f64::max maps NaN to the other operand
            self.payout.draw(&mut *self.rng).max(0.0)
        } else {
            0.0
        }
    }
}

impl fmt::Debug for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arm")
            .field("id", &self.id)
            .field("activation_probability", &self.activation_probability)
            .field("payout", &self.payout)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

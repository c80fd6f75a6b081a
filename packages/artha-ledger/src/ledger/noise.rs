//! Noise sources for simulated price drift and stat jitter.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of the pseudo-random perturbations applied on every trade.
///
/// Implementations return a value in the closed interval `[low, high]`.
/// The engine clamps whatever comes back.
pub trait NoiseSource: Send {
    /// Draw one sample from `[low, high]`.
    fn sample(&mut self, low: f64, high: f64) -> f64;
}

/// Uniform noise backed by a `StdRng`.
#[derive(Debug, Clone)]
pub struct RandomNoise {
    rng: StdRng,
}

impl RandomNoise {
    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomNoise {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl NoiseSource for RandomNoise {
    fn sample(&mut self, low: f64, high: f64) -> f64 {
        if !(low.is_finite() && high.is_finite()) || high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Always lands at the same relative point of the interval.
///
/// `FixedNoise(0.5)` returns the midpoint, which for the symmetric ranges the
/// engine asks for means "no drift at all".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedNoise(pub f64);

impl FixedNoise {
    /// Midpoint of every interval.
    pub fn neutral() -> Self {
        Self(0.5)
    }

    /// Upper bound of every interval.
    pub fn max() -> Self {
        Self(1.0)
    }

    /// Lower bound of every interval.
    pub fn min() -> Self {
        Self(0.0)
    }
}

impl NoiseSource for FixedNoise {
    fn sample(&mut self, low: f64, high: f64) -> f64 {
        let t = self.0.clamp(0.0, 1.0);
        low + t * (high - low)
    }
}

/// Replays a queue of raw values, then yields zero.
#[derive(Debug, Clone, Default)]
pub struct ScriptedNoise {
    values: VecDeque<f64>,
}

impl ScriptedNoise {
    /// Queue values in draw order.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Append one more value.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
    }

    /// Values not drawn yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl NoiseSource for ScriptedNoise {
    fn sample(&mut self, low: f64, high: f64) -> f64 {
        self.values.pop_front().unwrap_or(0.0).clamp(low, high)
    }
}

//! Move acceptance schedule.
//!
//! Non-worsening moves are always accepted (plateau moves included, so the
//! search can drift across flat regions). A worsening move with score
//! delta `d < 0` is accepted with the Metropolis probability
//! `exp(d / T(i))`, where the temperature `T` decays with the iteration
//! count `i`. The decay curve is a tunable, not a fixed constant.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Temperature schedule for accepting worsening moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoolingSchedule {
    /// `T(i) = initial_temperature · rate^i`.
    Exponential {
        /// Temperature at iteration 0.
        initial_temperature: f64,
        /// Per-iteration decay factor in (0, 1).
        rate: f64,
    },
    /// `T(i) = initial_temperature · max(0, 1 - i / horizon)`.
    Linear {
        /// Temperature at iteration 0.
        initial_temperature: f64,
        /// Iteration at which the temperature reaches zero.
        horizon: u64,
    },
    /// Never accept a worsening move (pure hill climbing with plateaus).
    Greedy,
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        Self::Exponential {
            initial_temperature: 1.0,
            rate: 0.995,
        }
    }
}

impl CoolingSchedule {
    /// Temperature at an iteration.
    pub fn temperature(&self, iteration: u64) -> f64 {
        match *self {
            Self::Exponential {
                initial_temperature,
                rate,
            } => {
                let exponent = iteration.min(i32::MAX as u64) as i32;
                initial_temperature * rate.powi(exponent)
            }
            Self::Linear {
                initial_temperature,
                horizon,
            } => {
                if horizon == 0 {
                    return 0.0;
                }
                let remaining = 1.0 - iteration as f64 / horizon as f64;
                initial_temperature * remaining.max(0.0)
            }
            Self::Greedy => 0.0,
        }
    }

    /// Probability of accepting a move with the given score delta.
    pub fn acceptance_probability(&self, delta: i64, iteration: u64) -> f64 {
        if delta >= 0 {
            return 1.0;
        }
        let temperature = self.temperature(iteration);
        if temperature <= f64::EPSILON {
            0.0
        } else {
            (delta as f64 / temperature).exp()
        }
    }

    /// Decides acceptance. Draws from `rng` only for worsening moves at a
    /// positive temperature.
    pub fn accept<R: Rng>(&self, delta: i64, iteration: u64, rng: &mut R) -> bool {
        let p = self.acceptance_probability(delta, iteration);
        if p >= 1.0 {
            true
        } else if p <= 0.0 {
            false
        } else {
            rng.random::<f64>() < p
        }
    }
}

//! Fluent builder for constructing a [`Simulator`].

use crate::simulator::{PenaltyRange, Simulator};
use crate::{SimError, SimResult};

/// Fluent builder for [`Simulator`].
///
/// # Defaults
///
/// | Method                        | Default          |
/// |-------------------------------|------------------|
/// | `.n_pairs(n)`                 | 300              |
/// | `.sample_radius_m(r)`         | 1 500 m          |
/// | `.max_nodes(n)`               | 300              |
/// | `.min_nearby_nodes(n)`        | 10               |
/// | `.attempts_per_pair(n)`       | 20               |
/// | `.disruption_probability(p)`  | 0.3              |
/// | `.disruption_penalty(lo, hi)` | 0.2 .. 0.6       |
/// | `.normal_penalty(lo, hi)`     | 0.0 .. 0.1       |
/// | `.noise(std, floor)`          | σ = 0.05, ≥ 0.8  |
///
/// # Example
///
/// ```rust,ignore
/// let sim = SimulatorBuilder::new()
///     .n_pairs(500)
///     .disruption_probability(0.25)
///     .build()?;
/// let report = sim.simulate(&base, &restricted, Some(center), &mut rng)?;
/// ```
#[derive(Debug, Clone)]
pub struct SimulatorBuilder {
    n_pairs:                usize,
    sample_radius_m:        f64,
    max_nodes:              usize,
    min_nearby_nodes:       usize,
    attempts_per_pair:      usize,
    disruption_probability: f64,
    disruption_penalty:     (f64, f64),
    normal_penalty:         (f64, f64),
    noise_std:              f64,
    noise_floor:            f64,
}

impl SimulatorBuilder {
    pub fn new() -> Self {
        Self {
            n_pairs:                300,
            sample_radius_m:        1_500.0,
            max_nodes:              300,
            min_nearby_nodes:       10,
            attempts_per_pair:      20,
            disruption_probability: 0.3,
            disruption_penalty:     (0.2, 0.6),
            normal_penalty:         (0.0, 0.1),
            noise_std:              0.05,
            noise_floor:            0.8,
        }
    }

    /// Number of examples to generate.
    pub fn n_pairs(mut self, n: usize) -> Self {
        self.n_pairs = n;
        self
    }

    /// Radius around the sampling center inside which nodes are drawn.
    pub fn sample_radius_m(mut self, r: f64) -> Self {
        self.sample_radius_m = r;
        self
    }

    /// Upper bound on the candidate node subset.
    pub fn max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = n;
        self
    }

    /// Below this many nearby nodes the whole network is sampled.
    pub fn min_nearby_nodes(mut self, n: usize) -> Self {
        self.min_nearby_nodes = n;
        self
    }

    /// Attempt budget per requested example.
    pub fn attempts_per_pair(mut self, n: usize) -> Self {
        self.attempts_per_pair = n;
        self
    }

    /// Probability that a sampled trip happens on a disruption day.
    pub fn disruption_probability(mut self, p: f64) -> Self {
        self.disruption_probability = p;
        self
    }

    /// Extra slowdown on disruption days, drawn uniformly from `[low, high)`.
    pub fn disruption_penalty(mut self, low: f64, high: f64) -> Self {
        self.disruption_penalty = (low, high);
        self
    }

    /// Extra slowdown on normal days, drawn uniformly from `[low, high)`.
    pub fn normal_penalty(mut self, low: f64, high: f64) -> Self {
        self.normal_penalty = (low, high);
        self
    }

    /// Multiplicative noise `N(1, std)` clamped below at `floor`.
    pub fn noise(mut self, std: f64, floor: f64) -> Self {
        self.noise_std = std;
        self.noise_floor = floor;
        self
    }

    /// Validate the settings and return a ready-to-run [`Simulator`].
    pub fn build(self) -> SimResult<Simulator> {
        if self.n_pairs == 0 {
            return Err(SimError::Config("n_pairs must be > 0".into()));
        }
        if self.max_nodes < 2 {
            return Err(SimError::Config(format!("max_nodes must be >= 2, got {}", self.max_nodes)));
        }
        if self.attempts_per_pair == 0 {
            return Err(SimError::Config("attempts_per_pair must be > 0".into()));
        }
        if !(self.sample_radius_m.is_finite() && self.sample_radius_m > 0.0) {
            return Err(SimError::Config(format!(
                "sample_radius_m must be positive, got {}",
                self.sample_radius_m
            )));
        }
        if !(0.0..=1.0).contains(&self.disruption_probability) {
            return Err(SimError::Config(format!(
                "disruption_probability must be in [0, 1], got {}",
                self.disruption_probability
            )));
        }
        let disruption_penalty = penalty_range("disruption_penalty", self.disruption_penalty)?;
        let normal_penalty = penalty_range("normal_penalty", self.normal_penalty)?;
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(SimError::Config(format!("noise std must be >= 0, got {}", self.noise_std)));
        }
        if !(self.noise_floor.is_finite() && self.noise_floor > 0.0) {
            return Err(SimError::Config(format!("noise floor must be > 0, got {}", self.noise_floor)));
        }

        Ok(Simulator {
            n_pairs:                self.n_pairs,
            sample_radius_m:        self.sample_radius_m,
            max_nodes:              self.max_nodes,
            min_nearby_nodes:       self.min_nearby_nodes,
            max_attempts:           self.n_pairs.saturating_mul(self.attempts_per_pair),
            disruption_probability: self.disruption_probability,
            disruption_penalty,
            normal_penalty,
            noise_std:              self.noise_std,
            noise_floor:            self.noise_floor,
        })
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn penalty_range(what: &str, (low, high): (f64, f64)) -> SimResult<PenaltyRange> {
    if !(low.is_finite() && high.is_finite() && low >= 0.0 && high >= low) {
        return Err(SimError::Config(format!(
            "{what} must satisfy 0 <= low <= high, got {low}..{high}"
        )));
    }
    Ok(PenaltyRange { low, width: high - low })
}

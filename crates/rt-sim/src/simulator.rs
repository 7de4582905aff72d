//! The dataset generation loop.
//!
//! ```text
//! nodes ← pick_sample_nodes(base, center, radius, max_nodes)
//! while examples < n_pairs and attempts < budget:
//!   (o, d)  ← two distinct nodes
//!   normal  ← shortest path o → d on the base graph        (reject if none)
//!   day     ← Disruption with probability p, else Normal
//!   used    ← path on restricted graph if Disruption, else normal
//!                                                          (reject if none)
//!   factor  ← 1 + U(disruption or normal penalty range)
//!   noise   ← max(N(1, σ), floor)
//!   label   ← used.time × factor × noise
//! ```

use tracing::{info, warn};

use rt_core::{DayKind, GeoPoint, SimRng};
use rt_spatial::{shortest_path_stats, RoadNetwork, Weight};

use crate::observer::{NoopObserver, Rejection, SimObserver};
use crate::sampler::pick_sample_nodes;
use crate::{SimError, SimResult, TrainingExample};

/// Uniform range `[low, low + width)` for the penalty draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PenaltyRange {
    pub(crate) low:   f64,
    pub(crate) width: f64,
}

/// Output of one [`Simulator::simulate`] run.
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub examples: Vec<TrainingExample>,
    /// Pairs drawn, accepted or not.
    pub attempts: usize,
    /// Pairs rejected for lack of a path.
    pub rejected: usize,
}

impl SimulationReport {
    /// Number of examples generated on disruption days.
    pub fn disruption_count(&self) -> usize {
        self.examples.iter().filter(|e| e.day.is_disruption()).count()
    }
}

/// Validated simulation settings.  Build with
/// [`SimulatorBuilder`](crate::SimulatorBuilder).
#[derive(Debug, Clone)]
pub struct Simulator {
    pub(crate) n_pairs:                usize,
    pub(crate) sample_radius_m:        f64,
    pub(crate) max_nodes:              usize,
    pub(crate) min_nearby_nodes:       usize,
    pub(crate) max_attempts:           usize,
    pub(crate) disruption_probability: f64,
    pub(crate) disruption_penalty:     PenaltyRange,
    pub(crate) normal_penalty:         PenaltyRange,
    pub(crate) noise_std:              f64,
    pub(crate) noise_floor:            f64,
}

impl Simulator {
    pub fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// Total pair draws allowed before giving up.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Generate examples from `base` (normal days) and `restricted`
    /// (disruption days), sampling around `center`.
    pub fn simulate(
        &self,
        base: &RoadNetwork,
        restricted: &RoadNetwork,
        center: Option<GeoPoint>,
        rng: &mut SimRng,
    ) -> SimResult<SimulationReport> {
        self.simulate_observed(base, restricted, center, rng, &mut NoopObserver)
    }

    /// Like [`simulate`](Self::simulate), reporting progress to `observer`.
    pub fn simulate_observed<O: SimObserver>(
        &self,
        base: &RoadNetwork,
        restricted: &RoadNetwork,
        center: Option<GeoPoint>,
        rng: &mut SimRng,
        observer: &mut O,
    ) -> SimResult<SimulationReport> {
        let nodes = pick_sample_nodes(
            base,
            center,
            self.sample_radius_m,
            self.max_nodes,
            self.min_nearby_nodes,
            rng,
        );
        if nodes.len() < 2 {
            return Err(SimError::NotEnoughNodes { available: nodes.len() });
        }

        let mut report = SimulationReport {
            examples: Vec::with_capacity(self.n_pairs),
            ..SimulationReport::default()
        };

        while report.examples.len() < self.n_pairs && report.attempts < self.max_attempts {
            report.attempts += 1;
            let Some((origin, destination)) = rng.choose_pair(&nodes) else {
                break;
            };

            let normal = shortest_path_stats(base, origin, destination, Weight::Length);
            if !normal.is_found() {
                report.rejected += 1;
                observer.on_rejected(origin, destination, Rejection::NoBasePath);
                continue;
            }

            let day = DayKind::from_bool(rng.gen_bool(self.disruption_probability));
            let used = match day {
                DayKind::Disruption => shortest_path_stats(restricted, origin, destination, Weight::Length),
                DayKind::Normal => normal,
            };
            if !used.is_found() {
                report.rejected += 1;
                observer.on_rejected(origin, destination, Rejection::NoDayPath);
                continue;
            }

            let range = match day {
                DayKind::Disruption => self.disruption_penalty,
                DayKind::Normal => self.normal_penalty,
            };
            let factor = 1.0 + rng.uniform(range.low, range.width);
            let noise = rng.normal(1.0, self.noise_std).max(self.noise_floor);

            let example = TrainingExample {
                origin,
                destination,
                distance_m: used.distance_m,
                base_time_s: used.time_s,
                real_time_s: used.time_s * factor * noise,
                day,
            };
            observer.on_example(report.examples.len(), &example);
            report.examples.push(example);
        }

        observer.on_finish(report.examples.len(), report.attempts);
        if report.examples.len() < self.n_pairs {
            warn!(
                wanted = self.n_pairs,
                got = report.examples.len(),
                attempts = report.attempts,
                "attempt budget exhausted"
            );
        }
        info!(
            examples = report.examples.len(),
            disruption_days = report.disruption_count(),
            attempts = report.attempts,
            rejected = report.rejected,
            "simulated dataset"
        );
        Ok(report)
    }
}

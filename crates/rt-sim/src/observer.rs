//! Simulation observer trait for progress reporting and data collection.

use rt_core::NodeKey;

use crate::TrainingExample;

/// Why a sampled pair produced no example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No path on the unrestricted network.
    NoBasePath,
    /// No path on the network used for the drawn day.
    NoDayPath,
}

/// Callbacks invoked by [`Simulator::simulate_observed`][crate::Simulator::simulate_observed].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait SimObserver {
    /// Called for every accepted example, in generation order.
    fn on_example(&mut self, _index: usize, _example: &TrainingExample) {}

    /// Called for every rejected pair.
    fn on_rejected(&mut self, _origin: NodeKey, _destination: NodeKey, _reason: Rejection) {}

    /// Called once after the loop ends (target reached or budget spent).
    fn on_finish(&mut self, _examples: usize, _attempts: usize) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

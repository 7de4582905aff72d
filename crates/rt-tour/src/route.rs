//! The stitched multi-stop route.

use serde::{Deserialize, Serialize};

use rt_core::{GeoPoint, NodeKey};
use rt_spatial::{path_stats, RoadNetwork, Weight};

/// A closed tour through all waypoints as one continuous node path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Node path starting and ending at the depot node.  Adjacent entries
    /// are never equal.
    pub nodes: Vec<NodeKey>,
    /// Position of each entry of `nodes`.
    pub points: Vec<GeoPoint>,
    /// Snapped node of each input waypoint, in input order.
    pub waypoint_nodes: Vec<NodeKey>,
    /// Visiting order as waypoint indices, `0` first and last.
    pub order: Vec<usize>,
    /// Total length in metres.
    pub distance_m: f64,
    /// Total base travel time in seconds.
    pub time_s: f64,
}

impl Route {
    /// Re-derive `(distance_m, time_s)` by walking `nodes` on `network`.
    ///
    /// Matches the stored totals up to floating-point summation order.
    pub fn recompute_stats(&self, network: &RoadNetwork) -> Option<(f64, f64)> {
        path_stats(network, &self.nodes, Weight::Length)
    }

    /// Number of legs in the tour.
    pub fn leg_count(&self) -> usize {
        self.order.len().saturating_sub(1)
    }
}

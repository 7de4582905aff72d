//! Pairwise shortest paths among waypoint nodes.
//!
//! Every ordered pair `(i, j)` is solved once under [`Weight::Length`] and
//! the full [`PathStats`] kept, so the stitching step reuses the exact leg
//! paths the tour was ordered by.  Unreachable pairs have distance
//! `f64::INFINITY`, which the greedy tour naturally avoids.

use rt_core::NodeKey;
use rt_spatial::{shortest_path_stats, PathStats, RoadNetwork, Weight};

/// Dense `n × n` matrix of leg results, row-major.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    nodes: Vec<NodeKey>,
    legs:  Vec<PathStats>,
}

impl DistanceMatrix {
    /// Solve all ordered pairs of `nodes` on `network`.
    ///
    /// With the `parallel` feature rows are computed on the Rayon pool; the
    /// result is identical either way.
    pub fn build(network: &RoadNetwork, nodes: &[NodeKey]) -> Self {
        let row = |i: usize| -> Vec<PathStats> {
            nodes
                .iter()
                .enumerate()
                .map(|(j, &to)| {
                    if i == j {
                        PathStats { path: Some(vec![to]), distance_m: 0.0, time_s: 0.0 }
                    } else {
                        shortest_path_stats(network, nodes[i], to, Weight::Length)
                    }
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<PathStats>> = {
            use rayon::prelude::*;
            (0..nodes.len()).into_par_iter().map(row).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<PathStats>> = (0..nodes.len()).map(row).collect();

        Self { nodes: nodes.to_vec(), legs: rows.into_iter().flatten().collect() }
    }

    /// Build directly from distances (no paths).  `INFINITY` marks an
    /// unreachable pair.  Used for tour ordering on precomputed costs.
    ///
    /// # Panics
    ///
    /// If `distances` is not square with one row per node.
    pub fn from_distances(nodes: Vec<NodeKey>, distances: &[Vec<f64>]) -> Self {
        let n = nodes.len();
        assert_eq!(distances.len(), n, "distance matrix must have one row per node");
        let mut legs = Vec::with_capacity(n * n);
        for row in distances {
            assert_eq!(row.len(), n, "distance matrix must be square");
            for &d in row {
                legs.push(if d.is_finite() {
                    PathStats { path: None, distance_m: d, time_s: 0.0 }
                } else {
                    PathStats::no_path()
                });
            }
        }
        Self { nodes, legs }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    /// Leg distance in metres; `INFINITY` when there is no path.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        let d = self.legs[i * self.len() + j].distance_m;
        if d.is_finite() { d } else { f64::INFINITY }
    }

    /// Full leg result for `i → j`.
    pub fn leg(&self, i: usize, j: usize) -> &PathStats {
        &self.legs[i * self.len() + j]
    }
}

//! Routing trait, default Dijkstra implementation, and path statistics.
//!
//! # Two passes
//!
//! [`Router::route`] finds a node sequence by minimising one [`Weight`].
//! [`path_stats`] then walks that sequence and, for every consecutive node
//! pair, picks the parallel edge that is cheapest under the requested weight
//! and sums *its* length and travel time.  The reported distance/time are
//! therefore always re-derivable from the path alone.
//!
//! # Missing paths
//!
//! [`shortest_path_stats`] never fails: an absent node or a disconnected
//! pair yields [`PathStats::no_path`] (no path, NaN distance and time).
//! Callers must check [`PathStats::is_found`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use rt_core::{EdgeId, NodeId, NodeKey};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Weight ────────────────────────────────────────────────────────────────────

/// Edge attribute minimised by the router.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    /// Length in metres.
    #[default]
    Length,
    /// Derived travel time in seconds.
    TravelTime,
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Length => f.write_str("length"),
            Weight::TravelTime => f.write_str("travel_time"),
        }
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query between two nodes of one network.
#[derive(Debug, Clone)]
pub struct Route {
    /// Nodes visited in order, source first, destination last.
    pub nodes: Vec<NodeId>,
    /// Edges traversed in order (`nodes.len() - 1` of them).
    pub edges: Vec<EdgeId>,
    /// Total cost under the routing weight.
    pub cost: f64,
}

impl Route {
    /// Zero-length route from a node to itself.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// Implementations must be `Send + Sync` so one router can serve concurrent
/// route requests over a shared, read-only network.
pub trait Router: Send + Sync {
    /// Compute a least-cost route from `from` to `to` under `weight`.
    ///
    /// `from == to` is an empty route, not an error.
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        weight: Weight,
    ) -> SpatialResult<Route>;
}

/// Label-setting Dijkstra over the network's out-edge ranges.
///
/// Edges lacking the requested attribute are not traversable.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        from: NodeId,
        to: NodeId,
        weight: Weight,
    ) -> SpatialResult<Route> {
        dijkstra(network, from, to, weight)
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

/// Non-negative, finite cost with a total order for the binary heap.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn dijkstra(
    network: &RoadNetwork,
    from: NodeId,
    to: NodeId,
    weight: Weight,
) -> SpatialResult<Route> {
    let n = network.node_count();
    if from.index() >= n || to.index() >= n {
        return Err(SpatialError::NoRoute { from, to });
    }
    if from == to {
        return Ok(Route { nodes: vec![from], edges: vec![], cost: 0.0 });
    }

    // dist[v] = best known cost to reach v.
    let mut dist      = vec![f64::INFINITY; n];
    // Last edge into each settled node; INVALID until reached.
    let mut prev_edge = vec![EdgeId::INVALID; n];

    dist[from.index()] = 0.0;

    // Ordered by (cost, node) so equal costs pop in NodeId order.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(network, &prev_edge, from, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let Some(w) = network.edge(edge).weight(weight) else {
                continue;
            };
            if !w.is_finite() || w < 0.0 {
                continue;
            }
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost + w;

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(
    network: &RoadNetwork,
    prev_edge: &[EdgeId],
    from: NodeId,
    to: NodeId,
    cost: f64,
) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(from);
    nodes.extend(edges.iter().map(|e| network.edge_to[e.index()]));
    Route { nodes, edges, cost }
}

// ── Path statistics ───────────────────────────────────────────────────────────

/// Path between two node keys with its aggregate length and travel time.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStats {
    /// Node keys from origin to destination; `None` when no path exists.
    pub path: Option<Vec<NodeKey>>,
    /// Total length in metres; NaN when no path exists.
    pub distance_m: f64,
    /// Total base travel time in seconds; NaN when no path exists.
    pub time_s: f64,
}

impl PathStats {
    /// The "no path" sentinel.
    pub fn no_path() -> Self {
        Self { path: None, distance_m: f64::NAN, time_s: f64::NAN }
    }

    /// `true` if a path was found and both aggregates are finite.
    pub fn is_found(&self) -> bool {
        self.path.is_some() && self.distance_m.is_finite() && self.time_s.is_finite()
    }

    /// The path as a slice; empty for the sentinel.
    pub fn nodes(&self) -> &[NodeKey] {
        self.path.as_deref().unwrap_or(&[])
    }
}

/// Shortest path from `from` to `to` under `weight` using [`DijkstraRouter`].
pub fn shortest_path_stats(
    network: &RoadNetwork,
    from: NodeKey,
    to: NodeKey,
    weight: Weight,
) -> PathStats {
    shortest_path_stats_with(&DijkstraRouter, network, from, to, weight)
}

/// Like [`shortest_path_stats`] with a caller-supplied router.
pub fn shortest_path_stats_with<R: Router + ?Sized>(
    router: &R,
    network: &RoadNetwork,
    from: NodeKey,
    to: NodeKey,
    weight: Weight,
) -> PathStats {
    let (Some(src), Some(dst)) = (network.node_id(from), network.node_id(to)) else {
        trace!(%from, %to, "node not in graph");
        return PathStats::no_path();
    };

    let route = match router.route(network, src, dst, weight) {
        Ok(route) => route,
        Err(e) => {
            trace!(%from, %to, error = %e, "no path");
            return PathStats::no_path();
        }
    };

    let path: Vec<NodeKey> = route.nodes.iter().map(|&n| network.node_key(n)).collect();
    match path_stats(network, &path, weight) {
        Some((distance_m, time_s)) => PathStats { path: Some(path), distance_m, time_s },
        None => PathStats::no_path(),
    }
}

/// Re-derive `(distance_m, time_s)` for a node-key path.
///
/// For each consecutive pair, the parallel edge with the smallest `weight`
/// is selected (lowest key wins ties) and its length and travel time are
/// added.  Returns `None` if a pair is not connected by any edge or a node
/// is unknown.  A single-node path has zero length and time.
pub fn path_stats(network: &RoadNetwork, path: &[NodeKey], weight: Weight) -> Option<(f64, f64)> {
    let mut distance_m = 0.0;
    let mut time_s = 0.0;
    for pair in path.windows(2) {
        let (u, v) = (network.node_id(pair[0])?, network.node_id(pair[1])?);
        let best = cheapest_parallel_edge(network, u, v, weight)?;
        let data = network.edge(best);
        distance_m += data.length_m().unwrap_or(0.0);
        time_s += data.travel_time_s().unwrap_or(0.0);
    }
    if path.len() == 1 && !network.contains(path[0]) {
        return None;
    }
    Some((distance_m, time_s))
}

/// The parallel edge `u → v` with the smallest `weight`.
pub fn cheapest_parallel_edge(
    network: &RoadNetwork,
    u: NodeId,
    v: NodeId,
    weight: Weight,
) -> Option<EdgeId> {
    let mut best: Option<(EdgeId, f64)> = None;
    for e in network.edges_between(u, v) {
        let w = network.edge(e).weight(weight).unwrap_or(f64::INFINITY);
        match best {
            Some((_, bw)) if w >= bw => {}
            _ => best = Some((e, w)),
        }
    }
    best.map(|(e, _)| e)
}

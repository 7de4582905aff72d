//! Spatially bounded node sampling.

use tracing::debug;

use rt_core::{GeoPoint, NodeKey, SimRng};
use rt_spatial::RoadNetwork;

/// Random subset of nodes near `center` to draw origin/destination pairs from.
///
/// Nodes within `radius_m` (planar distance) of `center` are candidates;
/// `center` defaults to the network centroid.  When fewer than `min_nodes`
/// are nearby the whole node set is used instead.  At most `max_nodes` are
/// returned, drawn without replacement.
pub fn pick_sample_nodes(
    network: &RoadNetwork,
    center: Option<GeoPoint>,
    radius_m: f64,
    max_nodes: usize,
    min_nodes: usize,
    rng: &mut SimRng,
) -> Vec<NodeKey> {
    let Some(center) = center.or_else(|| network.centroid()) else {
        return Vec::new();
    };

    let mut candidates = network.nodes_within(center, radius_m);
    let nearby = candidates.len();
    if nearby < min_nodes {
        candidates = network.nodes().collect();
    }

    let picked: Vec<NodeKey> = rng
        .sample(&candidates, max_nodes)
        .into_iter()
        .map(|n| network.node_key(n))
        .collect();

    debug!(%center, radius_m, nearby, picked = picked.len(), "sampled candidate nodes");
    picked
}

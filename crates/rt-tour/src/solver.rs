//! Waypoint snapping, greedy tour ordering and leg stitching.

use tracing::{debug, info};

use rt_core::{GeoPoint, NodeKey};
use rt_spatial::RoadNetwork;

use crate::matrix::DistanceMatrix;
use crate::route::Route;
use crate::{TourError, TourResult};

/// Snap every waypoint to its nearest road node.
pub fn resolve_waypoints(network: &RoadNetwork, points: &[GeoPoint]) -> TourResult<Vec<NodeKey>> {
    if network.is_empty() {
        return Err(TourError::EmptyNetwork);
    }
    points
        .iter()
        .enumerate()
        .map(|(index, &point)| {
            if !point.is_valid() {
                return Err(TourError::InvalidWaypoint { index, point });
            }
            network
                .snap_to_node(point)
                .map(|n| network.node_key(n))
                .ok_or(TourError::EmptyNetwork)
        })
        .collect()
}

/// Greedy nearest-unvisited tour from `depot`, closed back to `depot`.
///
/// Returns the visiting order (depot first and last) and its total length.
/// Among equally near candidates the lowest index wins.  When every
/// remaining candidate is unreachable the lowest unvisited index is taken
/// and the length becomes infinite.
pub fn nearest_neighbor_tour(matrix: &DistanceMatrix, depot: usize) -> (Vec<usize>, f64) {
    let n = matrix.len();
    if n == 0 {
        return (Vec::new(), 0.0);
    }

    let mut visited = vec![false; n];
    visited[depot] = true;
    let mut order = Vec::with_capacity(n + 1);
    order.push(depot);
    let mut total = 0.0;
    let mut current = depot;

    for _ in 1..n {
        let mut best: Option<(usize, f64)> = None;
        for j in (0..n).filter(|&j| !visited[j]) {
            let d = matrix.distance(current, j);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((j, d)),
            }
        }
        let Some((next, d)) = best else { break };
        visited[next] = true;
        order.push(next);
        total += d;
        current = next;
    }

    total += matrix.distance(current, depot);
    order.push(depot);
    (order, total)
}

/// Closed route from the first waypoint through all others and back.
///
/// # Errors
///
/// * [`TourError::InvalidInput`] with fewer than two waypoints;
/// * [`TourError::EmptyNetwork`] / [`TourError::InvalidWaypoint`] from
///   snapping;
/// * [`TourError::Unreachable`] if any leg of the chosen order has no path.
pub fn find_route(network: &RoadNetwork, waypoints: &[GeoPoint]) -> TourResult<Route> {
    if waypoints.len() < 2 {
        return Err(TourError::InvalidInput(format!(
            "at least 2 waypoints required, got {}",
            waypoints.len()
        )));
    }

    let waypoint_nodes = resolve_waypoints(network, waypoints)?;
    let matrix = DistanceMatrix::build(network, &waypoint_nodes);
    let (order, estimate) = nearest_neighbor_tour(&matrix, 0);
    debug!(?order, estimate, "tour order");

    let mut nodes: Vec<NodeKey> = Vec::new();
    let (mut distance_m, mut time_s) = (0.0, 0.0);

    for (leg, pair) in order.windows(2).enumerate() {
        let (i, j) = (pair[0], pair[1]);
        let stats = matrix.leg(i, j);
        let path = match &stats.path {
            Some(p) if stats.is_found() => p,
            _ => {
                return Err(TourError::Unreachable {
                    leg,
                    from: waypoint_nodes[i],
                    to: waypoint_nodes[j],
                });
            }
        };

        // Each leg starts where the previous one ended; skip the junction.
        let skip = usize::from(nodes.last().is_some_and(|last| Some(last) == path.first()));
        nodes.extend_from_slice(&path[skip..]);
        distance_m += stats.distance_m;
        time_s += stats.time_s;
    }

    let points = nodes
        .iter()
        .filter_map(|&k| network.position_of(k))
        .collect();

    info!(
        waypoints = waypoints.len(),
        path_nodes = nodes.len(),
        distance_m,
        time_s,
        "route found"
    );
    Ok(Route { nodes, points, waypoint_nodes, order, distance_m, time_s })
}

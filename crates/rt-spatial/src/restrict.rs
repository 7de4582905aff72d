//! Restriction overlay: remove edges inside disruption zones.
//!
//! All geometry is evaluated in a local equirectangular projection centred
//! on the network centroid, so buffer radii are plain metres.  An edge is
//! removed when the point halfway along its polyline lies strictly inside
//! any zone's circle.  The input network is never modified.

use serde::{Deserialize, Serialize};
use tracing::info;

use rt_core::{EdgeId, GeoPoint, LocalProjection};

use crate::components::largest_component;
use crate::network::RoadNetwork;

/// A circular area where recurring closures happen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisruptionZone {
    pub center: GeoPoint,
    pub radius_m: f64,
}

impl DisruptionZone {
    pub fn new(center: GeoPoint, radius_m: f64) -> Self {
        Self { center, radius_m }
    }
}

/// Remove every edge whose midpoint is within `buffer_m` of any of
/// `centers`, then keep only the largest remaining component.
pub fn apply_restrictions(network: &RoadNetwork, centers: &[GeoPoint], buffer_m: f64) -> RoadNetwork {
    let zones: Vec<DisruptionZone> = centers
        .iter()
        .map(|&c| DisruptionZone::new(c, buffer_m))
        .collect();
    restrict_zones(network, &zones)
}

/// Like [`apply_restrictions`] with a radius per zone.
pub fn restrict_zones(network: &RoadNetwork, zones: &[DisruptionZone]) -> RoadNetwork {
    let Some(origin) = network.centroid() else {
        return network.clone();
    };
    let proj = LocalProjection::new(origin);
    let circles: Vec<([f64; 2], f64)> = zones
        .iter()
        .map(|z| (proj.project(z.center), z.radius_m))
        .collect();

    let blocked: Vec<bool> = (0..network.edge_count())
        .map(|i| {
            let mid = edge_midpoint_xy(network, &proj, EdgeId(i as u32));
            circles.iter().any(|&(c, r)| {
                let (dx, dy) = (mid[0] - c[0], mid[1] - c[1]);
                (dx * dx + dy * dy).sqrt() < r
            })
        })
        .collect();

    let removed = blocked.iter().filter(|b| **b).count();
    let pruned = network.retain(|_| true, |e| !blocked[e.index()]);
    let restricted = largest_component(&pruned);

    info!(
        zones = zones.len(),
        removed_edges = removed,
        nodes = restricted.node_count(),
        edges = restricted.edge_count(),
        "built restricted network"
    );
    restricted
}

/// Geographic point halfway along the edge's polyline.
pub fn edge_midpoint(network: &RoadNetwork, edge: EdgeId) -> GeoPoint {
    let origin = network.position(network.edge_from[edge.index()]);
    let proj = LocalProjection::new(origin);
    proj.unproject(edge_midpoint_xy(network, &proj, edge))
}

fn edge_midpoint_xy(network: &RoadNetwork, proj: &LocalProjection, edge: EdgeId) -> [f64; 2] {
    let pts: Vec<[f64; 2]> = network
        .edge_polyline(edge)
        .into_iter()
        .map(|p| proj.project(p))
        .collect();
    interpolate_half(&pts)
}

/// Point at half the total length of a planar polyline.
fn interpolate_half(pts: &[[f64; 2]]) -> [f64; 2] {
    let seg_len = |a: [f64; 2], b: [f64; 2]| ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
    let total: f64 = pts.windows(2).map(|w| seg_len(w[0], w[1])).sum();
    if pts.len() < 2 || total <= 0.0 {
        return pts.first().copied().unwrap_or([0.0, 0.0]);
    }

    let mut remaining = total / 2.0;
    for w in pts.windows(2) {
        let len = seg_len(w[0], w[1]);
        if len > 0.0 && remaining <= len {
            let t = remaining / len;
            return [w[0][0] + t * (w[1][0] - w[0][0]), w[0][1] + t * (w[1][1] - w[0][1])];
        }
        remaining -= len;
    }
    pts[pts.len() - 1]
}

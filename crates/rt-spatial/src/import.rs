//! Shared OSM import logic for the PBF and Overpass loaders.
//!
//! Both loaders reduce their input to a node position table plus a list of
//! [`OsmWay`]s; [`build_from_ways`] turns that into a [`RoadNetwork`].
//! Edges come out with a length (haversine along the way's vertices), the
//! vertex polyline and the way's raw `maxspeed`, but no speed: the caller runs
//! [`ensure_speeds`](crate::ensure_speeds) afterwards.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rt_core::{GeoPoint, NodeKey};

use crate::edge::{EdgeData, MaxSpeed};
use crate::network::{RoadNetwork, RoadNetworkBuilder};

// ── Bounding box ──────────────────────────────────────────────────────────────

/// Geographic rectangle used to select the map area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self { min_lat, min_lon, max_lat, max_lon }
    }

    /// Smallest box holding every point, grown by `margin_deg` on each side.
    /// `None` for an empty slice.
    pub fn around(points: &[GeoPoint], margin_deg: f64) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self::new(first.lat, first.lon, first.lat, first.lon);
        for p in &points[1..] {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
        }
        Some(Self::new(
            bbox.min_lat - margin_deg,
            bbox.min_lon - margin_deg,
            bbox.max_lat + margin_deg,
            bbox.max_lon + margin_deg,
        ))
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat) && (self.min_lon..=self.max_lon).contains(&p.lon)
    }
}

// ── Ways ──────────────────────────────────────────────────────────────────────

/// Direction restriction of a way.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Oneway {
    #[default]
    No,
    /// Traffic follows the node order.
    Forward,
    /// Traffic runs against the node order (`oneway=-1`).
    Reverse,
}

/// A drivable OSM way reduced to what the graph needs.
#[derive(Clone, Debug, PartialEq)]
pub struct OsmWay {
    /// OSM node ids in way order.
    pub refs: Vec<i64>,
    pub maxspeed: Option<MaxSpeed>,
    pub oneway: Oneway,
}

/// `true` for `highway` values a car may drive on.
pub fn is_drivable(highway: &str) -> bool {
    matches!(
        highway,
        "motorway" | "motorway_link"
            | "trunk" | "trunk_link"
            | "primary" | "primary_link"
            | "secondary" | "secondary_link"
            | "tertiary" | "tertiary_link"
            | "residential" | "living_street"
            | "unclassified" | "service" | "road"
    )
}

/// Direction of travel from the `highway` class and an optional `oneway` tag.
///
/// Motorways are implicitly one-way in OSM convention.
pub fn oneway_from_tags(highway: &str, oneway: Option<&str>) -> Oneway {
    match oneway {
        Some("yes" | "1" | "true") => Oneway::Forward,
        Some("-1" | "reverse") => Oneway::Reverse,
        Some("no" | "0" | "false") => Oneway::No,
        _ if matches!(highway, "motorway" | "motorway_link") => Oneway::Forward,
        _ => Oneway::No,
    }
}

/// Interpret a raw `maxspeed` tag; `"50;30"` becomes a candidate list.
pub fn maxspeed_from_tag(raw: &str) -> Option<MaxSpeed> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains(';') {
        let parts: Vec<String> = raw
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        return Some(MaxSpeed::Candidates(parts));
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(MaxSpeed::Value(v)),
        Err(_) => Some(MaxSpeed::Text(raw.to_string())),
    }
}

/// Build the road graph from node positions and drivable ways.
///
/// Graph nodes are the way ends and the vertices shared by more than one
/// way (or visited twice by the same way).  The vertices in between are
/// folded into the edge geometry, and the edge length is the haversine sum
/// along them, so a street between two junctions is a single edge.
///
/// A ref without a position splits its way; such refs are counted as
/// skipped.  Segments that start and end on the same node are dropped.
pub fn build_from_ways(positions: &FxHashMap<i64, GeoPoint>, ways: &[OsmWay]) -> RoadNetwork {
    let mut skipped = 0usize;
    let mut runs: Vec<(&OsmWay, Vec<i64>)> = Vec::new();
    for way in ways {
        let mut run: Vec<i64> = Vec::new();
        for &id in &way.refs {
            if !positions.contains_key(&id) {
                skipped += 1;
                if run.len() >= 2 {
                    runs.push((way, std::mem::take(&mut run)));
                } else {
                    run.clear();
                }
                continue;
            }
            if run.last() != Some(&id) {
                run.push(id);
            }
        }
        if run.len() >= 2 {
            runs.push((way, run));
        }
    }

    let mut seen: FxHashMap<i64, u32> = FxHashMap::default();
    let mut junctions: FxHashSet<i64> = FxHashSet::default();
    for (_, run) in &runs {
        for &id in run {
            *seen.entry(id).or_insert(0) += 1;
        }
        junctions.insert(run[0]);
        junctions.insert(run[run.len() - 1]);
    }
    junctions.extend(seen.iter().filter(|&(_, &n)| n >= 2).map(|(&id, _)| id));

    let mut b = RoadNetworkBuilder::with_capacity(junctions.len(), runs.len() * 2);
    // Insert in id order so node numbering does not depend on hash order.
    let mut ids: Vec<i64> = junctions.iter().copied().collect();
    ids.sort_unstable();
    for id in ids {
        b.add_node(NodeKey(id), positions[&id]);
    }

    let mut loops = 0usize;
    for (way, run) in &runs {
        let mut start = 0;
        for i in 1..run.len() {
            if i + 1 < run.len() && !junctions.contains(&run[i]) {
                continue;
            }
            let segment = &run[start..=i];
            start = i;

            let (Some(a), Some(c)) = (b.node_id(NodeKey(segment[0])), b.node_id(NodeKey(segment[segment.len() - 1]))) else {
                continue;
            };
            if a == c {
                loops += 1;
                continue;
            }
            let geometry: Vec<GeoPoint> = segment.iter().map(|id| positions[id]).collect();
            let length: f64 = geometry.windows(2).map(|w| w[0].distance_m(w[1])).sum();
            let mut data = EdgeData::raw().with_length_m(length);
            if let Some(max) = &way.maxspeed {
                data = data.with_maxspeed(max.clone());
            }

            match way.oneway {
                Oneway::No => b.add_road(a, c, data.with_geometry(geometry)),
                Oneway::Forward => {
                    b.add_edge(a, c, data.with_geometry(geometry));
                }
                Oneway::Reverse => {
                    let mut reversed = geometry;
                    reversed.reverse();
                    b.add_edge(c, a, data.with_geometry(reversed));
                }
            }
        }
    }

    debug!(
        ways = ways.len(),
        nodes = b.node_count(),
        edges = b.edge_count(),
        skipped,
        loops,
        "built network from ways"
    );
    b.build()
}

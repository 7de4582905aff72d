//! Overpass API loader — enabled with the `overpass` Cargo feature.
//!
//! Downloads every drivable `highway` way inside a bounding box together
//! with its nodes (`(._;>;); out body;`) and builds the graph through
//! [`build_from_ways`].

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::{debug, info};

use rt_core::GeoPoint;

use crate::import::{build_from_ways, is_drivable, maxspeed_from_tag, oneway_from_tags, BoundingBox, OsmWay};
use crate::network::RoadNetwork;
use crate::source::MapSource;
use crate::{SpatialError, SpatialResult};

/// Public Overpass endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const HIGHWAY_FILTER: &str = "^(motorway|motorway_link|trunk|trunk_link|primary|primary_link|\
secondary|secondary_link|tertiary|tertiary_link|residential|living_street|unclassified|service|road)$";

/// [`MapSource`] that queries the Overpass API.
#[derive(Clone, Debug)]
pub struct OverpassSource {
    bbox: BoundingBox,
    url: String,
    timeout: Duration,
}

impl OverpassSource {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            url: DEFAULT_OVERPASS_URL.to_string(),
            timeout: Duration::from_secs(180),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The Overpass QL query sent for this box.
    pub fn query(&self) -> String {
        let b = &self.bbox;
        format!(
            "[out:json][timeout:{}];\n(\n  way[\"highway\"~\"{HIGHWAY_FILTER}\"]({},{},{},{});\n);\n(._;>;);\nout body;",
            self.timeout.as_secs(),
            b.min_lat, b.min_lon, b.max_lat, b.max_lon
        )
    }
}

impl MapSource for OverpassSource {
    fn fetch(&self) -> SpatialResult<RoadNetwork> {
        let query = self.query();
        debug!(%query, "overpass query");
        info!(url = %self.url, bbox = ?self.bbox, "downloading road network");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("rt-spatial/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SpatialError::Overpass(e.to_string()))?;

        let response = client
            .post(&self.url)
            .header("Content-Type", "text/plain")
            .body(query)
            .send()
            .map_err(|e| SpatialError::Overpass(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SpatialError::Overpass(format!("status {}", response.status())));
        }

        let body: OverpassResponse = response
            .json()
            .map_err(|e| SpatialError::Overpass(e.to_string()))?;
        info!(elements = body.elements.len(), "received OSM elements");
        Ok(network_from_response(body))
    }

    fn describe(&self) -> String {
        format!("Overpass API at {}", self.url)
    }
}

// ── Response model ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    nodes: Option<Vec<i64>>,
    #[serde(default)]
    tags: FxHashMap<String, String>,
}

fn network_from_response(body: OverpassResponse) -> RoadNetwork {
    let mut positions: FxHashMap<i64, GeoPoint> = FxHashMap::default();
    let mut ways = Vec::new();

    for elem in body.elements {
        match (elem.kind.as_str(), elem.lat, elem.lon) {
            ("node", Some(lat), Some(lon)) => {
                positions.insert(elem.id, GeoPoint::new(lat, lon));
            }
            ("way", ..) => {
                let Some(highway) = elem.tags.get("highway").filter(|h| is_drivable(h)) else {
                    continue;
                };
                ways.push(OsmWay {
                    refs: elem.nodes.unwrap_or_default(),
                    maxspeed: elem.tags.get("maxspeed").and_then(|m| maxspeed_from_tag(m)),
                    oneway: oneway_from_tags(highway, elem.tags.get("oneway").map(String::as_str)),
                });
            }
            _ => {}
        }
    }

    build_from_ways(&positions, &ways)
}

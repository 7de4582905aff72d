//! OSM PBF loader — enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use std::path::Path;
//! use rt_spatial::osm::PbfSource;
//!
//! let source = PbfSource::new("bolivia-latest.osm.pbf").with_bbox(bbox);
//! let network = source.fetch()?;
//! ```
//!
//! # Memory note
//!
//! The loader buffers every OSM node position in one pass because ways
//! reference nodes by id.  Clip the extract (or pass a bounding box) for
//! anything larger than a city.

use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader};
use rustc_hash::FxHashMap;
use tracing::info;

use rt_core::GeoPoint;

use crate::import::{build_from_ways, is_drivable, maxspeed_from_tag, oneway_from_tags, BoundingBox, OsmWay};
use crate::network::RoadNetwork;
use crate::source::MapSource;
use crate::{SpatialError, SpatialResult};

/// Load the drivable road network from an OSM PBF file.
///
/// With `bbox`, nodes outside the box are dropped (ways crossing the edge
/// are cut at the boundary).
pub fn load_from_pbf(path: &Path, bbox: Option<BoundingBox>) -> SpatialResult<RoadNetwork> {
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;

    let mut positions: FxHashMap<i64, GeoPoint> = FxHashMap::default();
    let mut ways: Vec<OsmWay> = Vec::new();

    let mut keep_node = |id: i64, pos: GeoPoint| {
        if bbox.is_none_or(|b| b.contains(pos)) {
            positions.insert(id, pos);
        }
    };

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => keep_node(n.id(), GeoPoint::new(n.lat(), n.lon())),
            Element::DenseNode(n) => keep_node(n.id(), GeoPoint::new(n.lat(), n.lon())),
            Element::Way(w) => {
                let mut highway = None;
                let mut oneway = None;
                let mut maxspeed = None;
                for (k, v) in w.tags() {
                    match k {
                        "highway" => highway = Some(v),
                        "oneway" => oneway = Some(v),
                        "maxspeed" => maxspeed = Some(v),
                        _ => {}
                    }
                }
                if let Some(highway) = highway.filter(|h| is_drivable(h)) {
                    ways.push(OsmWay {
                        refs: w.refs().collect(),
                        maxspeed: maxspeed.and_then(maxspeed_from_tag),
                        oneway: oneway_from_tags(highway, oneway),
                    });
                }
            }
            _ => {}
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    info!(path = %path.display(), nodes = positions.len(), ways = ways.len(), "read OSM extract");
    Ok(build_from_ways(&positions, &ways))
}

/// [`MapSource`] reading a local PBF extract.
#[derive(Clone, Debug)]
pub struct PbfSource {
    path: PathBuf,
    bbox: Option<BoundingBox>,
}

impl PbfSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), bbox: None }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

impl MapSource for PbfSource {
    fn fetch(&self) -> SpatialResult<RoadNetwork> {
        load_from_pbf(&self.path, self.bbox)
    }

    fn describe(&self) -> String {
        format!("OSM extract {}", self.path.display())
    }
}

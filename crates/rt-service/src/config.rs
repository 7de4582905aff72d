//! Engine configuration.
//!
//! Every field has a default, so an empty TOML file is a valid
//! configuration for El Alto.  Example:
//!
//! ```toml
//! [graph]
//! cache_path = "data/graph.json"
//! fallback_kph = 30.0
//!
//! [zones]
//! buffer_m = 500.0
//! weekday = "Thu"
//!
//! [simulation]
//! n_pairs = 300
//! seed = 42
//!
//! [model]
//! path = "data/model.json"
//!
//! [model.forest]
//! n_trees = 200
//! ```

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use rt_core::{DisruptionCalendar, GeoPoint};
use rt_model::ForestParams;
use rt_sim::{Simulator, SimulatorBuilder};
use rt_spatial::{BoundingBox, DisruptionZone};

use crate::{ServiceError, ServiceResult};

/// The fourteen street-market locations of El Alto, `(lat, lon)`.
pub const MARKET_POINTS: [(f64, f64); 14] = [
    (-16.4950, -68.1650),
    (-16.5200, -68.1800),
    (-16.5320, -68.1950),
    (-16.5100, -68.2050),
    (-16.4980, -68.1900),
    (-16.5030, -68.1750),
    (-16.4800, -68.2300),
    (-16.5800, -68.2100),
    (-16.4850, -68.2600),
    (-16.6450, -68.1400),
    (-16.5350, -68.2400),
    (-16.5450, -68.2000),
    (-16.4600, -68.2000),
    (-16.5050, -68.2000),
];

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Persisted network; read before the map source, written after it.
    pub cache_path: Option<PathBuf>,
    /// Speed for edges without a usable `maxspeed`.
    pub fallback_kph: f64,
    /// Local OSM extract used by the `osm` feature.
    pub pbf_path: Option<PathBuf>,
    /// Area to download or extract.  Defaults to the zones plus a margin.
    pub bbox: Option<BoundingBox>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cache_path:   Some(PathBuf::from("data/graph.json")),
            fallback_kph: 30.0,
            pbf_path:     None,
            bbox:         None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub points: Vec<GeoPoint>,
    /// Closure radius around each point, metres.
    pub buffer_m: f64,
    /// Weekday the markets are held on.
    pub weekday: Weekday,
    /// Where the retrain pipeline exports the zones as GeoJSON.
    pub geojson_path: Option<PathBuf>,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            points:       MARKET_POINTS.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect(),
            buffer_m:     500.0,
            weekday:      Weekday::Thu,
            geojson_path: Some(PathBuf::from("data/zones.geojson")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub n_pairs: usize,
    /// Defaults to the first zone point.
    pub sample_center: Option<GeoPoint>,
    pub sample_radius_m: f64,
    pub max_nodes: usize,
    pub min_nearby_nodes: usize,
    pub attempts_per_pair: usize,
    pub disruption_probability: f64,
    pub seed: u64,
    /// Optional CSV dump of the simulated dataset.
    pub dataset_path: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_pairs:                300,
            sample_center:          None,
            sample_radius_m:        1_500.0,
            max_nodes:              300,
            min_nearby_nodes:       10,
            attempts_per_pair:      20,
            disruption_probability: 0.3,
            seed:                   42,
            dataset_path:           Some(PathBuf::from("data/dataset.csv")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Trained model file.  `None` keeps the model in memory only.
    pub path: Option<PathBuf>,
    pub forest: ForestParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path:   Some(PathBuf::from("data/model.json")),
            forest: ForestParams::default(),
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub graph:      GraphConfig,
    pub zones:      ZoneConfig,
    pub simulation: SimulationConfig,
    pub model:      ModelConfig,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> ServiceResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> ServiceResult<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Checks the values serde cannot.  Simulation parameters are checked
    /// again by [`SimulatorBuilder::build`].
    pub fn validate(&self) -> ServiceResult<()> {
        if !(self.graph.fallback_kph.is_finite() && self.graph.fallback_kph > 0.0) {
            return Err(ServiceError::Config(format!(
                "graph.fallback_kph must be positive, got {}",
                self.graph.fallback_kph
            )));
        }
        if !(self.zones.buffer_m.is_finite() && self.zones.buffer_m > 0.0) {
            return Err(ServiceError::Config(format!(
                "zones.buffer_m must be positive, got {}",
                self.zones.buffer_m
            )));
        }
        if let Some(p) = self.zones.points.iter().find(|p| !p.is_valid()) {
            return Err(ServiceError::Config(format!("invalid zone point {p}")));
        }
        self.forest_params()
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn calendar(&self) -> DisruptionCalendar {
        DisruptionCalendar::new(self.zones.weekday)
    }

    pub fn disruption_zones(&self) -> Vec<DisruptionZone> {
        self.zones
            .points
            .iter()
            .map(|&p| DisruptionZone::new(p, self.zones.buffer_m))
            .collect()
    }

    pub fn sample_center(&self) -> Option<GeoPoint> {
        self.simulation.sample_center.or_else(|| self.zones.points.first().copied())
    }

    /// Configured bounding box, else the zones with a 0.02° margin.
    pub fn service_area(&self) -> Option<BoundingBox> {
        self.graph.bbox.or_else(|| BoundingBox::around(&self.zones.points, 0.02))
    }

    pub fn forest_params(&self) -> ForestParams {
        self.model.forest
    }

    pub fn simulator(&self) -> ServiceResult<Simulator> {
        let s = &self.simulation;
        let sim = SimulatorBuilder::new()
            .n_pairs(s.n_pairs)
            .sample_radius_m(s.sample_radius_m)
            .max_nodes(s.max_nodes)
            .min_nearby_nodes(s.min_nearby_nodes)
            .attempts_per_pair(s.attempts_per_pair)
            .disruption_probability(s.disruption_probability)
            .build()?;
        Ok(sim)
    }
}

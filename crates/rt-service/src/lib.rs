//! `rt-service` — the routing engine as one owned service object.
//!
//! [`RoutingEngine`] wires the other crates together: it owns the lazily
//! loaded road network (`rt-spatial`), answers multi-stop route requests
//! (`rt-tour`), corrects their travel time with the current model
//! (`rt-model`) and runs the retrain pipeline (`rt-sim` + `rt-model`).
//!
//! ```rust,ignore
//! let config = EngineConfig::from_toml_file(Path::new("el_alto.toml"))?;
//! let engine = RoutingEngine::new(config, source);
//! engine.ensure_loaded()?;
//! let response = engine.find_route(&RouteRequest::new(vec![depot, stop_a, stop_b]))?;
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod geojson;


pub use api::{
    PredictionRequest, PredictionResponse, RetrainReport, RouteRequest, RouteResponse, RouteSummary, round2,
};
pub use config::{EngineConfig, GraphConfig, MARKET_POINTS, ModelConfig, SimulationConfig, ZoneConfig};
pub use engine::RoutingEngine;
pub use error::{ServiceError, ServiceResult, Stage};
pub use geojson::{write_zones_geojson, zones_feature_collection};

//! The owned routing service.
//!
//! `RoutingEngine` holds the lazily loaded base network, the restricted
//! network derived from it and the current correction model.  Route and prediction calls only read them and may run
//! concurrently from any number of threads.  [`RoutingEngine::retrain`]
//! builds a new model without holding any lock and publishes it with a
//! single `Arc` swap.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::{debug, info};

use rt_core::{DayKind, SimRng};
use rt_model::{Features, ModelStore, Prediction, TimeCorrectionModel, predict_or_fallback};
use rt_sim::write_examples;
use rt_spatial::{GraphStore, MapSource, RoadNetwork, restrict_zones};

use crate::api::{PredictionRequest, PredictionResponse, RetrainReport, RouteRequest, RouteResponse};
use crate::config::EngineConfig;
use crate::error::{ServiceError, ServiceResult, Stage};
use crate::geojson::write_zones_geojson;

/// RNG stream offsets derived from the configured seed.
const SIMULATION_STREAM: u64 = 0;
const TRAINING_STREAM:   u64 = 1;

pub struct RoutingEngine<S> {
    config:     EngineConfig,
    graph:      GraphStore<S>,
    /// Base network minus the configured zones.  Zones are fixed for the
    /// engine's lifetime, so one derivation serves every retrain.
    restricted: OnceLock<Arc<RoadNetwork>>,
    model:      ModelStore,
}

impl<S: MapSource> RoutingEngine<S> {
    pub fn new(config: EngineConfig, source: S) -> Self {
        let mut graph = GraphStore::new(source, config.graph.fallback_kph);
        if let Some(path) = &config.graph.cache_path {
            graph = graph.with_cache_path(path.clone());
        }
        let model = match &config.model.path {
            Some(path) => ModelStore::new(path.clone()),
            None => ModelStore::in_memory(),
        };
        Self { config, graph, restricted: OnceLock::new(), model }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_store(&self) -> &ModelStore {
        &self.model
    }

    /// Load the base network and the model if that has not happened yet.
    /// A missing model is not an error.
    pub fn ensure_loaded(&self) -> ServiceResult<()> {
        self.graph()?;
        let has_model = self.model.current().is_some();
        debug!(has_model, "engine ready");
        Ok(())
    }

    /// The shared base network.
    pub fn graph(&self) -> ServiceResult<Arc<RoadNetwork>> {
        self.graph.load().map_err(|e| ServiceError::at(Stage::LoadGraph, e))
    }

    /// The base network with every edge whose midpoint lies inside a
    /// disruption zone removed.  Derived on first use and cached.
    pub fn restricted_graph(&self) -> ServiceResult<Arc<RoadNetwork>> {
        if let Some(net) = self.restricted.get() {
            return Ok(Arc::clone(net));
        }
        let base = self.graph()?;
        let derived = Arc::new(restrict_zones(&base, &self.config.disruption_zones()));
        info!(
            nodes = derived.node_count(),
            edges = derived.edge_count(),
            "restricted network derived"
        );
        Ok(Arc::clone(self.restricted.get_or_init(|| derived)))
    }

    /// Closed tour through the request's waypoints with a corrected time.
    ///
    /// The day flag comes from the request, or from the calendar when the
    /// request has none.
    pub fn find_route(&self, request: &RouteRequest) -> ServiceResult<RouteResponse> {
        let started = Instant::now();
        let (points, day) = request.validate()?;
        let day = day.unwrap_or_else(|| self.today());

        let graph = self.graph()?;
        let route = rt_tour::find_route(&graph, &points)?;
        let prediction = self.predict_features(&Features::new(route.distance_m, route.time_s, day));

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        info!(
            waypoints = points.len(),
            distance_m = route.distance_m,
            predicted_min = prediction.minutes,
            %day,
            elapsed_ms,
            "route request"
        );
        Ok(RouteResponse::new(&route, day, &prediction, elapsed_ms))
    }

    pub fn predict(&self, request: &PredictionRequest) -> ServiceResult<PredictionResponse> {
        let features = request.to_features()?;
        Ok(self.predict_features(&features).into())
    }

    fn predict_features(&self, features: &Features) -> Prediction {
        let model = self.model.current();
        predict_or_fallback(model.as_deref(), features)
    }

    /// Run the offline pipeline and publish the new model:
    /// base network → restricted network → simulated dataset → (CSV) →
    /// forest → model file → zone GeoJSON.
    ///
    /// Route requests keep using the previous model until the swap.
    pub fn retrain(&self) -> ServiceResult<RetrainReport> {
        let started = Instant::now();
        let cfg = &self.config;
        info!(zones = cfg.zones.points.len(), buffer_m = cfg.zones.buffer_m, "retraining");

        let base = self.graph()?;
        let restricted = self.restricted_graph()?;
        if restricted.edge_count() == 0 {
            return Err(ServiceError::at(
                Stage::Restrict,
                ServiceError::Config("every road lies inside a disruption zone".into()),
            ));
        }

        let mut rng = SimRng::new(cfg.simulation.seed);
        let sim = cfg.simulator().map_err(|e| ServiceError::at(Stage::Simulate, e))?;
        let report = sim
            .simulate(&base, &restricted, cfg.sample_center(), &mut rng.child(SIMULATION_STREAM))
            .map_err(|e| ServiceError::at(Stage::Simulate, e))?;

        if let Some(path) = &cfg.simulation.dataset_path {
            write_examples(path, &report.examples).map_err(|e| ServiceError::at(Stage::WriteDataset, e))?;
        }

        let model = TimeCorrectionModel::train(&report.examples, cfg.forest_params(), &mut rng.child(TRAINING_STREAM))
            .map_err(|e| ServiceError::at(Stage::Train, e))?;
        let trees = model.forest().n_trees();
        self.model.persist(model).map_err(|e| ServiceError::at(Stage::PersistModel, e))?;

        if let Some(path) = &cfg.zones.geojson_path {
            self.export_zones_geojson(path)
                .map_err(|e| ServiceError::at(Stage::ExportZones, e))?;
        }

        let retrain = RetrainReport {
            base_nodes: base.node_count(),
            base_edges: base.edge_count(),
            restricted_nodes: restricted.node_count(),
            restricted_edges: restricted.edge_count(),
            examples: report.examples.len(),
            disruption_examples: report.disruption_count(),
            attempts: report.attempts,
            trees,
            model_path: cfg.model.path.clone(),
            dataset_path: cfg.simulation.dataset_path.clone(),
            zones_path: cfg.zones.geojson_path.clone(),
            elapsed_ms: started.elapsed().as_secs_f64() * 1_000.0,
        };
        info!(
            examples = retrain.examples,
            disruption_examples = retrain.disruption_examples,
            trees,
            elapsed_ms = retrain.elapsed_ms,
            "retrain finished"
        );
        Ok(retrain)
    }

    /// Write the configured zones as a GeoJSON FeatureCollection.
    pub fn export_zones_geojson(&self, path: &Path) -> ServiceResult<()> {
        write_zones_geojson(path, &self.config.zones.points)
    }

    /// Day kind the calendar assigns to today.
    pub fn today(&self) -> DayKind {
        self.config.calendar().today()
    }
}

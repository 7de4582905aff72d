//! Request and response payloads.
//!
//! Field names follow the JSON the delivery front-end already speaks.
//! Every reported number is rounded to two decimals.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use rt_core::{DayKind, GeoPoint};
use rt_model::{Features, Prediction, PredictionSource};
use rt_tour::Route;

use crate::{ServiceError, ServiceResult};

/// Round half away from zero to two decimals.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn day_from_flag(field: &str, flag: u8) -> ServiceResult<DayKind> {
    DayKind::try_from(flag).map_err(|_| {
        ServiceError::InvalidRequest(format!("{field} must be 0 or 1, got {flag}"))
    })
}

// ── Route ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// `[lat, lon]` pairs; the first one is the depot.
    pub waypoints: Vec<[f64; 2]>,
    /// `0`/`1`.  Absent means "is today a market day".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disruption_day: Option<u8>,
}

impl RouteRequest {
    pub fn new(waypoints: Vec<[f64; 2]>) -> Self {
        Self { waypoints, disruption_day: None }
    }

    pub fn with_day(mut self, day: DayKind) -> Self {
        self.disruption_day = Some(day.flag());
        self
    }

    /// Waypoints as points, and the explicit day if one was given.
    pub fn validate(&self) -> ServiceResult<(Vec<GeoPoint>, Option<DayKind>)> {
        if self.waypoints.len() < 2 {
            return Err(ServiceError::InvalidRequest(format!(
                "at least 2 waypoints are required, got {}",
                self.waypoints.len()
            )));
        }
        let points: Vec<GeoPoint> = self.waypoints.iter().map(|&p| GeoPoint::from_pair(p)).collect();
        if let Some((i, p)) = points.iter().enumerate().find(|(_, p)| !p.is_valid()) {
            return Err(ServiceError::InvalidRequest(format!("waypoint {i} is not a valid coordinate: {p}")));
        }
        let day = self
            .disruption_day
            .map(|flag| day_from_flag("disruption_day", flag))
            .transpose()?;
        Ok((points, day))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    /// `[lat, lon]` of every node on the closed tour.
    pub coordinates: Vec<[f64; 2]>,
    pub distance_meters: f64,
    pub base_time_sec: f64,
    pub predicted_time_min: f64,
    pub is_disruption_day: u8,
    pub prediction_source: PredictionSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub route: RouteSummary,
    pub processing_time_ms: f64,
}

impl RouteResponse {
    pub fn new(route: &Route, day: DayKind, prediction: &Prediction, processing_time_ms: f64) -> Self {
        Self {
            route: RouteSummary {
                coordinates: route.points.iter().map(|p| p.to_pair()).collect(),
                distance_meters: round2(route.distance_m),
                base_time_sec: round2(route.time_s),
                predicted_time_min: round2(prediction.minutes),
                is_disruption_day: day.flag(),
                prediction_source: prediction.source,
            },
            processing_time_ms: round2(processing_time_ms),
        }
    }
}

// ── Prediction ────────────────────────────────────────────────────────────────

/// Fields are optional on the wire so that a missing one is reported as a
/// validation error instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub dist_m: Option<f64>,
    #[serde(default)]
    pub base_time_sec: Option<f64>,
    /// Defaults to `0`.
    #[serde(default)]
    pub is_disruption_day: Option<u8>,
}

impl PredictionRequest {
    pub fn new(dist_m: f64, base_time_sec: f64, day: DayKind) -> Self {
        Self {
            dist_m: Some(dist_m),
            base_time_sec: Some(base_time_sec),
            is_disruption_day: Some(day.flag()),
        }
    }

    pub fn to_features(&self) -> ServiceResult<Features> {
        let (Some(distance_m), Some(base_time_s)) = (self.dist_m, self.base_time_sec) else {
            return Err(ServiceError::InvalidRequest("dist_m and base_time_sec are required".into()));
        };
        let day = day_from_flag("is_disruption_day", self.is_disruption_day.unwrap_or(0))?;
        let features = Features::new(distance_m, base_time_s, day);
        features
            .validate()
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?;
        Ok(features)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_time_sec: f64,
    pub predicted_time_min: f64,
    pub source: PredictionSource,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self {
            predicted_time_sec: round2(p.seconds),
            predicted_time_min: round2(p.minutes),
            source: p.source,
        }
    }
}

// ── Retrain ───────────────────────────────────────────────────────────────────

/// Outcome of [`RoutingEngine::retrain`](crate::RoutingEngine::retrain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainReport {
    pub base_nodes: usize,
    pub base_edges: usize,
    pub restricted_nodes: usize,
    pub restricted_edges: usize,
    pub examples: usize,
    pub disruption_examples: usize,
    pub attempts: usize,
    pub trees: usize,
    pub model_path: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    pub zones_path: Option<PathBuf>,
    pub elapsed_ms: f64,
}

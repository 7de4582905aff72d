//! Prediction with graceful degradation.
//!
//! Routing never fails because of the model: without one, or when it
//! rejects its input, the uncorrected base time is reported instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::features::Features;
use crate::model::TimeCorrectionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    /// Base time, uncorrected.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub seconds: f64,
    pub minutes: f64,
    pub source:  PredictionSource,
}

impl Prediction {
    pub fn from_seconds(seconds: f64, source: PredictionSource) -> Self {
        Self { seconds, minutes: seconds / 60.0, source }
    }

    pub fn fallback(base_time_s: f64) -> Self {
        Self::from_seconds(base_time_s, PredictionSource::Fallback)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == PredictionSource::Fallback
    }
}

/// Model prediction for `features`, or the base time when `model` is
/// `None` or inference fails.
pub fn predict_or_fallback(model: Option<&TimeCorrectionModel>, features: &Features) -> Prediction {
    let Some(model) = model else {
        debug!("no model loaded, using base time");
        return Prediction::fallback(features.base_time_s);
    };
    match model.predict(features) {
        Ok(seconds) => Prediction::from_seconds(seconds, PredictionSource::Model),
        Err(e) => {
            warn!(error = %e, ?features, "model inference failed, using base time");
            Prediction::fallback(features.base_time_s)
        }
    }
}

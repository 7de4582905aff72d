//! Service-level error type.

use std::fmt;

use thiserror::Error;

use rt_model::ModelError;
use rt_sim::SimError;
use rt_spatial::SpatialError;
use rt_tour::TourError;

/// Step of the engine a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadGraph,
    Restrict,
    Simulate,
    WriteDataset,
    Train,
    PersistModel,
    ExportZones,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::LoadGraph => "loading the road network",
            Stage::Restrict => "building the restricted network",
            Stage::Simulate => "simulating the dataset",
            Stage::WriteDataset => "writing the dataset",
            Stage::Train => "training the model",
            Stage::PersistModel => "persisting the model",
            Stage::ExportZones => "exporting zones",
        })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed request; nothing was computed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage:  Stage,
        source: Box<ServiceError>,
    },

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Tour(#[from] TourError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Wrap `err` with the stage it happened in.
    pub fn at(stage: Stage, err: impl Into<ServiceError>) -> Self {
        ServiceError::Stage { stage, source: Box::new(err.into()) }
    }

    /// Stage of a [`ServiceError::Stage`], `None` otherwise.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ServiceError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// `true` for errors caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidRequest(_)
                | ServiceError::Tour(TourError::InvalidInput(_) | TourError::InvalidWaypoint { .. })
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

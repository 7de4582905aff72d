//! Spatial-subsystem error type.

use thiserror::Error;

use rt_core::{NodeId, NodeKey};

/// Errors produced by `rt-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("{0} not found in network")]
    NodeNotFound(NodeKey),

    #[error("road network is empty")]
    EmptyNetwork,

    /// A persisted network was written in an unsupported format version.
    #[error("invalid network file: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The external map source failed to produce a network.
    #[error("map source failed: {0}")]
    Source(String),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),

    #[cfg(feature = "overpass")]
    #[error("Overpass request failed: {0}")]
    Overpass(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;

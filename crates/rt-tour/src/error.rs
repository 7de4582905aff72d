//! Tour-solver error type.

use thiserror::Error;

use rt_core::{GeoPoint, NodeKey};

/// Errors produced by `rt-tour`.
#[derive(Debug, Error)]
pub enum TourError {
    /// The request itself is malformed (too few waypoints, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("waypoint {index} has invalid coordinate {point}")]
    InvalidWaypoint { index: usize, point: GeoPoint },

    #[error("road network is empty")]
    EmptyNetwork,

    /// Leg `leg` of the tour (0-based) has no path.
    #[error("leg {leg}: no path from {from} to {to}")]
    Unreachable { leg: usize, from: NodeKey, to: NodeKey },
}

pub type TourResult<T> = Result<T, TourError>;

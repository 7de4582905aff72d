//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they need it.

use thiserror::Error;

/// The error type for `rt-core` conversions and configuration checks.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid disruption-day flag {0}: expected 0 or 1")]
    InvalidDayFlag(u8),

    #[error("invalid coordinate {lat}, {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rt-core`.
pub type CoreResult<T> = Result<T, CoreError>;

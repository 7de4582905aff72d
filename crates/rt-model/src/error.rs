use thiserror::Error;

/// Errors from training, inference and model persistence.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot train on an empty dataset")]
    EmptyTrainingSet,

    #[error("invalid feature {name}: {value}")]
    InvalidFeature { name: &'static str, value: f64 },

    #[error("invalid label at row {row}: {value}")]
    InvalidLabel { row: usize, value: f64 },

    #[error("invalid forest parameters: {0}")]
    InvalidParams(String),

    #[error("model produced a non-finite prediction ({0})")]
    NonFinitePrediction(f64),

    #[error("unsupported model file: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;

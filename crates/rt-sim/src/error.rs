use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    /// Fewer than two candidate nodes were available for sampling.
    #[error("need at least 2 sample nodes, network offers {available}")]
    NotEnoughNodes { available: usize },

    #[error("dataset CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;

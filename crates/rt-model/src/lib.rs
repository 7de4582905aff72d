//! `rt-model` — travel-time correction.
//!
//! A random-forest regressor maps `(distance, base time, disruption flag)`
//! to the real travel time observed in the simulated dataset.
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`features`] | `Features`, the model's input vector                  |
//! | [`forest`]   | `RandomForest`, `RegressionTree`, `ForestParams`       |
//! | [`model`]    | `TimeCorrectionModel`: train, predict, save, load     |
//! | [`store`]    | `ModelStore`: lazy load, atomic replace               |
//! | [`predict`]  | `predict_or_fallback`, `Prediction`                   |
//! | [`error`]    | `ModelError`, `ModelResult`                           |

pub mod error;
pub mod features;
pub mod forest;
pub mod model;
pub mod predict;
pub mod store;


pub use error::{ModelError, ModelResult};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, Features, Row};
pub use forest::{ForestParams, RandomForest, RegressionTree};
pub use model::{MODEL_FORMAT_VERSION, TimeCorrectionModel};
pub use predict::{Prediction, PredictionSource, predict_or_fallback};
pub use store::ModelStore;

//! The trained travel-time correction model and its JSON file format.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use rt_core::SimRng;
use rt_sim::TrainingExample;

use crate::features::{FEATURE_NAMES, Features, Row};
use crate::forest::{ForestParams, RandomForest};
use crate::{ModelError, ModelResult};

/// Bump when the serialized layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Random-forest regression from [`Features`] to real travel seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCorrectionModel {
    version:       u32,
    features:      Vec<String>,
    training_rows: usize,
    forest:        RandomForest,
}

impl TimeCorrectionModel {
    /// Fit on simulated examples, labelled by `real_time_s`.
    ///
    /// # Errors
    ///
    /// [`ModelError::EmptyTrainingSet`] for no examples,
    /// [`ModelError::InvalidFeature`] / [`ModelError::InvalidLabel`] for a
    /// negative or non-finite value, [`ModelError::InvalidParams`] for bad
    /// forest parameters.
    pub fn train(examples: &[TrainingExample], params: ForestParams, rng: &mut SimRng) -> ModelResult<Self> {
        if examples.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let mut rows: Vec<Row> = Vec::with_capacity(examples.len());
        let mut labels = Vec::with_capacity(examples.len());
        for (row, example) in examples.iter().enumerate() {
            let features = Features::from_example(example);
            features.validate()?;
            if !(example.real_time_s.is_finite() && example.real_time_s >= 0.0) {
                return Err(ModelError::InvalidLabel { row, value: example.real_time_s });
            }
            rows.push(features.to_array());
            labels.push(example.real_time_s);
        }

        let forest = RandomForest::fit(&rows, &labels, params, rng)?;
        info!(rows = rows.len(), trees = forest.n_trees(), "trained time-correction model");

        Ok(Self {
            version: MODEL_FORMAT_VERSION,
            features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            training_rows: rows.len(),
            forest,
        })
    }

    /// Predicted real travel time in seconds.
    pub fn predict(&self, features: &Features) -> ModelResult<f64> {
        features.validate()?;
        let seconds = self.forest.predict(&features.to_array());
        if seconds.is_finite() {
            Ok(seconds)
        } else {
            Err(ModelError::NonFinitePrediction(seconds))
        }
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Write the model as JSON, through a sibling temporary file.
    pub fn save(&self, path: &Path) -> ModelResult<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), trees = self.forest.n_trees(), "saved model");
        Ok(())
    }

    /// Read a model written by [`save`](Self::save).
    ///
    /// A different format version, feature layout or a structurally broken
    /// forest is a [`ModelError::Format`].
    pub fn load(path: &Path) -> ModelResult<Self> {
        let model: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;

        if model.version != MODEL_FORMAT_VERSION {
            return Err(ModelError::Format(format!(
                "version {} (expected {MODEL_FORMAT_VERSION})",
                model.version
            )));
        }
        if !model.features.iter().map(String::as_str).eq(FEATURE_NAMES) {
            return Err(ModelError::Format(format!("features {:?}", model.features)));
        }
        if !model.forest.is_well_formed() {
            return Err(ModelError::Format("malformed forest".into()));
        }
        Ok(model)
    }
}

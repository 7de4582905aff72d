//! Shared handle to the current model.
//!
//! The model file is read at most once, on the first [`ModelStore::current`]
//! call.  Retraining publishes a new model with [`ModelStore::replace`],
//! which swaps an `Arc` under a short write lock: readers holding the old
//! model keep it until they drop it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once, PoisonError, RwLock};

use tracing::{info, warn};

use crate::model::TimeCorrectionModel;
use crate::{ModelError, ModelResult};

pub struct ModelStore {
    path:    Option<PathBuf>,
    load:    Once,
    current: RwLock<Option<Arc<TimeCorrectionModel>>>,
}

impl ModelStore {
    /// Store backed by the model file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:    Some(path.into()),
            load:    Once::new(),
            current: RwLock::new(None),
        }
    }

    /// Store with no file; it holds whatever is [`replace`](Self::replace)d.
    pub fn in_memory() -> Self {
        Self {
            path:    None,
            load:    Once::new(),
            current: RwLock::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The current model, loading the file on first use.  `None` if there
    /// is no usable model; the load is not retried.
    pub fn current(&self) -> Option<Arc<TimeCorrectionModel>> {
        self.load.call_once(|| self.load_file());
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Publish `model` to every later [`current`](Self::current) call.
    pub fn replace(&self, model: TimeCorrectionModel) -> Arc<TimeCorrectionModel> {
        // A pending lazy load must not overwrite a freshly trained model.
        self.load.call_once(|| {});
        let model = Arc::new(model);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&model));
        model
    }

    /// Save `model` to the store's file (if any), then publish it.  On a
    /// save failure the previous model stays current.
    pub fn persist(&self, model: TimeCorrectionModel) -> ModelResult<Arc<TimeCorrectionModel>> {
        if let Some(path) = &self.path {
            model.save(path)?;
            info!(path = %path.display(), "persisted model");
        }
        Ok(self.replace(model))
    }

    fn load_file(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match TimeCorrectionModel::load(path) {
            Ok(model) => {
                info!(path = %path.display(), trees = model.forest().n_trees(), "loaded model");
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(model));
            }
            Err(ModelError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no trained model, predictions use base time");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "model unusable, predictions use base time"),
        }
    }
}

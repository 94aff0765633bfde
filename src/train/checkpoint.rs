//! Model snapshots
//!
//! The best and most recent epoch snapshots are kept as plain parameter dumps
//! and written as JSON under the run's output directory (`model_last.json`,
//! `model_best.json`).

use super::error::TrainError;
use crate::metrics::Metric;
use crate::model::TextCnn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A saved model state tied to the epoch and metric value that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub val_metric: Metric,
    pub value: f32,
    params: Vec<Vec<f32>>,
}

impl Checkpoint {
    /// Snapshot the model after an epoch.
    pub fn capture(model: &TextCnn, epoch: usize, val_metric: Metric, value: f32) -> Self {
        Self { epoch, val_metric, value, params: model.export_params() }
    }

    /// Write the snapshot's parameters back into the model.
    pub fn restore(&self, model: &mut TextCnn) {
        model.import_params(&self.params);
    }

    /// Serialize to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), TrainError> {
        let json = serde_json::to_string(self)
            .map_err(|e| TrainError::Serialization(e.to_string()))?;
        fs::write(path, json)
            .map_err(|source| TrainError::Io { path: path.to_path_buf(), source })
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, TrainError> {
        let json = fs::read_to_string(path)
            .map_err(|source| TrainError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&json).map_err(|e| TrainError::Serialization(e.to_string()))
    }
}

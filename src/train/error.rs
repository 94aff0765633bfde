//! Training error types

use std::path::PathBuf;

/// Training errors
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// A non-finite loss aborts the run rather than training on corrupted
    /// state; never retried.
    #[error("non-finite loss {loss} at epoch {epoch}, batch {batch}; aborting run")]
    Divergence { epoch: usize, batch: usize, loss: f32 },

    /// The optimizer selection and its hyperparameters do not combine.
    #[error("unsupported optimizer configuration: {0}")]
    UnsupportedOptimizer(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

//! Top-level error type aggregating the per-module taxonomies.
//!
//! Configuration and resource errors are detected eagerly before training
//! starts and surfaced unmodified; nothing here is retried.

use crate::config::ConfigError;
use crate::data::DataError;
use crate::metrics::MetricError;
use crate::train::TrainError;

/// Result type alias for etiquetar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Any fatal pipeline error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Configuration error types
//!
//! Every way a raw configuration can be rejected, named after the violated
//! rule. All of these are produced before any dataset I/O happens.

use std::path::PathBuf;

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The schema is closed; keys outside it are rejected, not ignored.
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),

    /// A required key with no documented default was absent.
    #[error("missing required configuration key `{0}`")]
    MissingKey(String),

    /// A value did not match the declared type of its key.
    #[error("invalid configuration value: {0}")]
    InvalidType(String),

    /// A metric name did not match any recognized ranking metric pattern.
    #[error("unrecognized metric name `{0}` (expected P@k, R@k, or nDCG@k)")]
    UnknownMetric(String),

    /// A well-typed value fell outside its documented range.
    #[error("invalid value for `{field}`: {message}")]
    OutOfRange { field: &'static str, message: String },

    /// Cross-field constraint: `val_metric` must be monitored.
    #[error("`val_metric` ({val_metric}) must be a member of `monitor_metrics` [{monitor_metrics}]")]
    CrossField { val_metric: String, monitor_metrics: String },

    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

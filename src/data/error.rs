//! Data pipeline error types

use std::path::PathBuf;

/// Data pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("dataset not found: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("embedding source not found: {path}")]
    EmbeddingNotFound { path: PathBuf },

    #[error("malformed embedding source {path}: {message}")]
    MalformedEmbedding { path: PathBuf, message: String },

    #[error("degenerate dev split: {message}")]
    EmptySplit { message: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

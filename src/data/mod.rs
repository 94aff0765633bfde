//! Data pipeline
//!
//! Turns the configured dataset into model-ready inputs: raw example loading,
//! seeded train/dev splitting, frequency-filtered vocabulary construction,
//! sequence truncation/padding, embedding-matrix resolution, and
//! worker-parallel batch encoding with deterministic ordering.

mod dataset;
mod embedding;
mod error;
mod loader;
mod vocab;

pub use dataset::{load_dataset, split_dev, Dataset, Example, LabelSet};
pub use embedding::{load_embedding, random_embedding};
pub use error::DataError;
pub use loader::{encode_batch, stream_batches, Batch, BatchStream, LoaderConfig};
pub use vocab::{Vocabulary, PAD, UNK};

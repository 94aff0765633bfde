//! Declarative training configuration
//!
//! The configuration is a flat YAML document with a closed schema: every
//! recognized key is a struct field with a documented default, unknown keys
//! are rejected, and cross-field constraints are checked after all individual
//! fields pass. Validation performs no I/O; dataset and embedding existence
//! is the data pipeline's concern.

mod error;
mod loader;
mod schema;
mod validate;

pub use error::ConfigError;
pub use loader::{load_config, parse_config, to_yaml};
pub use schema::{ModelKind, OptimizerKind, TrainSpec};
pub use validate::validate_config;

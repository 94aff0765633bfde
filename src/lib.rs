//! Etiquetar: multi-label text classification training pipeline
//!
//! A declarative, YAML-driven pipeline for training convolutional text
//! classifiers over word embeddings (XML-CNN style) on multi-label topic
//! corpora such as RCV1. The crate provides:
//! - A closed, strongly-typed configuration schema with semantic defaults
//!   and cross-field validation
//! - A deterministic data pipeline: seeded train/dev split, frequency-filtered
//!   vocabulary, sequence truncation/padding, optional pretrained embeddings
//! - A sequential epoch trainer with patience-based early stopping and
//!   divergence detection
//! - Multi-label ranking metrics (P@k, R@k, nDCG@k) with deterministic
//!   tie-breaking
//!
//! # Example
//!
//! ```no_run
//! use etiquetar::config::load_config;
//! use etiquetar::pipeline;
//!
//! let spec = load_config("config.yml")?;
//! let report = pipeline::run(&spec)?;
//! println!("finished in phase {:?} after {} epochs", report.phase, report.history.len());
//! # Ok::<(), etiquetar::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod pipeline;
pub mod train;

mod seeds;

pub use config::{load_config, TrainSpec};
pub use error::{Error, Result};

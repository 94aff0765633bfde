//! Flat YAML schema for one training run
//!
//! One struct field per recognized key. Keys with documented defaults carry a
//! `#[serde(default)]`; the remaining keys (`data_dir`, `data_name`,
//! `monitor_metrics`, `val_metric`) are required. `deny_unknown_fields` keeps
//! the schema closed.

use crate::metrics::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Gradient-update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam => write!(f, "adam"),
            OptimizerKind::Sgd => write!(f, "sgd"),
        }
    }
}

/// Model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    #[default]
    Cnn,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Cnn => write!(f, "cnn"),
        }
    }
}

/// Complete, validated parameter set for one training run.
///
/// Constructed once at process start and immutable afterwards; the data
/// pipeline and trainer only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainSpec {
    /// Root directory holding datasets
    pub data_dir: PathBuf,

    /// Dataset name; examples live in `<data_dir>/<data_name>/{train,test}.txt`
    pub data_name: String,

    /// Fraction of the training pool held out for validation, in (0, 1)
    #[serde(default = "default_dev_size")]
    pub dev_size: f32,

    /// Tokens below this training-split frequency map to the UNK index
    #[serde(default = "default_min_vocab_freq")]
    pub min_vocab_freq: usize,

    /// Sequences are truncated/padded to exactly this many tokens
    #[serde(default = "default_max_seq_length")]
    pub max_seq_length: usize,

    /// Seed for every stochastic component of the run
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Upper bound on training epochs
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Training batch size
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Evaluation batch size
    #[serde(default = "default_eval_batch_size")]
    pub eval_batch_size: usize,

    /// Gradient-update rule
    #[serde(default)]
    pub optimizer: OptimizerKind,

    /// Optimizer step size
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    /// L2 regularization coefficient
    #[serde(default)]
    pub weight_decay: f32,

    /// SGD momentum (must stay 0 for adam)
    #[serde(default)]
    pub momentum: f32,

    /// Non-improving evaluation epochs tolerated before early stop
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Ranking metrics computed on each dev evaluation, in report order
    pub monitor_metrics: Vec<Metric>,

    /// The monitored metric that drives early stopping and best-checkpoint
    /// selection; must be a member of `monitor_metrics`
    pub val_metric: Metric,

    /// Model variant
    #[serde(default)]
    pub model_name: ModelKind,

    /// Output channels per convolution filter
    #[serde(default = "default_num_filter_map")]
    pub num_filter_map: usize,

    /// Number of distinct convolution kernel widths
    #[serde(default = "default_filter_size")]
    pub filter_size: usize,

    /// Dropout rate on the embedded sequence, in [0, 1)
    #[serde(default = "default_dropout")]
    pub dropout: f32,

    /// Pretrained embedding file; absent means train embeddings from scratch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_file: Option<String>,

    /// Embedding dimension when no `embed_file` is given (with a file, the
    /// file's vector length wins)
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,

    /// Worker threads encoding batches; 0 encodes inline on the caller
    #[serde(default = "default_data_workers")]
    pub data_workers: usize,

    /// Progress-log cadence, in batches
    #[serde(default = "default_display_iter")]
    pub display_iter: usize,

    /// Output root for checkpoints and metric logs
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Run directory under `result_dir`; defaults to `<data_name>_<model_name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
}

impl TrainSpec {
    /// Effective run name.
    pub fn resolved_run_name(&self) -> String {
        self.run_name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.data_name, self.model_name))
    }

    /// Directory where this run's checkpoints and logs land.
    pub fn output_dir(&self) -> PathBuf {
        self.result_dir.join(self.resolved_run_name())
    }

    /// Convolution kernel widths: the consecutive run starting at 2.
    pub fn kernel_widths(&self) -> Vec<usize> {
        (0..self.filter_size).map(|i| i + 2).collect()
    }
}

fn default_dev_size() -> f32 {
    0.2
}

fn default_min_vocab_freq() -> usize {
    1
}

fn default_max_seq_length() -> usize {
    500
}

fn default_seed() -> u64 {
    1337
}

fn default_epochs() -> usize {
    50
}

fn default_batch_size() -> usize {
    16
}

fn default_eval_batch_size() -> usize {
    256
}

fn default_learning_rate() -> f32 {
    0.001
}

fn default_patience() -> usize {
    5
}

fn default_num_filter_map() -> usize {
    128
}

fn default_filter_size() -> usize {
    4
}

fn default_dropout() -> f32 {
    0.2
}

fn default_embed_dim() -> usize {
    300
}

fn default_data_workers() -> usize {
    1
}

fn default_display_iter() -> usize {
    100
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("runs")
}

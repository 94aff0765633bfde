//! Multi-label ranking metrics
//!
//! Metric names from the configuration (`P@5`, `R@10`, `nDCG@5`) parse into
//! typed descriptors so that `val_metric` membership checks and metric
//! computation share one vocabulary instead of comparing raw strings.

mod evaluator;
mod metric;

pub use evaluator::{MetricAccumulator, MetricReport};
pub use metric::{Metric, MetricError};

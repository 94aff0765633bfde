//! Per-epoch history and the final training report

use super::state::TrainPhase;
use crate::metrics::{Metric, MetricReport};
use serde::{Deserialize, Serialize};

/// One monitored metric value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub metric: Metric,
    pub value: f32,
}

/// What one epoch produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f32,
    /// Dev-set values in `monitor_metrics` order
    pub dev: Vec<MetricValue>,
}

impl EpochRecord {
    pub fn dev_value(&self, metric: Metric) -> Option<f32> {
        self.dev.iter().find(|mv| mv.metric == metric).map(|mv| mv.value)
    }
}

/// Outcome of a training run: terminal phase, best epoch, full history, and
/// (when the pipeline ran it) the test-set evaluation of the best checkpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainReport {
    pub phase: TrainPhase,
    pub best_epoch: Option<usize>,
    pub best_value: Option<f32>,
    pub history: Vec<EpochRecord>,
    pub test: Option<Vec<MetricValue>>,
}

pub(crate) fn metric_values(report: &MetricReport) -> Vec<MetricValue> {
    report.values().iter().map(|&(metric, value)| MetricValue { metric, value }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_value_lookup() {
        let record = EpochRecord {
            epoch: 1,
            train_loss: 0.5,
            dev: vec![
                MetricValue { metric: Metric::PrecisionAt(1), value: 0.9 },
                MetricValue { metric: Metric::PrecisionAt(5), value: 0.7 },
            ],
        };
        assert_eq!(record.dev_value(Metric::PrecisionAt(5)), Some(0.7));
        assert_eq!(record.dev_value(Metric::RecallAt(5)), None);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = TrainReport {
            phase: TrainPhase::EarlyStopped,
            best_epoch: Some(3),
            best_value: Some(0.91),
            history: vec![EpochRecord {
                epoch: 1,
                train_loss: 0.42,
                dev: vec![MetricValue { metric: Metric::PrecisionAt(1), value: 0.8 }],
            }],
            test: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"EarlyStopped\""));
        assert!(json.contains("\"P@1\""));

        let back: TrainReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.history, report.history);
    }
}

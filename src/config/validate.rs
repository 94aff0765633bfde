//! Configuration validation logic
//!
//! Range and enum checks per field, then cross-field constraints. Runs only
//! after deserialization has already enforced types and the closed key set,
//! and performs no I/O.

use super::error::ConfigError;
use super::schema::TrainSpec;

/// Validate a training specification.
///
/// Checks, in order:
/// - numeric values are in their documented ranges
/// - `monitor_metrics` is a non-empty ordered set (no duplicates)
/// - cross-field: `val_metric` is a member of `monitor_metrics`
pub fn validate_config(spec: &TrainSpec) -> Result<(), ConfigError> {
    if !(spec.dev_size > 0.0 && spec.dev_size < 1.0) {
        return Err(out_of_range("dev_size", format!("{} (must be in (0, 1))", spec.dev_size)));
    }

    if spec.min_vocab_freq == 0 {
        return Err(out_of_range("min_vocab_freq", "0 (must be >= 1)".into()));
    }

    for (field, value) in [
        ("max_seq_length", spec.max_seq_length),
        ("epochs", spec.epochs),
        ("batch_size", spec.batch_size),
        ("eval_batch_size", spec.eval_batch_size),
        ("num_filter_map", spec.num_filter_map),
        ("filter_size", spec.filter_size),
        ("embed_dim", spec.embed_dim),
        ("display_iter", spec.display_iter),
    ] {
        if value == 0 {
            return Err(out_of_range(field, "0 (must be >= 1)".into()));
        }
    }

    if !(spec.learning_rate > 0.0 && spec.learning_rate.is_finite()) {
        return Err(out_of_range(
            "learning_rate",
            format!("{} (must be > 0)", spec.learning_rate),
        ));
    }

    if !(spec.weight_decay >= 0.0 && spec.weight_decay.is_finite()) {
        return Err(out_of_range(
            "weight_decay",
            format!("{} (must be >= 0)", spec.weight_decay),
        ));
    }

    if !(spec.momentum >= 0.0 && spec.momentum.is_finite()) {
        return Err(out_of_range("momentum", format!("{} (must be >= 0)", spec.momentum)));
    }

    if !(spec.dropout >= 0.0 && spec.dropout < 1.0) {
        return Err(out_of_range("dropout", format!("{} (must be in [0, 1))", spec.dropout)));
    }

    if spec.monitor_metrics.is_empty() {
        return Err(out_of_range("monitor_metrics", "empty list (at least one metric)".into()));
    }

    for (i, metric) in spec.monitor_metrics.iter().enumerate() {
        if spec.monitor_metrics[..i].contains(metric) {
            return Err(out_of_range(
                "monitor_metrics",
                format!("duplicate metric `{metric}` (it is an ordered set)"),
            ));
        }
    }

    // Cross-field constraint runs only once every individual field passed.
    if !spec.monitor_metrics.contains(&spec.val_metric) {
        let monitored: Vec<String> =
            spec.monitor_metrics.iter().map(ToString::to_string).collect();
        return Err(ConfigError::CrossField {
            val_metric: spec.val_metric.to_string(),
            monitor_metrics: monitored.join(", "),
        });
    }

    Ok(())
}

fn out_of_range(field: &'static str, message: String) -> ConfigError {
    ConfigError::OutOfRange { field, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metric;

    pub fn valid_spec() -> TrainSpec {
        serde_yaml::from_str(
            r"
data_dir: data
data_name: rcv1
monitor_metrics: [P@1, P@3, P@5]
val_metric: P@5
",
        )
        .unwrap()
    }

    #[test]
    fn test_valid_spec_passes() {
        assert!(validate_config(&valid_spec()).is_ok());
    }

    #[test]
    fn test_dev_size_bounds() {
        for bad in [0.0, 1.0, -0.3, 1.5] {
            let mut spec = valid_spec();
            spec.dev_size = bad;
            let err = validate_config(&spec).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { field: "dev_size", .. }));
        }
    }

    #[test]
    fn test_zero_counts_rejected() {
        for field in ["min_vocab_freq", "max_seq_length", "epochs", "batch_size", "eval_batch_size"]
        {
            let mut spec = valid_spec();
            match field {
                "min_vocab_freq" => spec.min_vocab_freq = 0,
                "max_seq_length" => spec.max_seq_length = 0,
                "epochs" => spec.epochs = 0,
                "batch_size" => spec.batch_size = 0,
                _ => spec.eval_batch_size = 0,
            }
            let err = validate_config(&spec).unwrap_err();
            assert!(matches!(err, ConfigError::OutOfRange { field: f, .. } if f == field));
        }
    }

    #[test]
    fn test_learning_rate_must_be_positive() {
        let mut spec = valid_spec();
        spec.learning_rate = 0.0;
        assert!(matches!(
            validate_config(&spec).unwrap_err(),
            ConfigError::OutOfRange { field: "learning_rate", .. }
        ));

        spec.learning_rate = f32::NAN;
        assert!(validate_config(&spec).is_err());
    }

    #[test]
    fn test_weight_decay_must_be_non_negative() {
        let mut spec = valid_spec();
        spec.weight_decay = -0.01;
        assert!(matches!(
            validate_config(&spec).unwrap_err(),
            ConfigError::OutOfRange { field: "weight_decay", .. }
        ));
    }

    #[test]
    fn test_dropout_bounds() {
        let mut spec = valid_spec();
        spec.dropout = 1.0;
        assert!(validate_config(&spec).is_err());
        spec.dropout = 0.0;
        assert!(validate_config(&spec).is_ok());
    }

    #[test]
    fn test_empty_monitor_metrics_rejected() {
        let mut spec = valid_spec();
        spec.monitor_metrics.clear();
        assert!(matches!(
            validate_config(&spec).unwrap_err(),
            ConfigError::OutOfRange { field: "monitor_metrics", .. }
        ));
    }

    #[test]
    fn test_duplicate_monitor_metrics_rejected() {
        let mut spec = valid_spec();
        spec.monitor_metrics.push(Metric::PrecisionAt(1));
        assert!(matches!(
            validate_config(&spec).unwrap_err(),
            ConfigError::OutOfRange { field: "monitor_metrics", .. }
        ));
    }

    #[test]
    fn test_val_metric_must_be_monitored() {
        let mut spec = valid_spec();
        spec.monitor_metrics = vec![Metric::PrecisionAt(3), Metric::PrecisionAt(5)];
        spec.val_metric = Metric::PrecisionAt(1);
        let err = validate_config(&spec).unwrap_err();
        match err {
            ConfigError::CrossField { val_metric, monitor_metrics } => {
                assert_eq!(val_metric, "P@1");
                assert_eq!(monitor_metrics, "P@3, P@5");
            }
            other => panic!("expected CrossField, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_field_runs_after_field_checks() {
        // Both an out-of-range field and a cross-field violation: the field
        // error must win.
        let mut spec = valid_spec();
        spec.dev_size = 2.0;
        spec.val_metric = Metric::PrecisionAt(10);
        assert!(matches!(
            validate_config(&spec).unwrap_err(),
            ConfigError::OutOfRange { field: "dev_size", .. }
        ));
    }

    #[test]
    fn test_patience_zero_is_valid() {
        let mut spec = valid_spec();
        spec.patience = 0;
        assert!(validate_config(&spec).is_ok());
    }
}

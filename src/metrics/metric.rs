//! Typed ranking-metric descriptors

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Metric errors
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("unrecognized metric name `{0}` (expected P@k, R@k, or nDCG@k with k >= 1)")]
    Unknown(String),
}

/// A ranking metric over per-example label scores.
///
/// All metrics are averaged over the examples of a batch and take the top `k`
/// predicted labels by score, ties broken by lower label index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Precision at k: fraction of the top-k predictions that are true labels
    PrecisionAt(usize),
    /// Recall at k: fraction of the true labels found in the top-k predictions
    RecallAt(usize),
    /// Normalized discounted cumulative gain at k with binary gains
    NdcgAt(usize),
}

impl Metric {
    /// Cut-off depth `k` of the metric.
    pub fn k(&self) -> usize {
        match self {
            Metric::PrecisionAt(k) | Metric::RecallAt(k) | Metric::NdcgAt(k) => *k,
        }
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || MetricError::Unknown(s.to_string());
        let (family, depth) = s.split_once('@').ok_or_else(unknown)?;
        let k: usize = depth.parse().map_err(|_| unknown())?;
        if k == 0 {
            return Err(unknown());
        }
        match family {
            "P" => Ok(Metric::PrecisionAt(k)),
            "R" => Ok(Metric::RecallAt(k)),
            "nDCG" => Ok(Metric::NdcgAt(k)),
            _ => Err(unknown()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::PrecisionAt(k) => write!(f, "P@{k}"),
            Metric::RecallAt(k) => write!(f, "R@{k}"),
            Metric::NdcgAt(k) => write!(f, "nDCG@{k}"),
        }
    }
}

// Metrics appear in the configuration file as plain name strings.
impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

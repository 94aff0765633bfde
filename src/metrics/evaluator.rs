//! Batch accumulation of ranking metrics
//!
//! Predictions arrive as a `(batch, num_class)` score matrix together with the
//! true label indices of each example. Metrics are computed per example on the
//! score ranking and averaged over every example seen, matching the epoch-level
//! evaluation of the reference pipeline.

use super::Metric;
use ndarray::{ArrayView1, ArrayView2};
use std::fmt;

/// Accumulates metric values over successive batches of predictions.
pub struct MetricAccumulator {
    kinds: Vec<Metric>,
    sums: Vec<f64>,
    count: usize,
}

impl MetricAccumulator {
    /// Create an accumulator for the given metrics, reported in this order.
    pub fn new(kinds: &[Metric]) -> Self {
        Self { kinds: kinds.to_vec(), sums: vec![0.0; kinds.len()], count: 0 }
    }

    /// Add one batch of predictions.
    ///
    /// `scores` is `(batch, num_class)`; `label_sets` holds the sorted true
    /// label indices of each example in the same order.
    pub fn add_batch(&mut self, scores: ArrayView2<'_, f32>, label_sets: &[Vec<usize>]) {
        assert_eq!(
            scores.nrows(),
            label_sets.len(),
            "score rows and label sets must have same length"
        );

        for (row, truth) in scores.rows().into_iter().zip(label_sets) {
            let ranked = ranked_indices(row);
            for (kind, sum) in self.kinds.iter().zip(self.sums.iter_mut()) {
                *sum += f64::from(example_value(*kind, &ranked, truth));
            }
        }
        self.count += label_sets.len();
    }

    /// Number of examples seen so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Average the accumulated values into a report.
    pub fn finish(&self) -> MetricReport {
        let values = self
            .kinds
            .iter()
            .zip(&self.sums)
            .map(|(kind, sum)| {
                let avg = if self.count > 0 { sum / self.count as f64 } else { 0.0 };
                (*kind, avg as f32)
            })
            .collect();
        MetricReport { values }
    }
}

/// Metric values of one evaluation pass, in `monitor_metrics` order.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricReport {
    values: Vec<(Metric, f32)>,
}

impl MetricReport {
    /// Value of a single metric, if it was monitored.
    pub fn get(&self, kind: Metric) -> Option<f32> {
        self.values.iter().find(|(k, _)| *k == kind).map(|(_, v)| *v)
    }

    /// All values in report order.
    pub fn values(&self) -> &[(Metric, f32)] {
        &self.values
    }
}

impl fmt::Display for MetricReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{kind}: {value:.4}")?;
        }
        Ok(())
    }
}

/// Label indices sorted by descending score, ties broken by lower index.
fn ranked_indices(row: ArrayView1<'_, f32>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..row.len()).collect();
    indices.sort_by(|&a, &b| row[b].total_cmp(&row[a]).then(a.cmp(&b)));
    indices
}

fn example_value(kind: Metric, ranked: &[usize], truth: &[usize]) -> f32 {
    match kind {
        Metric::PrecisionAt(k) => precision_at(ranked, truth, k),
        Metric::RecallAt(k) => recall_at(ranked, truth, k),
        Metric::NdcgAt(k) => ndcg_at(ranked, truth, k),
    }
}

fn hits_at(ranked: &[usize], truth: &[usize], k: usize) -> usize {
    ranked
        .iter()
        .take(k)
        .filter(|label| truth.binary_search(label).is_ok())
        .count()
}

fn precision_at(ranked: &[usize], truth: &[usize], k: usize) -> f32 {
    hits_at(ranked, truth, k) as f32 / k as f32
}

fn recall_at(ranked: &[usize], truth: &[usize], k: usize) -> f32 {
    if truth.is_empty() {
        return 0.0;
    }
    hits_at(ranked, truth, k) as f32 / truth.len() as f32
}

fn ndcg_at(ranked: &[usize], truth: &[usize], k: usize) -> f32 {
    if truth.is_empty() {
        return 0.0;
    }
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, label)| truth.binary_search(label).is_ok())
        .map(|(rank, _)| 1.0 / f64::from(rank as u32 + 2).log2())
        .sum();
    let ideal: f64 = (0..truth.len().min(k))
        .map(|rank| 1.0 / f64::from(rank as u32 + 2).log2())
        .sum();
    (dcg / ideal) as f32
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every metric value lies in [0, 1].
        #[test]
        fn metric_values_are_bounded(
            scores in prop::collection::vec(0.0f32..1.0, 6),
            truth_mask in prop::collection::vec(prop::bool::ANY, 6),
            k in 1usize..8,
        ) {
            let truth: Vec<usize> =
                truth_mask.iter().enumerate().filter(|(_, t)| **t).map(|(i, _)| i).collect();
            let scores = ndarray::Array2::from_shape_vec((1, 6), scores).unwrap();

            let kinds = [Metric::PrecisionAt(k), Metric::RecallAt(k), Metric::NdcgAt(k)];
            let mut acc = MetricAccumulator::new(&kinds);
            acc.add_batch(scores.view(), &[truth]);
            for (_, value) in acc.finish().values() {
                prop_assert!((0.0..=1.0 + 1e-6).contains(value));
            }
        }

        /// Identical inputs always produce identical reports.
        #[test]
        fn evaluation_is_deterministic(
            scores in prop::collection::vec(-1.0f32..1.0, 8),
        ) {
            let scores = ndarray::Array2::from_shape_vec((2, 4), scores).unwrap();
            let truth = vec![vec![0, 2], vec![1]];
            let kinds = [Metric::PrecisionAt(2), Metric::NdcgAt(3)];

            let mut a = MetricAccumulator::new(&kinds);
            a.add_batch(scores.view(), &truth);
            let mut b = MetricAccumulator::new(&kinds);
            b.add_batch(scores.view(), &truth);
            prop_assert_eq!(a.finish(), b.finish());
        }
    }
}

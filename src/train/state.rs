//! Trainer phases and early-stopping bookkeeping

use serde::{Deserialize, Serialize};

/// The trainer's position in its lifecycle.
///
/// `Converged` is reserved for a future threshold-based stopping criterion and
/// is never entered by the current policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainPhase {
    Initialized,
    Running,
    Converged,
    EarlyStopped,
    ExhaustedEpochs,
    Terminated,
}

/// Best observed `val_metric` value and the epoch that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestEpoch {
    pub epoch: usize,
    pub value: f32,
}

/// Mutable per-run training state, owned exclusively by the Trainer.
#[derive(Clone, Debug, Default)]
pub struct TrainingState {
    /// Current epoch index (1-based once running)
    pub epoch: usize,
    /// Consecutive evaluation epochs without strict improvement
    pub epochs_without_improvement: usize,
    /// Best observed value so far
    pub best: Option<BestEpoch>,
}

impl TrainingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an epoch's `val_metric` value.
    ///
    /// Strict improvement over the best-so-far resets the no-improvement
    /// counter and returns true; anything else (ties included) increments it.
    pub fn observe(&mut self, epoch: usize, value: f32) -> bool {
        self.epoch = epoch;
        let improved = self.best.is_none_or(|best| value > best.value);
        if improved {
            self.best = Some(BestEpoch { epoch, value });
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
        improved
    }

    /// Whether the patience budget is exhausted.
    ///
    /// `patience = 0` stops at the first non-improving epoch.
    pub fn should_stop(&self, patience: usize) -> bool {
        self.epochs_without_improvement > 0 && self.epochs_without_improvement >= patience
    }
}

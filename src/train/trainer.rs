//! The epoch loop
//!
//! Strictly sequential: each epoch's optimizer steps finish before the next
//! epoch begins, which the optimizer state and the early-stopping bookkeeping
//! both rely on. Batch encoding is the only parallel part and hands batches
//! over through the ordered loader stream.

use super::checkpoint::Checkpoint;
use super::error::TrainError;
use super::result::{metric_values, EpochRecord, TrainReport};
use super::state::{TrainPhase, TrainingState};
use crate::config::{OptimizerKind, TrainSpec};
use crate::data::{stream_batches, Example, LabelSet, LoaderConfig, Vocabulary};
use crate::metrics::{MetricAccumulator, MetricReport};
use crate::model::{bce_with_logits, TextCnn};
use crate::optim::{Adam, Optimizer, Sgd};
use crate::seeds;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;

/// Orchestrates model construction, the epoch loop, dev evaluation, and the
/// early-stopping decision for one configuration.
pub struct Trainer {
    spec: TrainSpec,
    vocab: Arc<Vocabulary>,
    labels: Arc<LabelSet>,
    model: TextCnn,
    optimizer: Box<dyn Optimizer>,
    dropout_rng: StdRng,
    state: TrainingState,
    phase: TrainPhase,
    best_checkpoint: Option<Checkpoint>,
    output_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Trainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trainer")
            .field("spec", &self.spec)
            .field("vocab", &self.vocab)
            .field("labels", &self.labels)
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("best_checkpoint", &self.best_checkpoint)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl Trainer {
    /// Build the model and optimizer for a validated specification.
    ///
    /// `embedding` is the resolved `(vocab, dim)` matrix from the data
    /// pipeline; parameter initialization and dropout draw from seeds derived
    /// from `spec.seed`.
    pub fn new(
        spec: &TrainSpec,
        vocab: Arc<Vocabulary>,
        labels: Arc<LabelSet>,
        embedding: Array2<f32>,
    ) -> Result<Self, TrainError> {
        let optimizer = build_optimizer(spec)?;
        let model = TextCnn::new(
            embedding,
            labels.len(),
            spec.kernel_widths(),
            spec.num_filter_map,
            spec.dropout,
            seeds::params(spec.seed),
        );

        Ok(Self {
            spec: spec.clone(),
            vocab,
            labels,
            model,
            optimizer,
            dropout_rng: StdRng::seed_from_u64(seeds::dropout(spec.seed)),
            state: TrainingState::new(),
            phase: TrainPhase::Initialized,
            best_checkpoint: None,
            output_dir: None,
        })
    }

    /// Persist per-epoch checkpoints under `dir` (created if needed).
    pub fn set_output(&mut self, dir: PathBuf) -> Result<(), TrainError> {
        std::fs::create_dir_all(&dir)
            .map_err(|source| TrainError::Io { path: dir.clone(), source })?;
        self.output_dir = Some(dir);
        Ok(())
    }

    pub fn phase(&self) -> TrainPhase {
        self.phase
    }

    pub fn model(&self) -> &TextCnn {
        &self.model
    }

    pub fn best_checkpoint(&self) -> Option<&Checkpoint> {
        self.best_checkpoint.as_ref()
    }

    /// Run the epoch loop over the given splits.
    pub fn train(
        &mut self,
        train_split: &[Example],
        dev_split: &[Example],
    ) -> Result<TrainReport, TrainError> {
        let train_examples = Arc::new(train_split.to_vec());
        let dev_examples = Arc::new(dev_split.to_vec());
        let mut history = Vec::new();

        self.phase = TrainPhase::Running;
        println!("Start training: {} train / {} dev examples", train_split.len(), dev_split.len());

        for epoch in 1..=self.spec.epochs {
            let train_loss = self.train_epoch(&train_examples, epoch)?;
            let report = self.evaluate(&dev_examples);
            println!("Epoch {}/{}: loss={:.6}  {}", epoch, self.spec.epochs, train_loss, report);

            let value = report
                .get(self.spec.val_metric)
                .expect("val_metric is a member of monitor_metrics");

            let last = Checkpoint::capture(&self.model, epoch, self.spec.val_metric, value);
            if self.state.observe(epoch, value) {
                println!(
                    "New best {} = {:.4} at epoch {}; checkpoint recorded",
                    self.spec.val_metric, value, epoch
                );
                if let Some(dir) = &self.output_dir {
                    last.save(&dir.join("model_best.json"))?;
                }
                self.best_checkpoint = Some(last.clone());
            } else {
                let best = self.state.best.expect("observed at least one epoch");
                println!(
                    "No improvement on {} for {} epoch(s) (best {:.4} at epoch {})",
                    self.spec.val_metric,
                    self.state.epochs_without_improvement,
                    best.value,
                    best.epoch
                );
            }
            if let Some(dir) = &self.output_dir {
                last.save(&dir.join("model_last.json"))?;
            }

            history.push(EpochRecord { epoch, train_loss, dev: metric_values(&report) });

            if self.state.should_stop(self.spec.patience) {
                eprintln!(
                    "Early stopping: no improvement for {} epochs",
                    self.state.epochs_without_improvement
                );
                self.phase = TrainPhase::EarlyStopped;
                break;
            }
        }

        if self.phase == TrainPhase::Running {
            self.phase = TrainPhase::ExhaustedEpochs;
        }
        let terminal = self.phase;
        self.phase = TrainPhase::Terminated;

        Ok(TrainReport {
            phase: terminal,
            best_epoch: self.state.best.map(|b| b.epoch),
            best_value: self.state.best.map(|b| b.value),
            history,
            test: None,
        })
    }

    /// One pass of optimizer steps over the shuffled training split.
    fn train_epoch(
        &mut self,
        examples: &Arc<Vec<Example>>,
        epoch: usize,
    ) -> Result<f32, TrainError> {
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut shuffle_rng =
            StdRng::seed_from_u64(seeds::epoch_shuffle(self.spec.seed, epoch));
        order.shuffle(&mut shuffle_rng);

        let stream = stream_batches(
            Arc::clone(examples),
            Arc::new(order),
            Arc::clone(&self.vocab),
            Arc::clone(&self.labels),
            LoaderConfig {
                batch_size: self.spec.batch_size,
                max_seq_length: self.spec.max_seq_length,
                workers: self.spec.data_workers,
            },
        );
        let num_batches = stream.num_batches();

        let mut total_loss = 0.0f32;
        let mut num_seen = 0usize;
        for (step, batch) in stream.enumerate() {
            let pass = self.model.forward(&batch, Some(&mut self.dropout_rng));
            let (loss, dlogits) = bce_with_logits(&pass.logits, &batch.targets);
            if !loss.is_finite() {
                return Err(TrainError::Divergence { epoch, batch: step, loss });
            }

            self.optimizer.zero_grad(self.model.params_mut());
            self.model.backward(&pass, &dlogits);
            self.optimizer.step(self.model.params_mut());

            total_loss += loss;
            num_seen += 1;
            if (step + 1) % self.spec.display_iter == 0 {
                println!(
                    "  epoch {epoch} [{}/{num_batches}] loss={:.6}",
                    step + 1,
                    total_loss / num_seen as f32
                );
            }
        }

        Ok(safe_avg(total_loss, num_seen))
    }

    /// Evaluate the monitored metrics over a split.
    pub fn evaluate(&self, examples: &Arc<Vec<Example>>) -> MetricReport {
        let order: Vec<usize> = (0..examples.len()).collect();
        let stream = stream_batches(
            Arc::clone(examples),
            Arc::new(order),
            Arc::clone(&self.vocab),
            Arc::clone(&self.labels),
            LoaderConfig {
                batch_size: self.spec.eval_batch_size,
                max_seq_length: self.spec.max_seq_length,
                workers: self.spec.data_workers,
            },
        );

        let mut accumulator = MetricAccumulator::new(&self.spec.monitor_metrics);
        for batch in stream {
            let scores = self.model.predict(&batch);
            accumulator.add_batch(scores.view(), &batch.label_sets);
        }
        accumulator.finish()
    }

    /// Swap the best checkpoint's parameters back into the model.
    ///
    /// Returns false when no epoch ever improved (no checkpoint exists).
    pub fn restore_best(&mut self) -> bool {
        match &self.best_checkpoint {
            Some(checkpoint) => {
                checkpoint.restore(&mut self.model);
                true
            }
            None => false,
        }
    }
}

fn build_optimizer(spec: &TrainSpec) -> Result<Box<dyn Optimizer>, TrainError> {
    match spec.optimizer {
        OptimizerKind::Adam => {
            if spec.momentum != 0.0 {
                return Err(TrainError::UnsupportedOptimizer(format!(
                    "momentum ({}) is only supported with sgd",
                    spec.momentum
                )));
            }
            Ok(Box::new(Adam::default_params(spec.learning_rate, spec.weight_decay)))
        }
        OptimizerKind::Sgd => {
            Ok(Box::new(Sgd::new(spec.learning_rate, spec.momentum, spec.weight_decay)))
        }
    }
}

fn safe_avg(total: f32, count: usize) -> f32 {
    if count > 0 {
        total / count as f32
    } else {
        0.0
    }
}

//! Batch encoding with worker parallelism
//!
//! Examples are encoded into fixed-length index sequences and multi-hot label
//! targets. With `data_workers > 0`, encoding fans out across worker threads
//! that hand finished batches to the consumer through a bounded channel
//! (backpressure in both directions). Batches are tagged with their position
//! and reassembled in dispatch order, so the output sequence is identical for
//! any worker count. Workers share only read-only state.

use super::dataset::{Example, LabelSet};
use super::vocab::Vocabulary;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One encoded batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Token indices, `(batch, max_seq_length)`
    pub tokens: Array2<usize>,
    /// Multi-hot targets, `(batch, num_class)`
    pub targets: Array2<f32>,
    /// Sorted true label indices per example
    pub label_sets: Vec<Vec<usize>>,
}

impl Batch {
    /// Number of examples in the batch.
    pub fn size(&self) -> usize {
        self.tokens.nrows()
    }
}

/// Parameters of one batch-loading pass.
#[derive(Clone, Copy, Debug)]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub max_seq_length: usize,
    pub workers: usize,
}

/// Encode the examples selected by `order[range]` into one batch.
pub fn encode_batch(
    examples: &[Example],
    order: &[usize],
    vocab: &Vocabulary,
    labels: &LabelSet,
    max_seq_length: usize,
) -> Batch {
    let batch = order.len();
    let mut tokens = Array2::zeros((batch, max_seq_length));
    let mut targets = Array2::zeros((batch, labels.len()));
    let mut label_sets = Vec::with_capacity(batch);

    for (row, &index) in order.iter().enumerate() {
        let example = &examples[index];
        for (slot, id) in tokens
            .row_mut(row)
            .iter_mut()
            .zip(vocab.encode_fixed(&example.text, max_seq_length))
        {
            *slot = id;
        }

        let mut truth: Vec<usize> =
            example.labels.iter().filter_map(|name| labels.index_of(name)).collect();
        truth.sort_unstable();
        truth.dedup();
        for &class in &truth {
            targets[[row, class]] = 1.0;
        }
        label_sets.push(truth);
    }

    Batch { tokens, targets, label_sets }
}

/// Stream the examples named by `order` as batches, in order.
pub fn stream_batches(
    examples: Arc<Vec<Example>>,
    order: Arc<Vec<usize>>,
    vocab: Arc<Vocabulary>,
    labels: Arc<LabelSet>,
    config: LoaderConfig,
) -> BatchStream {
    let num_batches = order.len().div_ceil(config.batch_size);

    if config.workers == 0 || num_batches <= 1 {
        return BatchStream {
            examples,
            order,
            vocab,
            labels,
            config,
            num_batches,
            next: 0,
            rx: None,
            pending: BTreeMap::new(),
            handles: Vec::new(),
        };
    }

    let cursor = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = sync_channel(config.workers * 2);
    let handles = (0..config.workers)
        .map(|_| {
            spawn_worker(
                Arc::clone(&examples),
                Arc::clone(&order),
                Arc::clone(&vocab),
                Arc::clone(&labels),
                config,
                num_batches,
                Arc::clone(&cursor),
                tx.clone(),
            )
        })
        .collect();

    BatchStream {
        examples,
        order,
        vocab,
        labels,
        config,
        num_batches,
        next: 0,
        rx: Some(rx),
        pending: BTreeMap::new(),
        handles,
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker(
    examples: Arc<Vec<Example>>,
    order: Arc<Vec<usize>>,
    vocab: Arc<Vocabulary>,
    labels: Arc<LabelSet>,
    config: LoaderConfig,
    num_batches: usize,
    cursor: Arc<AtomicUsize>,
    tx: SyncSender<(usize, Batch)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || loop {
        let index = cursor.fetch_add(1, Ordering::SeqCst);
        if index >= num_batches {
            break;
        }
        let start = index * config.batch_size;
        let end = (start + config.batch_size).min(order.len());
        let batch =
            encode_batch(&examples, &order[start..end], &vocab, &labels, config.max_seq_length);
        // The consumer hung up; nothing left to produce for.
        if tx.send((index, batch)).is_err() {
            break;
        }
    })
}

/// Ordered iterator over encoded batches.
pub struct BatchStream {
    examples: Arc<Vec<Example>>,
    order: Arc<Vec<usize>>,
    vocab: Arc<Vocabulary>,
    labels: Arc<LabelSet>,
    config: LoaderConfig,
    num_batches: usize,
    next: usize,
    rx: Option<Receiver<(usize, Batch)>>,
    pending: BTreeMap<usize, Batch>,
    handles: Vec<JoinHandle<()>>,
}

impl BatchStream {
    /// Total number of batches this stream yields.
    pub fn num_batches(&self) -> usize {
        self.num_batches
    }

    fn encode_inline(&self, index: usize) -> Batch {
        let start = index * self.config.batch_size;
        let end = (start + self.config.batch_size).min(self.order.len());
        encode_batch(
            &self.examples,
            &self.order[start..end],
            &self.vocab,
            &self.labels,
            self.config.max_seq_length,
        )
    }
}

impl Iterator for BatchStream {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.next >= self.num_batches {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let Some(rx) = &self.rx else {
            return Some(self.encode_inline(index));
        };

        loop {
            if let Some(batch) = self.pending.remove(&index) {
                return Some(batch);
            }
            match rx.recv() {
                Ok((position, batch)) => {
                    self.pending.insert(position, batch);
                }
                // Workers are gone; fall back to inline encoding.
                Err(_) => return Some(self.encode_inline(index)),
            }
        }
    }
}

impl Drop for BatchStream {
    fn drop(&mut self) {
        // Dropping the receiver unblocks any worker parked on a full channel.
        drop(self.rx.take());
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

//! End-to-end training pipeline
//!
//! Control flow for one run: validated configuration → data pipeline (dataset,
//! split, vocabulary, embeddings) → trainer (epoch loop, early stopping) →
//! test-set evaluation of the best checkpoint → run artifacts under
//! `<result_dir>/<run_name>/` (`model_last.json`, `model_best.json`,
//! `logs.json`). The configuration is only ever read.

use crate::config::TrainSpec;
use crate::data::{self, DataError, Vocabulary};
use crate::error::{Error, Result};
use crate::seeds;
use crate::train::{metric_values, TrainError, TrainReport, Trainer};
use ndarray::Array2;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Run training and evaluation for a validated specification.
pub fn run(spec: &TrainSpec) -> Result<TrainReport> {
    let dataset = data::load_dataset(spec)?;
    println!(
        "Dataset `{}`: {} train / {} test examples, {} labels",
        spec.data_name,
        dataset.train.len(),
        dataset.test.len(),
        dataset.labels.len()
    );

    let (train_split, dev_split) =
        data::split_dev(dataset.train, spec.dev_size, seeds::split(spec.seed))?;
    println!("Split: {} train / {} dev (dev_size={})", train_split.len(), dev_split.len(), spec.dev_size);

    let vocab = Arc::new(Vocabulary::build(&train_split, spec.min_vocab_freq));
    println!("Vocabulary: {} entries (min_vocab_freq={})", vocab.len(), spec.min_vocab_freq);

    let embedding = resolve_embedding(spec, &vocab)?;
    let labels = Arc::new(dataset.labels);

    let mut trainer = Trainer::new(spec, Arc::clone(&vocab), labels, embedding)?;
    let output_dir = spec.output_dir();
    trainer.set_output(output_dir.clone())?;

    let mut report = trainer.train(&train_split, &dev_split)?;

    if trainer.restore_best() {
        let test_examples = Arc::new(dataset.test);
        let test_report = trainer.evaluate(&test_examples);
        println!("Test ({} examples): {}", test_examples.len(), test_report);
        report.test = Some(metric_values(&test_report));
    }

    let log_path = output_dir.join("logs.json");
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::Train(TrainError::Serialization(e.to_string())))?;
    fs::write(&log_path, json)?;
    println!("Run artifacts written to {}", output_dir.display());

    Ok(report)
}

/// Resolve the embedding matrix: pretrained file when configured, otherwise a
/// seeded from-scratch initialization.
fn resolve_embedding(spec: &TrainSpec, vocab: &Vocabulary) -> std::result::Result<Array2<f32>, DataError> {
    match &spec.embed_file {
        Some(file) => {
            println!("Loading pretrained embeddings from {file}");
            data::load_embedding(Path::new(file), vocab)
        }
        None => Ok(data::random_embedding(
            vocab.len(),
            spec.embed_dim,
            seeds::embedding(spec.seed),
        )),
    }
}

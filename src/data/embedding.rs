//! Embedding matrix resolution
//!
//! With `embed_file` set, the matrix comes from a line-oriented
//! `token v1 v2 ... vd` source, indexed by the Vocabulary; tokens absent from
//! the source keep zero vectors. Without it, the matrix is drawn from a seeded
//! uniform distribution. The PAD row is zero in both cases.

use super::error::DataError;
use super::vocab::{Vocabulary, PAD};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;

/// Build a vocabulary-indexed matrix from a pretrained embedding file.
pub fn load_embedding(path: &Path, vocab: &Vocabulary) -> Result<Array2<f32>, DataError> {
    if !path.is_file() {
        return Err(DataError::EmbeddingNotFound { path: path.to_path_buf() });
    }
    let text = fs::read_to_string(path)
        .map_err(|source| DataError::Io { path: path.to_path_buf(), source })?;

    let mut matrix: Option<Array2<f32>> = None;
    let mut dim = 0usize;

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let token = parts.next().unwrap_or_default();
        let vector: Result<Vec<f32>, _> = parts.map(str::parse::<f32>).collect();
        let vector = vector.map_err(|e| DataError::MalformedEmbedding {
            path: path.to_path_buf(),
            message: format!("line {}: {e}", line_no + 1),
        })?;

        if matrix.is_none() {
            if vector.is_empty() {
                return Err(DataError::MalformedEmbedding {
                    path: path.to_path_buf(),
                    message: format!("line {}: token without vector", line_no + 1),
                });
            }
            dim = vector.len();
            matrix = Some(Array2::zeros((vocab.len(), dim)));
        }
        if vector.len() != dim {
            return Err(DataError::MalformedEmbedding {
                path: path.to_path_buf(),
                message: format!(
                    "line {}: expected {} components, found {}",
                    line_no + 1,
                    dim,
                    vector.len()
                ),
            });
        }

        if let (Some(m), Some(row)) = (matrix.as_mut(), vocab_row(vocab, token)) {
            for (slot, value) in m.row_mut(row).iter_mut().zip(&vector) {
                *slot = *value;
            }
        }
    }

    matrix.ok_or_else(|| DataError::MalformedEmbedding {
        path: path.to_path_buf(),
        message: "no vector lines".to_string(),
    })
}

fn vocab_row(vocab: &Vocabulary, token: &str) -> Option<usize> {
    // PAD stays zero even if the file carries a "<pad>" entry.
    if !vocab.contains(token) {
        return None;
    }
    let row = vocab.lookup(token);
    (row != PAD).then_some(row)
}

/// Seeded from-scratch embedding matrix, uniform in (-0.25, 0.25).
pub fn random_embedding(vocab_len: usize, dim: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut matrix =
        Array2::from_shape_simple_fn((vocab_len, dim), || rng.random_range(-0.25f32..0.25));
    matrix.row_mut(PAD).fill(0.0);
    matrix
}

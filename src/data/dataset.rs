//! Raw dataset loading and the seeded train/dev split
//!
//! A dataset lives at `<data_dir>/<data_name>/{train.txt,test.txt}`. Each line
//! is `label1 label2 ...<TAB>document text`; a line without a tab is kept as
//! unlabeled text.

use super::error::DataError;
use crate::config::TrainSpec;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One raw labeled text example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    pub labels: Vec<String>,
    pub text: String,
}

/// The label space of a dataset: sorted label names with stable indices.
#[derive(Clone, Debug)]
pub struct LabelSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelSet {
    /// Collect the label space from every example, sorted lexicographically
    /// so that indices are stable across runs.
    pub fn from_examples<'a, I>(examples: I) -> Self
    where
        I: IntoIterator<Item = &'a Example>,
    {
        let mut names: Vec<String> = examples
            .into_iter()
            .flat_map(|ex| ex.labels.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Self { names, index }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A loaded dataset: the raw training pool, the held-out test split, and the
/// label space over both.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub train: Vec<Example>,
    pub test: Vec<Example>,
    pub labels: LabelSet,
}

/// Load the dataset named by `data_dir`/`data_name`.
pub fn load_dataset(spec: &TrainSpec) -> Result<Dataset, DataError> {
    let root = spec.data_dir.join(&spec.data_name);
    if !root.is_dir() {
        return Err(DataError::DatasetNotFound { path: root });
    }

    let train = read_split(&root.join("train.txt"))?;
    let test = read_split(&root.join("test.txt"))?;
    let labels = LabelSet::from_examples(train.iter().chain(test.iter()));

    Ok(Dataset { train, test, labels })
}

fn read_split(path: &Path) -> Result<Vec<Example>, DataError> {
    if !path.is_file() {
        return Err(DataError::DatasetNotFound { path: path.to_path_buf() });
    }
    let text = fs::read_to_string(path)
        .map_err(|source| DataError::Io { path: path.to_path_buf(), source })?;

    Ok(text.lines().filter(|line| !line.trim().is_empty()).map(parse_line).collect())
}

fn parse_line(line: &str) -> Example {
    match line.split_once('\t') {
        Some((labels, text)) => Example {
            labels: labels.split_whitespace().map(str::to_string).collect(),
            text: text.to_string(),
        },
        None => Example { labels: Vec::new(), text: line.to_string() },
    }
}

/// Partition the training pool into train and dev splits.
///
/// The shuffle is seeded, so identical `(pool, dev_size, seed)` inputs always
/// produce identical splits. Returns `(train, dev)`.
pub fn split_dev(
    pool: Vec<Example>,
    dev_size: f32,
    seed: u64,
) -> Result<(Vec<Example>, Vec<Example>), DataError> {
    let n = pool.len();
    let n_dev = (n as f32 * dev_size).round() as usize;
    if n_dev == 0 || n_dev >= n {
        return Err(DataError::EmptySplit {
            message: format!("dev_size {dev_size} of {n} examples leaves {n_dev} for dev"),
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let dev_indices: std::collections::HashSet<usize> = order[..n_dev].iter().copied().collect();
    let mut train = Vec::with_capacity(n - n_dev);
    let mut dev = Vec::with_capacity(n_dev);
    for (i, example) in pool.into_iter().enumerate() {
        if dev_indices.contains(&i) {
            dev.push(example);
        } else {
            train.push(example);
        }
    }
    Ok((train, dev))
}

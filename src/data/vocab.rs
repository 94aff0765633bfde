//! Frequency-filtered vocabulary
//!
//! Built once from the training split. Tokens whose training-split frequency
//! falls below `min_vocab_freq` map to the reserved UNK index; PAD fills
//! sequences to `max_seq_length`. Immutable after construction and shared
//! read-only by workers and the training loop.

use super::dataset::Example;
use std::collections::HashMap;

/// Reserved padding index (embedding row stays zero and frozen).
pub const PAD: usize = 0;
/// Reserved out-of-vocabulary index.
pub const UNK: usize = 1;

const PAD_TOKEN: &str = "<pad>";
const UNK_TOKEN: &str = "<unk>";

/// Token-to-index mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build the vocabulary from the training split.
    ///
    /// Kept tokens are ordered by descending frequency, ties by token, so the
    /// index assignment is deterministic.
    pub fn build<'a, I>(train: I, min_vocab_freq: usize) -> Self
    where
        I: IntoIterator<Item = &'a Example>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for example in train {
            for token in tokenize(&example.text) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut kept: Vec<(String, usize)> =
            counts.into_iter().filter(|(_, count)| *count >= min_vocab_freq).collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut tokens = Vec::with_capacity(kept.len() + 2);
        tokens.push(PAD_TOKEN.to_string());
        tokens.push(UNK_TOKEN.to_string());
        tokens.extend(kept.into_iter().map(|(token, _)| token));

        let index = tokens.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { tokens, index }
    }

    /// Number of entries, reserved indices included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 2
    }

    /// Index of a token; unknown tokens map to UNK.
    pub fn lookup(&self, token: &str) -> usize {
        self.index.get(token).copied().unwrap_or(UNK)
    }

    /// Whether a token survived frequency filtering.
    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn token(&self, index: usize) -> &str {
        &self.tokens[index]
    }

    /// All tokens in index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Encode a document into token indices.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        tokenize(text).map(|token| self.lookup(&token)).collect()
    }

    /// Encode to exactly `max_len` indices: keep the first `max_len` tokens
    /// (drop the tail), right-pad with PAD.
    pub fn encode_fixed(&self, text: &str, max_len: usize) -> Vec<usize> {
        let mut ids = self.encode(text);
        ids.truncate(max_len);
        ids.resize(max_len, PAD);
        ids
    }
}

/// Lowercased whitespace tokenization.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(text: &str) -> Example {
        Example { labels: vec![], text: text.to_string() }
    }

    #[test]
    fn test_min_freq_one_keeps_all_tokens() {
        let train = vec![example("the cat sat"), example("the dog ran")];
        let vocab = Vocabulary::build(&train, 1);
        for token in ["the", "cat", "sat", "dog", "ran"] {
            assert!(vocab.contains(token), "missing {token}");
        }
        // 5 distinct tokens + PAD + UNK
        assert_eq!(vocab.len(), 7);
    }

    #[test]
    fn test_frequency_filtering() {
        let train = vec![example("the the the cat cat dog")];
        let vocab = Vocabulary::build(&train, 2);
        assert!(vocab.contains("the"));
        assert!(vocab.contains("cat"));
        assert!(!vocab.contains("dog"));
        assert_eq!(vocab.lookup("dog"), UNK);
    }

    #[test]
    fn test_reserved_indices() {
        let vocab = Vocabulary::build(&[example("a b")], 1);
        assert_eq!(vocab.token(PAD), "<pad>");
        assert_eq!(vocab.token(UNK), "<unk>");
        assert_eq!(vocab.lookup("never-seen"), UNK);
    }

    #[test]
    fn test_index_order_is_frequency_then_token() {
        let train = vec![example("b b b a a c")];
        let vocab = Vocabulary::build(&train, 1);
        assert_eq!(vocab.lookup("b"), 2);
        assert_eq!(vocab.lookup("a"), 3);
        assert_eq!(vocab.lookup("c"), 4);
    }

    #[test]
    fn test_build_is_deterministic() {
        let train: Vec<Example> =
            (0..30).map(|i| example(&format!("tok{} tok{} shared", i, i % 7))).collect();
        let a = Vocabulary::build(&train, 2);
        let b = Vocabulary::build(&train, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokenize_lowercases() {
        let tokens: Vec<String> = tokenize("The  CAT\tsat").collect();
        assert_eq!(tokens, ["the", "cat", "sat"]);
    }

    #[test]
    fn test_encode_fixed_truncates_tail() {
        let vocab = Vocabulary::build(&[example("a b c d e")], 1);
        let ids = vocab.encode_fixed("a b c d e", 3);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids, vec![vocab.lookup("a"), vocab.lookup("b"), vocab.lookup("c")]);
    }

    #[test]
    fn test_encode_fixed_pads_right() {
        let vocab = Vocabulary::build(&[example("a b")], 1);
        let ids = vocab.encode_fixed("a", 4);
        assert_eq!(ids, vec![vocab.lookup("a"), PAD, PAD, PAD]);
    }
}

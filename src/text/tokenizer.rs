//! Tokenization for text processing.

use crate::config::TextConfig;
use crate::distribution::WordDist;
use crate::text::Normalizer;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Splits text into Unicode words and normalizes them.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    normalizer: Normalizer,
}

impl Tokenizer {
    /// Creates a new tokenizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config),
        }
    }

    /// Creates a tokenizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Splits text into normalized words, dropping filtered ones.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .filter_map(|word| self.normalizer.normalize_token(word))
            .collect()
    }

    /// Builds the word distribution of a document's text.
    pub fn word_dist(&self, text: &str, ignore_case: bool, stopwords: &HashSet<String>) -> WordDist {
        let mut dist = WordDist::new();
        dist.add_document(self.tokenize(text), ignore_case, stopwords);
        dist
    }
}

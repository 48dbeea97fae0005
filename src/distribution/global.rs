//! Corpus-wide vocabulary statistics used to smooth every distribution.
//!
//! Built exactly once, between the two finish phases: every training
//! distribution is folded in after [`WordDist::finish_before_global`], then
//! [`GlobalStatsBuilder::build`] produces an immutable [`GlobalStats`] that
//! each distribution receives in [`WordDist::finish_after_global`].

use crate::distribution::memo::Word;
use crate::distribution::word_dist::{DistState, WordDist};
use std::collections::HashMap;

/// Accumulates training counts before the global statistics are frozen.
#[derive(Debug, Default)]
pub struct GlobalStatsBuilder {
    counts: HashMap<Word, u64>,
    total_tokens: u64,
    num_distributions: usize,
}

impl GlobalStatsBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds in the counts of a phase-1 finished training distribution.
    ///
    /// # Panics
    ///
    /// If `dist` has not gone through `finish_before_global` yet, or has
    /// already been globally finished.
    pub fn add(&mut self, dist: &WordDist) {
        assert_eq!(
            dist.state(),
            DistState::LocallyFinished,
            "global statistics must be built from locally finished distributions"
        );
        for (word, count) in dist.iter() {
            *self.counts.entry(word).or_insert(0) += count as u64;
            self.total_tokens += count as u64;
        }
        self.num_distributions += 1;
    }

    /// Number of distributions folded in so far.
    pub fn num_distributions(&self) -> usize {
        self.num_distributions
    }

    /// Freezes the statistics.
    pub fn build(self) -> GlobalStats {
        let total_types = self.counts.len() as u64;
        let types_seen_once = self.counts.values().filter(|&&c| c == 1).count() as u64;

        // Good-Turing style: mass of words never seen at all is the mass of
        // words seen exactly once.
        let globally_unseen_word_prob = if self.total_tokens > 0 {
            types_seen_once as f64 / self.total_tokens as f64
        } else {
            0.0
        };

        let word_probs = self
            .counts
            .iter()
            .map(|(&word, &count)| {
                let p = count as f64 / self.total_tokens as f64
                    * (1.0 - globally_unseen_word_prob);
                (word, p)
            })
            .collect();

        // Rough estimate with no principled derivation. Kept as-is because
        // scores computed with it are what existing results were tuned on.
        let num_unseen_word_types = types_seen_once.max(total_types / 20);

        log::info!(
            "Global statistics: {} types, {} tokens, {} seen once, unseen word prob {:.6}",
            total_types,
            self.total_tokens,
            types_seen_once,
            globally_unseen_word_prob
        );

        GlobalStats {
            counts: self.counts,
            word_probs,
            total_types,
            total_tokens: self.total_tokens,
            types_seen_once,
            globally_unseen_word_prob,
            num_unseen_word_types,
        }
    }
}

/// Immutable vocabulary statistics over all training distributions.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    counts: HashMap<Word, u64>,
    word_probs: HashMap<Word, f64>,
    total_types: u64,
    total_tokens: u64,
    types_seen_once: u64,
    globally_unseen_word_prob: f64,
    num_unseen_word_types: u64,
}

impl GlobalStats {
    /// Global probability of a word seen in training, already scaled down
    /// by the mass reserved for never-seen words.
    #[inline]
    pub fn prob(&self, word: Word) -> Option<f64> {
        self.word_probs.get(&word).copied()
    }

    /// Global training count of a word.
    pub fn count(&self, word: Word) -> u64 {
        self.counts.get(&word).copied().unwrap_or(0)
    }

    /// True if the word occurs anywhere in training.
    pub fn contains(&self, word: Word) -> bool {
        self.word_probs.contains_key(&word)
    }

    /// Number of distinct words seen in training.
    pub fn total_types(&self) -> u64 {
        self.total_types
    }

    /// Number of training tokens.
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Number of words whose global count is exactly 1.
    pub fn types_seen_once(&self) -> u64 {
        self.types_seen_once
    }

    /// Total probability reserved for words never seen in training.
    pub fn globally_unseen_word_prob(&self) -> f64 {
        self.globally_unseen_word_prob
    }

    /// Estimated number of distinct words never seen in training.
    pub fn num_unseen_word_types(&self) -> u64 {
        self.num_unseen_word_types
    }

    /// Share of the never-seen mass given to one never-seen word.
    #[inline]
    pub fn unseen_word_type_prob(&self) -> f64 {
        if self.num_unseen_word_types == 0 {
            0.0
        } else {
            self.globally_unseen_word_prob / self.num_unseen_word_types as f64
        }
    }

    /// Iterates over all training words and their global probabilities.
    pub fn iter(&self) -> impl Iterator<Item = (Word, f64)> + '_ {
        self.word_probs.iter().map(|(&w, &p)| (w, p))
    }
}

//! Sparse word-count distributions with two-phase smoothing.
//!
//! A [`WordDist`] moves through three states:
//!
//! 1. `Accumulating`: counts are added from documents or other distributions.
//! 2. `LocallyFinished`: rare words have been pruned; the counts are final and
//!    may be folded into the [`GlobalStats`].
//! 3. `GloballyFinished`: smoothing parameters are computed against the
//!    global statistics; only lookups and comparisons are allowed.
//!
//! Probabilities of a finished distribution are estimated as:
//!
//! - word seen here with count `c`: `c / total_tokens * (1 - unseen_mass)`
//! - word seen elsewhere in training with global probability `g`:
//!   `unseen_mass * g / overall_unseen_mass`
//! - word never seen in training:
//!   `unseen_mass * globally_unseen_word_prob / num_unseen_word_types`
//!
//! `unseen_mass` is the share of this distribution's mass reserved for words
//! it does not contain, and `overall_unseen_mass` is the global probability
//! of all words it does not contain, so that `g / overall_unseen_mass`
//! estimates `p(w | w not here)`.

use crate::distribution::global::GlobalStats;
use crate::distribution::memo::{self, Word};
use crate::similarity::{cosine, kl};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Upper bound on the mass reserved for unseen words.
pub const MAX_UNSEEN_MASS: f64 = 0.5;

/// Below this, the global mass of words missing from a distribution is
/// treated as exhausted.
pub const MIN_OVERALL_UNSEEN_MASS: f64 = 1e-12;

/// Lifecycle state of a [`WordDist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistState {
    /// Counts may still be added.
    Accumulating,
    /// Counts are final; waiting for global statistics.
    LocallyFinished,
    /// Smoothed and read-only.
    GloballyFinished,
}

/// A sparse distribution over interned words.
#[derive(Debug, Clone)]
pub struct WordDist {
    counts: HashMap<Word, u32>,
    total_tokens: u64,
    state: DistState,
    unseen_mass: f64,
    overall_unseen_mass: f64,
    global: Option<Arc<GlobalStats>>,
}

impl Default for WordDist {
    fn default() -> Self {
        Self::new()
    }
}

impl WordDist {
    /// Creates an empty distribution in the `Accumulating` state.
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total_tokens: 0,
            state: DistState::Accumulating,
            unseen_mass: MAX_UNSEEN_MASS,
            overall_unseen_mass: 1.0,
            global: None,
        }
    }

    /// Creates a distribution from `(word, count)` pairs.
    pub fn from_counts<'a, I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut dist = Self::new();
        for (word, count) in counts {
            dist.add_count(memo::intern(word), count);
        }
        dist
    }

    #[inline]
    fn assert_accumulating(&self, op: &str) {
        assert_eq!(
            self.state,
            DistState::Accumulating,
            "{} called on a word distribution that is no longer accumulating",
            op
        );
    }

    #[inline]
    fn assert_globally_finished(&self, op: &str) {
        assert_eq!(
            self.state,
            DistState::GloballyFinished,
            "{} called on a word distribution that is not globally finished",
            op
        );
    }

    /// Adds `count` occurrences of `word`.
    pub fn add_count(&mut self, word: Word, count: u32) {
        self.assert_accumulating("add_count");
        if count == 0 {
            return;
        }
        *self.counts.entry(word).or_insert(0) += count;
        self.total_tokens += count as u64;
    }

    /// Adds the tokens of a document.
    ///
    /// Tokens are lowercased first when `ignore_case` is set; stopwords are
    /// matched after case folding and skipped.
    pub fn add_document<I, S>(&mut self, tokens: I, ignore_case: bool, stopwords: &HashSet<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.assert_accumulating("add_document");
        for token in tokens {
            let token = token.as_ref();
            let folded;
            let text = if ignore_case {
                folded = token.to_lowercase();
                folded.as_str()
            } else {
                token
            };
            if stopwords.contains(text) {
                continue;
            }
            let word = memo::intern(text);
            *self.counts.entry(word).or_insert(0) += 1;
            self.total_tokens += 1;
        }
    }

    /// Merges another distribution's counts into this one.
    ///
    /// `other` may be in any state; only its counts are read.
    pub fn add_distribution(&mut self, other: &WordDist) {
        self.assert_accumulating("add_distribution");
        for (&word, &count) in &other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
        self.total_tokens += other.total_tokens;
    }

    /// Phase 1: prunes words rarer than `minimum_word_count` and freezes the
    /// counts.
    ///
    /// Must run on every training distribution before the global statistics
    /// are built, since those are summed from the pruned counts.
    pub fn finish_before_global(&mut self, minimum_word_count: u32) {
        self.assert_accumulating("finish_before_global");
        if minimum_word_count > 1 {
            let mut removed = 0u64;
            self.counts.retain(|_, count| {
                if *count < minimum_word_count {
                    removed += *count as u64;
                    false
                } else {
                    true
                }
            });
            self.total_tokens -= removed;
        }
        self.state = DistState::LocallyFinished;
    }

    /// Phase 2: computes the smoothing parameters against `global`.
    pub fn finish_after_global(&mut self, global: Arc<GlobalStats>) {
        assert_eq!(
            self.state,
            DistState::LocallyFinished,
            "finish_after_global requires a locally finished word distribution"
        );

        let types_seen_once = self.counts.values().filter(|&&c| c == 1).count();
        self.unseen_mass = if self.total_tokens > 0 {
            // Never zero (unseen words would get no mass), never above the
            // cap (seen words would get none).
            (types_seen_once.max(1) as f64 / self.total_tokens as f64).min(MAX_UNSEEN_MASS)
        } else {
            MAX_UNSEEN_MASS
        };

        let overall_seen_mass: f64 = self
            .counts
            .keys()
            .filter_map(|&w| global.prob(w))
            .sum();
        self.overall_unseen_mass = 1.0 - overall_seen_mass;
        if self.overall_unseen_mass <= MIN_OVERALL_UNSEEN_MASS {
            log::warn!(
                "Distribution with {} types covers the whole training vocabulary \
                 (overall unseen mass {:e}); unseen training words fall back to the never-seen estimate",
                self.counts.len(),
                self.overall_unseen_mass
            );
        }

        self.global = Some(global);
        self.state = DistState::GloballyFinished;
    }

    /// Probability of `word` under the smoothed distribution.
    pub fn lookup_word(&self, word: Word) -> f64 {
        self.assert_globally_finished("lookup_word");
        let global = self.global_stats();

        if let Some(&count) = self.counts.get(&word) {
            return count as f64 / self.total_tokens as f64 * (1.0 - self.unseen_mass);
        }

        match global.prob(word) {
            Some(g) if self.overall_unseen_mass > MIN_OVERALL_UNSEEN_MASS => {
                self.unseen_mass * g / self.overall_unseen_mass
            }
            _ => self.unseen_mass * global.unseen_word_type_prob(),
        }
    }

    /// Probability of a word given as text. Words never interned take the
    /// never-seen estimate.
    pub fn lookup(&self, word: &str) -> f64 {
        match memo::lookup(word) {
            Some(w) => self.lookup_word(w),
            None => {
                self.assert_globally_finished("lookup");
                self.unseen_mass * self.global_stats().unseen_word_type_prob()
            }
        }
    }

    /// Unsmoothed relative frequency of `word`.
    #[inline]
    pub fn relative_frequency(&self, word: Word) -> f64 {
        if self.total_tokens == 0 {
            return 0.0;
        }
        self.count(word) as f64 / self.total_tokens as f64
    }

    /// KL-divergence `KL(self || other)`.
    ///
    /// With `partial`, only words seen in `self` contribute; otherwise the
    /// words of `other` and the mass of all remaining words are included.
    pub fn kl_divergence(&self, other: &WordDist, partial: bool) -> f64 {
        kl::kl_divergence(self, other, partial)
    }

    /// Mean of the KL-divergences in both directions.
    pub fn symmetric_kl_divergence(&self, other: &WordDist, partial: bool) -> f64 {
        kl::symmetric_kl_divergence(self, other, partial)
    }

    /// Per-word contributions to `KL(self || other)` over the observed words.
    pub fn kl_contributions(&self, other: &WordDist, partial: bool) -> Vec<(Word, f64)> {
        kl::kl_contributions(self, other, partial)
    }

    /// Cosine similarity between the probability vectors of `self` and
    /// `other`.
    pub fn cosine_similarity(&self, other: &WordDist, partial: bool, smoothed: bool) -> f64 {
        cosine::cosine_similarity(self, other, partial, smoothed)
    }

    /// Highest-count word satisfying `pred`. Ties go to the lowest word id.
    pub fn find_most_common_word<F>(&self, mut pred: F) -> Option<Word>
    where
        F: FnMut(Word) -> bool,
    {
        let mut best: Option<(Word, u32)> = None;
        for (&word, &count) in &self.counts {
            if !pred(word) {
                continue;
            }
            best = match best {
                Some((bw, bc)) if bc > count || (bc == count && bw < word) => Some((bw, bc)),
                _ => Some((word, count)),
            };
        }
        best.map(|(w, _)| w)
    }

    /// Count of `word` (0 if absent).
    #[inline]
    pub fn count(&self, word: Word) -> u32 {
        self.counts.get(&word).copied().unwrap_or(0)
    }

    /// True if `word` has a nonzero count.
    #[inline]
    pub fn contains(&self, word: Word) -> bool {
        self.counts.contains_key(&word)
    }

    /// Iterates over `(word, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Word, u32)> + '_ {
        self.counts.iter().map(|(&w, &c)| (w, c))
    }

    /// Total number of tokens.
    #[inline]
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    /// Number of distinct words.
    pub fn num_types(&self) -> usize {
        self.counts.len()
    }

    /// True if no tokens have been counted.
    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> DistState {
        self.state
    }

    /// True once both finish phases have run.
    pub fn is_finished(&self) -> bool {
        self.state == DistState::GloballyFinished
    }

    /// Mass reserved for words absent from this distribution.
    pub fn unseen_mass(&self) -> f64 {
        self.assert_globally_finished("unseen_mass");
        self.unseen_mass
    }

    /// Global probability of all words absent from this distribution.
    pub fn overall_unseen_mass(&self) -> f64 {
        self.assert_globally_finished("overall_unseen_mass");
        self.overall_unseen_mass
    }

    /// The global statistics this distribution was smoothed against.
    pub fn global_stats(&self) -> &GlobalStats {
        self.global
            .as_deref()
            .expect("word distribution has no global statistics before finish_after_global")
    }
}

impl fmt::Display for WordDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NUM_WORDS_TO_PRINT: usize = 15;

        let mut items: Vec<(Word, u32)> = self.iter().collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut words: Vec<String> = items
            .iter()
            .take(NUM_WORDS_TO_PRINT)
            .map(|(w, c)| format!("{}={}", w, c))
            .collect();
        if items.len() > NUM_WORDS_TO_PRINT {
            words.push("...".to_string());
        }

        let state = match self.state {
            DistState::Accumulating => ", unfinished",
            DistState::LocallyFinished => ", locally finished",
            DistState::GloballyFinished => "",
        };
        write!(
            f,
            "WordDist({} tokens, {:.2} unseen mass{}, {})",
            self.total_tokens,
            self.unseen_mass,
            state,
            words.join(" ")
        )
    }
}

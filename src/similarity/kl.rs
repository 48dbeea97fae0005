//! KL-divergence between smoothed word distributions.
//!
//! The full divergence runs over the entire vocabulary, but only the words
//! of the two distributions need explicit terms. Every other word falls in
//! one of two groups whose members share the same `p/q` ratio:
//!
//! - words seen in training but in neither distribution, where
//!   `p(w) = su * g(w) / sou` and `q(w) = ou * g(w) / oou`;
//! - words never seen in training, where every word gets
//!   `su * unseen_type_prob` and `ou * unseen_type_prob`.
//!
//! Each group therefore contributes a closed-form term.

use crate::distribution::memo::Word;
use crate::distribution::word_dist::{WordDist, MIN_OVERALL_UNSEEN_MASS};
use crate::similarity::DistributionMeasure;
use log::{debug, warn};

/// KL-divergence measure, `KL(doc || cell)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KlDivergence {
    /// Only sum over the words of the document.
    pub partial: bool,
    /// Average both directions.
    pub symmetric: bool,
}

impl KlDivergence {
    /// Creates a measure.
    pub fn new(partial: bool, symmetric: bool) -> Self {
        Self { partial, symmetric }
    }
}

impl DistributionMeasure for KlDivergence {
    fn measure(&self, doc: &WordDist, cell: &WordDist) -> f64 {
        if self.symmetric {
            symmetric_kl_divergence(doc, cell, self.partial)
        } else {
            kl_divergence(doc, cell, self.partial)
        }
    }

    fn score(&self, doc: &WordDist, cell: &WordDist) -> f64 {
        self.measure(doc, cell)
    }
}

#[inline]
fn term(word: Word, p: f64, q: f64) -> Option<f64> {
    if p <= 0.0 || q <= 0.0 {
        warn!(
            "Skipping KL term with non-positive probability: p={}, q={}, word={}",
            p, q, word
        );
        return None;
    }
    Some(p * (p.ln() - q.ln()))
}

/// Explicit terms for the observed words, plus the global probability mass
/// of the words found only in `q`.
fn observed_terms<F>(p: &WordDist, q: &WordDist, partial: bool, mut visit: F) -> f64
where
    F: FnMut(Word, f64),
{
    for (word, _) in p.iter() {
        if let Some(t) = term(word, p.lookup_word(word), q.lookup_word(word)) {
            visit(word, t);
        }
    }

    if partial {
        return 0.0;
    }

    let global = p.global_stats();
    let mut overall_probs_diff_words = 0.0;
    for (word, _) in q.iter() {
        if p.contains(word) {
            continue;
        }
        if let Some(t) = term(word, p.lookup_word(word), q.lookup_word(word)) {
            visit(word, t);
        }
        overall_probs_diff_words += global.prob(word).unwrap_or(0.0);
    }
    overall_probs_diff_words
}

/// Closed-form contribution of all words absent from both distributions.
fn unobserved_terms(p: &WordDist, q: &WordDist, overall_probs_diff_words: f64) -> f64 {
    let global = p.global_stats();
    let (su, sou) = (p.unseen_mass(), p.overall_unseen_mass());
    let (ou, oou) = (q.unseen_mass(), q.overall_unseen_mass());
    let mut kldiv = 0.0;

    // Words seen in training but in neither distribution.
    let the_sum = sou - global.globally_unseen_word_prob() - overall_probs_diff_words;
    if the_sum > 0.0 {
        if sou <= MIN_OVERALL_UNSEEN_MASS || oou <= MIN_OVERALL_UNSEEN_MASS {
            warn!(
                "Skipping KL term for unobserved training words: overall unseen mass {} / {}",
                sou, oou
            );
        } else {
            let factor1 = (su.ln() - sou.ln()) - (ou.ln() - oou.ln());
            let factor2 = su / sou * factor1;
            kldiv += factor2 * the_sum;
        }
    }

    // Words never seen in training.
    let type_prob = global.unseen_word_type_prob();
    if type_prob > 0.0 {
        let pu = su * type_prob;
        let qu = ou * type_prob;
        if pu > 0.0 && qu > 0.0 {
            kldiv += global.num_unseen_word_types() as f64 * pu * (pu.ln() - qu.ln());
        } else {
            debug!("No never-seen mass in one of the distributions");
        }
    }

    kldiv
}

/// `KL(p || q)`. Both distributions must be globally finished against the
/// same statistics.
pub fn kl_divergence(p: &WordDist, q: &WordDist, partial: bool) -> f64 {
    let mut kldiv = 0.0;
    let diff = observed_terms(p, q, partial, |_, t| kldiv += t);
    if partial {
        return kldiv;
    }
    kldiv + unobserved_terms(p, q, diff)
}

/// `(KL(p || q) + KL(q || p)) / 2`.
pub fn symmetric_kl_divergence(p: &WordDist, q: &WordDist, partial: bool) -> f64 {
    0.5 * kl_divergence(p, q, partial) + 0.5 * kl_divergence(q, p, partial)
}

/// Per-word terms of `KL(p || q)`, largest magnitude first.
///
/// Covers the words of `p`, and with `!partial` also the words of `q`. The
/// closed-form terms for unobserved words are not included.
pub fn kl_contributions(p: &WordDist, q: &WordDist, partial: bool) -> Vec<(Word, f64)> {
    let mut contribs = Vec::with_capacity(p.num_types());
    observed_terms(p, q, partial, |w, t| contribs.push((w, t)));
    contribs.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(&b.0)));
    contribs
}

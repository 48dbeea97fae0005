//! Cosine similarity between word distributions.

use crate::distribution::memo::Word;
use crate::distribution::word_dist::WordDist;
use crate::similarity::DistributionMeasure;
use log::warn;

/// Largest similarity accepted before a value is treated as corrupt.
pub const MAX_COSINE: f64 = 1.002;

/// Cosine similarity measure.
///
/// Scores as `MAX_COSINE - similarity` so that lower is better, like the
/// divergences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CosineSimilarity {
    /// Restrict the vectors to the words of the document.
    pub partial: bool,
    /// Use smoothed probabilities instead of raw relative frequencies.
    pub smoothed: bool,
}

impl CosineSimilarity {
    /// Creates a measure.
    pub fn new(partial: bool, smoothed: bool) -> Self {
        Self { partial, smoothed }
    }
}

impl DistributionMeasure for CosineSimilarity {
    fn measure(&self, doc: &WordDist, cell: &WordDist) -> f64 {
        cosine_similarity(doc, cell, self.partial, self.smoothed)
    }

    fn score(&self, doc: &WordDist, cell: &WordDist) -> f64 {
        let mut sim = self.measure(doc, cell);
        if !(0.0..=MAX_COSINE).contains(&sim) {
            warn!(
                "Cosine similarity {} out of range; treating as 0 (doc: {} tokens, cell: {} tokens)",
                sim,
                doc.total_tokens(),
                cell.total_tokens()
            );
            sim = 0.0;
        }
        MAX_COSINE - sim
    }
}

/// Cosine of the angle between the probability vectors of `p` and `q`.
///
/// With `partial`, both vectors are restricted to the words of `p`;
/// otherwise they range over the words of either distribution. A zero
/// vector yields 0. `smoothed` requires both distributions to be globally
/// finished.
pub fn cosine_similarity(p: &WordDist, q: &WordDist, partial: bool, smoothed: bool) -> f64 {
    let value = |d: &WordDist, w: Word| {
        if smoothed {
            d.lookup_word(w)
        } else {
            d.relative_frequency(w)
        }
    };

    let mut dot = 0.0;
    let mut pnorm2 = 0.0;
    let mut qnorm2 = 0.0;
    let mut accumulate = |a: f64, b: f64| {
        dot += a * b;
        pnorm2 += a * a;
        qnorm2 += b * b;
    };

    for (w, _) in p.iter() {
        accumulate(value(p, w), value(q, w));
    }
    if !partial {
        for (w, _) in q.iter() {
            if !p.contains(w) {
                accumulate(value(p, w), value(q, w));
            }
        }
    }

    if pnorm2 <= 0.0 || qnorm2 <= 0.0 {
        return 0.0;
    }
    dot / (pnorm2.sqrt() * qnorm2.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::global::GlobalStatsBuilder;
    use std::sync::Arc;

    fn finish_all(dists: &mut [&mut WordDist]) {
        let mut builder = GlobalStatsBuilder::new();
        for d in dists.iter_mut() {
            d.finish_before_global(0);
            builder.add(d);
        }
        let global = Arc::new(builder.build());
        for d in dists.iter_mut() {
            d.finish_after_global(global.clone());
        }
    }

    #[test]
    fn test_identical() {
        let mut a = WordDist::from_counts([("cs-a", 3), ("cs-b", 1)]);
        let mut b = WordDist::from_counts([("cs-c", 2)]);
        finish_all(&mut [&mut a, &mut b]);

        for partial in [false, true] {
            for smoothed in [false, true] {
                let sim = cosine_similarity(&a, &a, partial, smoothed);
                assert!((sim - 1.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_disjoint_unsmoothed() {
        let a = WordDist::from_counts([("cs-d1", 3)]);
        let b = WordDist::from_counts([("cs-d2", 2)]);
        assert!(cosine_similarity(&a, &b, false, false).abs() < 1e-10);
        // Partial restricts to a's words, where b is all zero.
        assert_eq!(cosine_similarity(&a, &b, true, false), 0.0);
    }

    #[test]
    fn test_known_value() {
        // a = (0.5, 0.5, 0), b = (0.5, 0, 0.5): cosine 0.5.
        let a = WordDist::from_counts([("cs-k1", 1), ("cs-k2", 1)]);
        let b = WordDist::from_counts([("cs-k1", 1), ("cs-k3", 1)]);
        assert!((cosine_similarity(&a, &b, false, false) - 0.5).abs() < 1e-10);
        // Restricted to {k1, k2}: a = (0.5, 0.5), b = (0.5, 0).
        let expected = 0.25 / (0.5f64.sqrt() * 0.5);
        assert!((cosine_similarity(&a, &b, true, false) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_empty_is_zero() {
        let a = WordDist::new();
        let b = WordDist::from_counts([("cs-e1", 1)]);
        assert_eq!(cosine_similarity(&a, &b, false, false), 0.0);
        assert_eq!(cosine_similarity(&b, &a, false, false), 0.0);
    }

    #[test]
    fn test_smoothed_in_range() {
        let mut a = WordDist::from_counts([("cs-r1", 4), ("cs-r2", 1)]);
        let mut b = WordDist::from_counts([("cs-r2", 2), ("cs-r3", 5)]);
        finish_all(&mut [&mut a, &mut b]);

        let sim = cosine_similarity(&a, &b, false, true);
        assert!(sim > 0.0 && sim < 1.0);

        let score = CosineSimilarity::new(false, true).score(&a, &b);
        assert!((score - (MAX_COSINE - sim)).abs() < 1e-12);
    }
}

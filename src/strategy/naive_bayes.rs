//! Naive Bayes ranking: log-likelihood of the document's words under each
//! cell, plus an optional log prior from the cell's share of incoming links.

use crate::config::NaiveBayesWeighting;
use crate::distribution::{Word, WordDist};
use crate::geo::MultiCell;
use crate::strategy::toponym::adjusted_links;
use crate::strategy::{rank_cells, Ranking, ScoringContext, SortOrder};
use log::warn;

/// Naive Bayes strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NaiveBayes {
    /// Add the cell prior to the word evidence.
    pub use_baseline: bool,
    /// How words and prior are weighed against each other.
    pub weighting: NaiveBayesWeighting,
    /// Weight of the prior under [`NaiveBayesWeighting::EqualWords`].
    pub baseline_weight: f64,
}

impl NaiveBayes {
    /// Creates the strategy.
    pub fn new(use_baseline: bool, weighting: NaiveBayesWeighting, baseline_weight: f64) -> Self {
        Self {
            use_baseline,
            weighting,
            baseline_weight,
        }
    }

    /// `(word_weight, baseline_weight)` for a document.
    pub fn weights(&self, doc: &WordDist) -> (f64, f64) {
        if !self.use_baseline {
            return (1.0, 0.0);
        }
        match self.weighting {
            NaiveBayesWeighting::Equal => (1.0, 1.0),
            NaiveBayesWeighting::EqualWords => {
                let word_weight = if doc.total_tokens() == 0 {
                    0.0
                } else {
                    1.0 / doc.total_tokens() as f64
                };
                (word_weight, self.baseline_weight)
            }
        }
    }

    /// Weighted log-probability of `doc` under `cell`.
    ///
    /// `words` must be `doc`'s words in a fixed order so that sums are
    /// reproducible.
    fn log_prob(
        &self,
        words: &[(Word, u32)],
        cell: &MultiCell,
        total_links: u64,
        (word_weight, baseline_weight): (f64, f64),
    ) -> f64 {
        let dist = cell.dist();
        let mut word_logprob = 0.0;
        for &(word, count) in words {
            let p = dist.lookup_word(word);
            if p <= 0.0 {
                warn!(
                    "Word {:?} has non-positive probability {} in cell {}; skipping",
                    word.text(),
                    p,
                    cell.index()
                );
                continue;
            }
            word_logprob += count as f64 * p.ln();
        }

        let mut baseline_logprob = 0.0;
        if baseline_weight != 0.0 {
            // Cells without links keep a small positive share.
            let prior = adjusted_links(Some(cell.incoming_links()))
                / adjusted_links(Some(total_links));
            baseline_logprob = prior.ln();
        }

        word_weight * word_logprob + baseline_weight * baseline_logprob
    }

    /// Ranks the cells with non-empty distributions, most probable first.
    pub fn rank<'g>(&self, ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
        let grid = ctx.grid();
        let total = grid.total_incoming_links();
        let weights = self.weights(doc);

        let mut words: Vec<_> = doc.iter().collect();
        words.sort_unstable();

        rank_cells(
            grid.iter_nonempty_cells(true),
            ctx.budget(),
            SortOrder::Descending,
            |cell| self.log_prob(&words, cell, total, weights),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GridConfig};
    use crate::geo::{CellGrid, CellIndex, Coord, Document, Split};

    fn build_grid() -> CellGrid {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, vec![("nb-paris", 3), ("nb-river", 1)], 30),
            (5.0, 5.0, vec![("nb-paris", 1), ("nb-seine", 2)], 10),
            (50.0, 50.0, vec![("nb-tokyo", 5), ("nb-river", 1)], 40),
        ];
        for (lat, long, words, links) in docs {
            grid.add_document(
                &Document::new(
                    "d",
                    Coord::new(lat, long).unwrap(),
                    Split::Training,
                    WordDist::from_counts(words),
                )
                .with_incoming_links(links),
            );
        }
        grid.finalize(0);
        grid
    }

    #[test]
    fn test_weights() {
        let doc = WordDist::from_counts([("nb-a", 3), ("nb-b", 1)]);
        let empty = WordDist::new();

        let nobase = NaiveBayes::new(false, NaiveBayesWeighting::EqualWords, 0.3);
        assert_eq!(nobase.weights(&doc), (1.0, 0.0));

        let equal = NaiveBayes::new(true, NaiveBayesWeighting::Equal, 0.3);
        assert_eq!(equal.weights(&doc), (1.0, 1.0));

        let words = NaiveBayes::new(true, NaiveBayesWeighting::EqualWords, 0.3);
        assert_eq!(words.weights(&doc), (0.25, 0.3));
        assert_eq!(words.weights(&empty), (0.0, 0.3));
    }

    #[test]
    fn test_ranks_matching_cell_first() {
        let grid = build_grid();
        let mut doc = WordDist::from_counts([("nb-paris", 2), ("nb-seine", 1)]);
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        for use_baseline in [true, false] {
            let nb = NaiveBayes::new(use_baseline, NaiveBayesWeighting::Equal, 0.5);
            let ranking = nb.rank(&mut ctx, &doc);
            assert_eq!(ranking.len(), 2);
            assert_eq!(ranking.best().unwrap().cell.index(), CellIndex::new(0, 0));
            assert!(ranking.entries[0].score >= ranking.entries[1].score);
            assert!(ranking.iter().all(|e| e.score.is_finite()));
        }
    }

    #[test]
    fn test_score_matches_hand_computation() {
        let grid = build_grid();
        let mut doc = WordDist::from_counts([("nb-tokyo", 1)]);
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        let nb = NaiveBayes::new(true, NaiveBayesWeighting::Equal, 0.5);
        let ranking = nb.rank(&mut ctx, &doc);
        let tokyo = ranking
            .iter()
            .find(|e| e.cell.index() == CellIndex::new(5, 5))
            .unwrap();

        let p = tokyo.cell.dist().lookup("nb-tokyo");
        let prior: f64 = 40.0 / 80.0;
        assert!((tokyo.score - (p.ln() + prior.ln())).abs() < 1e-10);
        assert_eq!(ranking.best().unwrap().cell.index(), CellIndex::new(5, 5));
    }

    #[test]
    fn test_prior_follows_links_not_documents() {
        // One heavily linked document against three barely linked ones.
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, 1000),
            (55.0, 55.0, 1),
            (55.0, 55.0, 1),
            (55.0, 55.0, 1),
        ];
        for (lat, long, links) in docs {
            grid.add_document(
                &Document::new(
                    "d",
                    Coord::new(lat, long).unwrap(),
                    Split::Training,
                    WordDist::from_counts([("nb-w", 1)]),
                )
                .with_incoming_links(links),
            );
        }
        grid.finalize(0);

        let mut doc = WordDist::new();
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());
        let nb = NaiveBayes::new(true, NaiveBayesWeighting::Equal, 0.5);
        let ranking = nb.rank(&mut ctx, &doc);

        let best = ranking.best().unwrap();
        assert_eq!(best.cell.index(), CellIndex::new(0, 0));
        let expected: f64 = 1000.0 / 1003.0;
        assert!((best.score - expected.ln()).abs() < 1e-10);
        let other = ranking.rank_of(CellIndex::new(5, 5)).unwrap();
        assert_eq!(other, 2);
        let expected: f64 = 3.0 / 1003.0;
        assert!((ranking.entries[1].score - expected.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_unlinked_cells_get_small_prior() {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        for (lat, long) in [(5.0, 5.0), (55.0, 55.0)] {
            grid.add_document(&Document::new(
                "d",
                Coord::new(lat, long).unwrap(),
                Split::Training,
                WordDist::from_counts([("nb-u", 1)]),
            ));
        }
        grid.finalize(0);

        let mut doc = WordDist::new();
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());
        let nb = NaiveBayes::new(true, NaiveBayesWeighting::Equal, 0.5);
        let ranking = nb.rank(&mut ctx, &doc);

        // No links anywhere: every prior is 1.
        assert_eq!(ranking.len(), 2);
        assert!(ranking.iter().all(|e| e.score.abs() < 1e-12));
    }
}

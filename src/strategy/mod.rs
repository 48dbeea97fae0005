//! Strategies ranking the cells of a grid against a document.
//!
//! Every strategy produces a [`Ranking`]: the non-empty cells of the grid,
//! best match first, each with the score it was ranked by. Distribution
//! comparisons rank the cells with non-empty word distributions; the
//! popularity and random baselines rank every cell containing a document.
//!
//! Strategies check the context's stage budget once per cell. When it runs
//! out they return the cells scored so far, flagged incomplete.

pub mod baseline;
pub mod context;
pub mod divergence;
pub mod naive_bayes;
pub mod per_word;
pub mod toponym;

pub use baseline::BaselineStrategy;
pub use context::ScoringContext;
pub use naive_bayes::NaiveBayes;
pub use toponym::{adjusted_links, Candidate, Gazetteer, NoToponyms, ToponymResolver};

use crate::budget::StageBudget;
use crate::config::ScoringConfig;
use crate::distribution::WordDist;
use crate::error::{GaiaError, Result};
use crate::geo::{CellGrid, CellIndex, MultiCell};
use crate::similarity::{CosineSimilarity, KlDivergence};
use log::info;
use std::fmt;

/// A cell and the score it was ranked by.
#[derive(Debug, Clone, Copy)]
pub struct RankedCell<'g> {
    /// The cell.
    pub cell: &'g MultiCell,
    /// Its score under the strategy that ranked it.
    pub score: f64,
}

/// Cells ordered best match first.
#[derive(Debug, Clone)]
pub struct Ranking<'g> {
    /// Ranked cells.
    pub entries: Vec<RankedCell<'g>>,
    /// False if the stage budget ran out before every cell was scored.
    pub complete: bool,
}

impl<'g> Ranking<'g> {
    /// Number of ranked cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no cells were ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The best cell.
    pub fn best(&self) -> Option<&RankedCell<'g>> {
        self.entries.first()
    }

    /// Iterates over the ranked cells.
    pub fn iter(&self) -> impl Iterator<Item = &RankedCell<'g>> + '_ {
        self.entries.iter()
    }

    /// 1-based rank of the cell at `index`.
    pub fn rank_of(&self, index: CellIndex) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.cell.index() == index)
            .map(|pos| pos + 1)
    }

    /// Keeps only the best `k` cells.
    pub fn truncate(&mut self, k: usize) {
        self.entries.truncate(k);
    }

    /// Indices of the ranked cells, in order.
    pub fn indices(&self) -> Vec<CellIndex> {
        self.entries.iter().map(|e| e.cell.index()).collect()
    }
}

/// Which end of the score range is best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    /// Lower scores first.
    Ascending,
    /// Higher scores first.
    Descending,
}

/// Scores cells one at a time under `budget` and sorts them. Ties keep
/// grid order.
pub(crate) fn rank_cells<'g, I, F>(
    cells: I,
    budget: &StageBudget,
    order: SortOrder,
    mut score: F,
) -> Ranking<'g>
where
    I: IntoIterator<Item = &'g MultiCell>,
    F: FnMut(&'g MultiCell) -> f64,
{
    let mut entries = Vec::new();
    let mut complete = true;
    for cell in cells {
        if budget.expired() {
            info!(
                "Stopping ranking after {} cells ({:.1?})",
                entries.len(),
                budget.elapsed()
            );
            complete = false;
            break;
        }
        entries.push(RankedCell {
            cell,
            score: score(cell),
        });
    }

    match order {
        SortOrder::Ascending => entries.sort_by(|a, b| a.score.total_cmp(&b.score)),
        SortOrder::Descending => entries.sort_by(|a, b| b.score.total_cmp(&a.score)),
    }
    Ranking { entries, complete }
}

/// Maps cells named by a posterior back to the grid, keeping the
/// posterior's order.
pub(crate) fn rank_by_posterior<'g>(
    grid: &'g CellGrid,
    ranked: &[(CellIndex, f64)],
    budget: &StageBudget,
) -> Ranking<'g> {
    let mut entries = Vec::with_capacity(ranked.len());
    for &(index, prob) in ranked {
        if budget.expired() {
            return Ranking {
                entries,
                complete: false,
            };
        }
        if let Some(cell) = grid.cell(index) {
            entries.push(RankedCell { cell, score: prob });
        }
    }
    Ranking {
        entries,
        complete: true,
    }
}

/// A cell-ranking strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// KL-divergence of the document from each cell, ascending.
    KlDivergence(KlDivergence),
    /// Cosine similarity, ranked by `1.002 - similarity` ascending.
    CosineSimilarity(CosineSimilarity),
    /// Naive Bayes log-probability, descending.
    NaiveBayes(NaiveBayes),
    /// Count-weighted average of the document words' posteriors, descending.
    AverageCellProbability,
    /// A baseline that ignores most or all of the document.
    Baseline(BaselineStrategy),
}

impl Strategy {
    /// Parses a strategy name or alias. `"baseline"` selects
    /// `config.baseline_strategy`.
    pub fn parse(name: &str, config: &ScoringConfig) -> Result<Self> {
        let kl = |partial, symmetric| Strategy::KlDivergence(KlDivergence::new(partial, symmetric));
        let cos = |partial, smoothed| {
            Strategy::CosineSimilarity(CosineSimilarity::new(partial, smoothed))
        };
        let nb = |use_baseline| {
            Strategy::NaiveBayes(NaiveBayes::new(
                use_baseline,
                config.naive_bayes_weighting,
                config.baseline_weight,
            ))
        };

        let strategy = match name {
            "full-kl-divergence" | "full-kldiv" | "full-kl" => kl(false, false),
            "partial-kl-divergence" | "partial-kldiv" | "partial-kl" => kl(true, false),
            "symmetric-full-kl-divergence" | "sym-full-kldiv" | "sym-full-kl" | "sym-kldiv"
            | "sym-kl" => kl(false, true),
            "symmetric-partial-kl-divergence" | "sym-partial-kldiv" | "sym-partial-kl" => {
                kl(true, true)
            }
            "cosine-similarity" | "cossim" => cos(false, false),
            "partial-cosine-similarity" | "partial-cossim" => cos(true, false),
            "smoothed-cosine-similarity" | "smoothed-cossim" => cos(false, true),
            "smoothed-partial-cosine-similarity" | "smoothed-partial-cossim" => cos(true, true),
            "average-cell-probability" | "avg-cell-prob" | "acp" | "per-word-region-distribution" => {
                Strategy::AverageCellProbability
            }
            "naive-bayes-with-baseline" | "nb-base" => nb(true),
            "naive-bayes-no-baseline" | "nb-nobase" => nb(false),
            "baseline" => {
                return BaselineStrategy::parse(&config.baseline_strategy).map(Strategy::Baseline)
            }
            other => {
                return BaselineStrategy::parse(other)
                    .map(Strategy::Baseline)
                    .map_err(|_| GaiaError::UnknownStrategy(other.to_string()))
            }
        };
        Ok(strategy)
    }

    /// Builds the strategy selected by a scoring configuration.
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::parse(&config.strategy, config)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::KlDivergence(m) => match (m.partial, m.symmetric) {
                (false, false) => "full-kl-divergence",
                (true, false) => "partial-kl-divergence",
                (false, true) => "symmetric-full-kl-divergence",
                (true, true) => "symmetric-partial-kl-divergence",
            },
            Strategy::CosineSimilarity(m) => match (m.partial, m.smoothed) {
                (false, false) => "cosine-similarity",
                (true, false) => "partial-cosine-similarity",
                (false, true) => "smoothed-cosine-similarity",
                (true, true) => "smoothed-partial-cosine-similarity",
            },
            Strategy::NaiveBayes(nb) => {
                if nb.use_baseline {
                    "naive-bayes-with-baseline"
                } else {
                    "naive-bayes-no-baseline"
                }
            }
            Strategy::AverageCellProbability => "average-cell-probability",
            Strategy::Baseline(b) => b.name(),
        }
    }

    /// Ranks the cells of the context's grid against `doc`.
    ///
    /// Distribution comparisons need `doc` to be globally finished against
    /// the grid's statistics (see [`CellGrid::prepare_document`]).
    pub fn rank<'g>(&self, ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
        match self {
            Strategy::KlDivergence(m) => divergence::rank(ctx, doc, m),
            Strategy::CosineSimilarity(m) => divergence::rank(ctx, doc, m),
            Strategy::NaiveBayes(nb) => nb.rank(ctx, doc),
            Strategy::AverageCellProbability => per_word::rank(ctx, doc),
            Strategy::Baseline(b) => b.rank(ctx, doc),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

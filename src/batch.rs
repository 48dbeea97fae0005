//! Ranking many documents in parallel against one finalized grid.
//!
//! The grid is shared read-only between rayon workers. Every worker gets its
//! own [`ScoringContext`], so posterior caches and random number generators
//! are never shared and need no locking.

use crate::budget::{StageBudget, StageProgress};
use crate::config::Config;
use crate::distribution::WordDist;
use crate::geo::{CellGrid, Document};
use crate::strategy::{NoToponyms, Ranking, ScoringContext, Strategy, ToponymResolver};
use log::info;
use rayon::prelude::*;
use std::sync::Arc;

/// Output of a batch run.
#[derive(Debug)]
pub struct BatchResult<'g> {
    /// One entry per input document, in input order. `None` for documents
    /// skipped because the stage budget ran out.
    pub rankings: Vec<Option<Ranking<'g>>>,
    /// How many documents were ranked.
    pub progress: StageProgress,
}

/// Ranks batches of documents with one strategy.
#[derive(Debug, Clone)]
pub struct BatchRanker<'g> {
    grid: &'g CellGrid,
    strategy: Strategy,
    config: Config,
    toponyms: Arc<dyn ToponymResolver>,
    top_k: Option<usize>,
}

impl<'g> BatchRanker<'g> {
    /// Creates a ranker over a finalized grid.
    pub fn new(grid: &'g CellGrid, strategy: Strategy, config: &Config) -> Self {
        Self {
            grid,
            strategy,
            config: config.clone(),
            toponyms: Arc::new(NoToponyms),
            top_k: None,
        }
    }

    /// Sets the toponym resolver handed to every worker.
    pub fn with_toponyms(mut self, toponyms: Arc<dyn ToponymResolver>) -> Self {
        self.toponyms = toponyms;
        self
    }

    /// Keeps only the best `k` cells of each ranking.
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    fn context(&self) -> ScoringContext<'g> {
        ScoringContext::new(self.grid, &self.config).with_toponyms(Arc::clone(&self.toponyms))
    }

    /// Ranks globally finished document distributions.
    pub fn rank(&self, docs: &[WordDist]) -> BatchResult<'g> {
        self.rank_with_progress(docs, |_| {})
    }

    /// Like [`rank`](Self::rank), calling `on_done(i)` after document `i` is
    /// ranked.
    ///
    /// The stage budget from the configuration bounds the whole batch; each
    /// ranking also stops early once it expires.
    pub fn rank_with_progress<F>(&self, docs: &[WordDist], on_done: F) -> BatchResult<'g>
    where
        F: Fn(usize) + Sync,
    {
        let budget = StageBudget::new(self.config.scoring.stage_limit());
        let seed = self.config.scoring.seed;

        let rankings: Vec<Option<Ranking<'g>>> = docs
            .par_iter()
            .enumerate()
            .map_init(
                || self.context().with_budget(budget.clone()),
                |ctx, (i, doc)| {
                    if budget.expired() {
                        return None;
                    }
                    if let Some(s) = seed {
                        ctx.reseed(s.wrapping_add(i as u64));
                    }
                    let mut ranking = self.strategy.rank(ctx, doc);
                    if let Some(k) = self.top_k {
                        ranking.truncate(k);
                    }
                    on_done(i);
                    Some(ranking)
                },
            )
            .collect();

        let processed = rankings.iter().filter(|r| r.is_some()).count();
        let complete = processed == docs.len();
        if !complete {
            info!(
                "Stage budget expired: ranked {} of {} documents",
                processed,
                docs.len()
            );
        }
        BatchResult {
            rankings,
            progress: StageProgress {
                processed,
                complete,
            },
        }
    }
}

/// Finishes the distributions of documents to be ranked against `grid`.
pub fn prepare_documents(grid: &CellGrid, docs: &mut [Document]) {
    docs.par_iter_mut()
        .for_each(|doc| grid.prepare_document(&mut doc.dist));
}

/// Ranks `docs` with `strategy` using the settings of `config`.
pub fn rank_documents<'g>(
    grid: &'g CellGrid,
    strategy: Strategy,
    config: &Config,
    docs: &[WordDist],
) -> BatchResult<'g> {
    BatchRanker::new(grid, strategy, config).rank(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::geo::{CellIndex, Coord, Split};
    use crate::strategy::BaselineStrategy;
    use crate::similarity::KlDivergence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build_grid() -> CellGrid {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, vec![("bt-paris", 3), ("bt-seine", 1)]),
            (50.0, 50.0, vec![("bt-tokyo", 4), ("bt-fuji", 1)]),
            (-30.0, -60.0, vec![("bt-pampa", 2), ("bt-gaucho", 1)]),
        ];
        for (lat, long, words) in docs {
            grid.add_document(&Document::new(
                "d",
                Coord::new(lat, long).unwrap(),
                Split::Training,
                WordDist::from_counts(words),
            ));
        }
        grid.finalize(0);
        grid
    }

    fn queries(grid: &CellGrid) -> Vec<WordDist> {
        let mut docs: Vec<Document> = [
            vec![("bt-paris", 2)],
            vec![("bt-tokyo", 1), ("bt-fuji", 1)],
            vec![("bt-pampa", 3)],
        ]
        .into_iter()
        .map(|words| {
            Document::new(
                "q",
                Coord::new(0.0, 0.0).unwrap(),
                Split::Test,
                WordDist::from_counts(words),
            )
        })
        .collect();
        prepare_documents(grid, &mut docs);
        docs.into_iter().map(|d| d.dist).collect()
    }

    #[test]
    fn test_rank_documents_in_order() {
        let grid = build_grid();
        let docs = queries(&grid);
        let strategy = Strategy::KlDivergence(KlDivergence::new(true, false));

        let result = rank_documents(&grid, strategy, &Config::default(), &docs);
        assert!(result.progress.complete);
        assert_eq!(result.progress.processed, 3);

        let best: Vec<CellIndex> = result
            .rankings
            .iter()
            .map(|r| r.as_ref().unwrap().best().unwrap().cell.index())
            .collect();
        assert_eq!(
            best,
            vec![CellIndex::new(0, 0), CellIndex::new(5, 5), CellIndex::new(-3, -6)]
        );
    }

    #[test]
    fn test_top_k_and_progress_callback() {
        let grid = build_grid();
        let docs = queries(&grid);
        let strategy = Strategy::KlDivergence(KlDivergence::new(true, false));
        let done = AtomicUsize::new(0);

        let result = BatchRanker::new(&grid, strategy, &Config::default())
            .with_top_k(1)
            .rank_with_progress(&docs, |_| {
                done.fetch_add(1, Ordering::Relaxed);
            });
        assert_eq!(done.load(Ordering::Relaxed), 3);
        assert!(result.rankings.iter().all(|r| r.as_ref().unwrap().len() == 1));
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let grid = build_grid();
        let docs = queries(&grid);
        let mut config = Config::default();
        config.scoring.seed = Some(42);
        let strategy = Strategy::Baseline(BaselineStrategy::Random);

        let a = rank_documents(&grid, strategy, &config, &docs);
        let b = rank_documents(&grid, strategy, &config, &docs);
        for (ra, rb) in a.rankings.iter().zip(&b.rankings) {
            assert_eq!(ra.as_ref().unwrap().indices(), rb.as_ref().unwrap().indices());
        }
    }

    #[test]
    fn test_expired_budget_skips_documents() {
        let grid = build_grid();
        let docs = queries(&grid);
        let mut config = Config::default();
        config.scoring.max_time_per_stage = Some(0.0);
        let strategy = Strategy::KlDivergence(KlDivergence::new(true, false));

        let result = rank_documents(&grid, strategy, &config, &docs);
        assert!(!result.progress.complete);
        assert_eq!(result.progress.processed, 0);
        assert!(result.rankings.iter().all(Option::is_none));
    }
}

//! Ranking by a distribution measure (KL-divergence or cosine).

use crate::distribution::WordDist;
use crate::similarity::DistributionMeasure;
use crate::strategy::{rank_cells, Ranking, ScoringContext, SortOrder};
use log::{debug, log_enabled, Level};

/// Cells whose divergence breakdown is logged at debug level.
const NUM_DEBUG_CELLS: usize = 5;

/// Words shown per logged cell.
const NUM_DEBUG_WORDS: usize = 25;

/// Ranks the cells with non-empty distributions by `measure.score`,
/// lowest first.
pub fn rank<'g, M>(ctx: &mut ScoringContext<'g>, doc: &WordDist, measure: &M) -> Ranking<'g>
where
    M: DistributionMeasure,
{
    let grid = ctx.grid();
    let ranking = rank_cells(
        grid.iter_nonempty_cells(true),
        ctx.budget(),
        SortOrder::Ascending,
        |cell| measure.score(doc, cell.dist()),
    );

    if log_enabled!(Level::Debug) {
        for entry in ranking.iter().take(NUM_DEBUG_CELLS) {
            let top: Vec<String> = doc
                .kl_contributions(entry.cell.dist(), true)
                .into_iter()
                .take(NUM_DEBUG_WORDS)
                .map(|(w, c)| format!("{}={:.4}", w.text(), c))
                .collect();
            debug!(
                "Cell {} score {:.6}: {}",
                entry.cell.index(),
                entry.score,
                top.join(" ")
            );
        }
    }
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GridConfig};
    use crate::geo::{CellGrid, CellIndex, Coord, Document, Split};
    use crate::similarity::{CosineSimilarity, KlDivergence};

    fn build_grid() -> CellGrid {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, vec![("dv-paris", 3)]),
            (5.0, 5.0, vec![("dv-paris", 1), ("dv-seine", 2)]),
            (50.0, 50.0, vec![("dv-tokyo", 5), ("dv-seine", 6)]),
            (-40.0, 170.0, vec![("dv-kiwi", 1), ("dv-fern", 1)]),
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

    /// The query's word ratio matches the Paris cell, not the corpus as a
    /// whole, so smoothed cells elsewhere are not parallel to it.
    fn query(grid: &CellGrid) -> WordDist {
        let mut doc = WordDist::from_counts([("dv-paris", 2), ("dv-seine", 1)]);
        grid.prepare_document(&mut doc);
        doc
    }

    #[test]
    fn test_kl_ranks_matching_cell_first() {
        let grid = build_grid();
        let doc = query(&grid);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        for (partial, symmetric) in [(true, false), (false, false), (false, true), (true, true)] {
            let ranking = rank(&mut ctx, &doc, &KlDivergence::new(partial, symmetric));
            assert!(ranking.complete);
            assert_eq!(ranking.len(), 3);
            assert_eq!(ranking.best().unwrap().cell.index(), CellIndex::new(0, 0));
            let scores: Vec<f64> = ranking.iter().map(|e| e.score).collect();
            assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_cosine_ranks_matching_cell_first() {
        let grid = build_grid();
        let doc = query(&grid);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        for (partial, smoothed) in [(false, false), (true, false), (false, true), (true, true)] {
            let ranking = rank(&mut ctx, &doc, &CosineSimilarity::new(partial, smoothed));
            assert_eq!(
                ranking.best().unwrap().cell.index(),
                CellIndex::new(0, 0),
                "partial={} smoothed={}",
                partial,
                smoothed
            );
            assert!(ranking.iter().all(|e| e.score >= 0.0));
            assert!(ranking.entries[0].score < ranking.entries[1].score);
        }
    }

    #[test]
    fn test_expired_budget_returns_partial_ranking() {
        let grid = build_grid();
        let doc = query(&grid);
        let budget = crate::budget::StageBudget::new(Some(std::time::Duration::ZERO));
        let mut ctx = ScoringContext::new(&grid, &Config::default()).with_budget(budget);

        let ranking = rank(&mut ctx, &doc, &KlDivergence::new(true, false));
        assert!(!ranking.complete);
        assert!(ranking.is_empty());
    }
}

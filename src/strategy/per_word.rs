//! Average cell probability: projects the document onto the cells through
//! the per-word region posteriors.

use crate::distribution::WordDist;
use crate::strategy::{rank_by_posterior, Ranking, ScoringContext};

/// Ranks cells by the count-weighted average of the posteriors of the
/// document's words, most probable first.
pub fn rank<'g>(ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
    let grid = ctx.grid();
    let aggregate = ctx.cache_mut().get_region_dist_for_word_dist(grid, doc);
    rank_by_posterior(grid, &aggregate.ranked(), ctx.budget())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GridConfig};
    use crate::geo::{CellGrid, CellIndex, Coord, Document, Split};

    fn build_grid() -> CellGrid {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, vec![("pw-paris", 3), ("pw-seine", 1)]),
            (50.0, 50.0, vec![("pw-tokyo", 4), ("pw-fuji", 1)]),
            (-30.0, -60.0, vec![("pw-pampa", 2)]),
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

    #[test]
    fn test_average_cell_probability() {
        let grid = build_grid();
        let mut doc = WordDist::from_counts([("pw-paris", 2), ("pw-seine", 1)]);
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        let ranking = rank(&mut ctx, &doc);
        assert!(ranking.complete);
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking.best().unwrap().cell.index(), CellIndex::new(0, 0));

        let total: f64 = ranking.iter().map(|e| e.score).sum();
        assert!((total - 1.0).abs() < 1e-10);
        let scores: Vec<f64> = ranking.iter().map(|e| e.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        // Both words went through the cache.
        assert_eq!(ctx.cache().len(), 2);
        rank(&mut ctx, &doc);
        assert_eq!(ctx.cache().hits(), 2);
    }

    #[test]
    fn test_empty_document_ranks_every_cell() {
        let grid = build_grid();
        let mut doc = WordDist::new();
        grid.prepare_document(&mut doc);
        let mut ctx = ScoringContext::new(&grid, &Config::default());

        let ranking = rank(&mut ctx, &doc);
        assert!(ranking.complete);
        assert_eq!(ranking.len(), grid.num_nonempty_cells(true));
        assert_eq!(ranking.len(), 3);
        assert!(ranking.iter().all(|e| e.score == 0.0));
    }
}

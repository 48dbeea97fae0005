//! Per-word posteriors over cells.
//!
//! Inverting the cell word distributions gives, for a fixed word, a
//! distribution over the cells it was likely drawn from. Computing one
//! touches every non-empty cell, so they are memoized in an LRU cache.

use crate::cache::lru::LruCache;
use crate::distribution::{Word, WordDist};
use crate::geo::{CellGrid, CellIndex};
use log::warn;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A distribution over cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPosterior {
    word: Option<Word>,
    probs: BTreeMap<CellIndex, f64>,
    normalized: bool,
}

impl RegionPosterior {
    /// Normalizes `probs` in place when they have positive mass.
    fn from_raw(word: Option<Word>, mut probs: BTreeMap<CellIndex, f64>) -> Self {
        let total: f64 = probs.values().sum();
        let normalized = total > 0.0;
        if normalized {
            for p in probs.values_mut() {
                *p /= total;
            }
        }
        Self {
            word,
            probs,
            normalized,
        }
    }

    /// Posterior of `word` over the cells of a finalized grid with
    /// non-empty word distributions.
    pub fn for_word(grid: &CellGrid, word: Word) -> Self {
        let probs = grid
            .iter_nonempty_cells(true)
            .map(|cell| (cell.index(), cell.dist().lookup_word(word)))
            .collect();
        let posterior = Self::from_raw(Some(word), probs);
        if !posterior.normalized && !posterior.probs.is_empty() {
            warn!("Every cell gives word {:?} zero probability", word.text());
        }
        posterior
    }

    /// Probability of the cell at `index` (0 for unknown cells).
    pub fn prob(&self, index: CellIndex) -> f64 {
        self.probs.get(&index).copied().unwrap_or(0.0)
    }

    /// Cells by decreasing probability; ties in index order.
    pub fn ranked(&self) -> Vec<(CellIndex, f64)> {
        let mut ranked: Vec<(CellIndex, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Iterates over `(cell, probability)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, f64)> + '_ {
        self.probs.iter().map(|(&i, &p)| (i, p))
    }

    /// False if every cell had zero probability, leaving nothing to
    /// normalize by.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// The word this posterior belongs to; `None` for a whole-document
    /// aggregate.
    pub fn word(&self) -> Option<Word> {
        self.word
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// True if there are no cells.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
}

/// LRU cache of word posteriors for one grid.
///
/// Not shared between threads: each worker owns its own cache.
#[derive(Debug)]
pub struct RegionDistCache {
    cache: LruCache<Word, Arc<RegionPosterior>>,
}

impl RegionDistCache {
    /// Creates a cache holding up to `capacity` posteriors.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Posterior of `word`, computed on a miss.
    pub fn get(&mut self, grid: &CellGrid, word: Word) -> Arc<RegionPosterior> {
        if let Some(posterior) = self.cache.get(&word) {
            return Arc::clone(posterior);
        }
        let posterior = Arc::new(RegionPosterior::for_word(grid, word));
        self.cache.insert(word, Arc::clone(&posterior));
        posterior
    }

    /// Cached posterior of `word`, without computing it or refreshing its
    /// recency.
    pub fn peek(&self, word: Word) -> Option<&Arc<RegionPosterior>> {
        self.cache.peek(&word)
    }

    /// Projects a document onto the cells: the count-weighted sum of its
    /// words' posteriors, renormalized.
    pub fn get_region_dist_for_word_dist(
        &mut self,
        grid: &CellGrid,
        dist: &WordDist,
    ) -> RegionPosterior {
        // Every cell gets an entry, even if none of the document's words
        // reach it.
        let mut probs: BTreeMap<CellIndex, f64> = grid
            .iter_nonempty_cells(true)
            .map(|cell| (cell.index(), 0.0))
            .collect();

        // Sorted so the floating-point sums do not depend on hash order.
        let mut words: Vec<(Word, u32)> = dist.iter().collect();
        words.sort_unstable();

        for (word, count) in words {
            let posterior = self.get(grid, word);
            for (index, p) in posterior.iter() {
                *probs.entry(index).or_insert(0.0) += count as f64 * p;
            }
        }

        let aggregate = RegionPosterior::from_raw(None, probs);
        if !aggregate.normalized && !aggregate.is_empty() && !dist.is_empty() {
            warn!(
                "Document with {} tokens has zero probability in every cell",
                dist.total_tokens()
            );
        }
        aggregate
    }

    /// Number of cached posteriors.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of cached posteriors.
    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Cache hits so far.
    pub fn hits(&self) -> u64 {
        self.cache.hits()
    }

    /// Cache misses so far.
    pub fn misses(&self) -> u64 {
        self.cache.misses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::distribution::memo::intern;
    use crate::geo::{Coord, Document, Split};

    fn build_grid() -> CellGrid {
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        let docs = [
            (5.0, 5.0, vec![("rp-paris", 3), ("rp-seine", 1)]),
            (50.0, 50.0, vec![("rp-tokyo", 4), ("rp-seine", 1)]),
            (-30.0, 120.0, vec![("rp-sydney", 2), ("rp-harbour", 2)]),
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
    fn test_posterior_normalizes() {
        let grid = build_grid();
        let posterior = RegionPosterior::for_word(&grid, intern("rp-paris"));
        assert!(posterior.is_normalized());
        assert_eq!(posterior.len(), 3);
        let total: f64 = posterior.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-10);

        let ranked = posterior.ranked();
        assert_eq!(ranked[0].0, CellIndex::new(0, 0));
        assert_eq!(posterior.word(), Some(intern("rp-paris")));
    }

    #[test]
    fn test_unnormalized_when_all_zero() {
        // No global singletons, so words never seen in training get no mass.
        let mut grid = CellGrid::new(&GridConfig::new(10.0, 1)).unwrap();
        grid.add_document(&Document::new(
            "d",
            Coord::new(5.0, 5.0).unwrap(),
            Split::Training,
            WordDist::from_counts([("rp-z1", 2)]),
        ));
        grid.finalize(0);

        let posterior = RegionPosterior::for_word(&grid, intern("rp-z-unseen"));
        assert!(!posterior.is_normalized());
        assert_eq!(posterior.prob(CellIndex::new(0, 0)), 0.0);
    }

    #[test]
    fn test_cache_hits_and_peek() {
        let grid = build_grid();
        let mut cache = RegionDistCache::new(2);
        let paris = intern("rp-paris");

        assert!(cache.peek(paris).is_none());
        let a = cache.get(&grid, paris);
        let b = cache.get(&grid, paris);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert!(cache.peek(paris).is_some());
    }

    #[test]
    fn test_cache_eviction() {
        let grid = build_grid();
        let mut cache = RegionDistCache::new(2);
        let (w1, w2, w3) = (intern("rp-paris"), intern("rp-tokyo"), intern("rp-sydney"));

        cache.get(&grid, w1);
        cache.get(&grid, w2);
        cache.get(&grid, w1);
        cache.get(&grid, w3);

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(w1).is_some());
        assert!(cache.peek(w2).is_none());
        assert!(cache.peek(w3).is_some());
    }

    #[test]
    fn test_document_projection() {
        let grid = build_grid();
        let mut cache = RegionDistCache::new(10);
        let mut doc = WordDist::from_counts([("rp-paris", 2), ("rp-seine", 1)]);
        grid.prepare_document(&mut doc);

        let aggregate = cache.get_region_dist_for_word_dist(&grid, &doc);
        assert!(aggregate.is_normalized());
        assert!(aggregate.word().is_none());
        let total: f64 = aggregate.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-10);
        assert_eq!(aggregate.ranked()[0].0, CellIndex::new(0, 0));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_document_projection_covers_every_cell() {
        let grid = build_grid();
        let mut cache = RegionDistCache::new(10);
        let mut doc = WordDist::new();
        grid.prepare_document(&mut doc);

        let aggregate = cache.get_region_dist_for_word_dist(&grid, &doc);
        assert!(!aggregate.is_normalized());
        assert_eq!(aggregate.len(), 3);
        assert!(aggregate.iter().all(|(_, p)| p == 0.0));
        assert!(cache.is_empty());
    }
}

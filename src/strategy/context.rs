//! Per-worker mutable state used while ranking.

use crate::budget::StageBudget;
use crate::cache::{RegionDistCache, RegionPosterior};
use crate::config::Config;
use crate::distribution::Word;
use crate::geo::CellGrid;
use crate::strategy::toponym::{NoToponyms, ToponymResolver};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Everything a strategy may mutate while ranking, next to the shared,
/// read-only grid.
///
/// One context per worker thread: the posterior cache and the RNG are not
/// shared.
#[derive(Debug)]
pub struct ScoringContext<'g> {
    grid: &'g CellGrid,
    cache: RegionDistCache,
    rng: ChaCha8Rng,
    toponyms: Arc<dyn ToponymResolver>,
    budget: StageBudget,
}

impl<'g> ScoringContext<'g> {
    /// Creates a context over a finalized grid.
    ///
    /// # Panics
    ///
    /// If the grid has not been finalized.
    pub fn new(grid: &'g CellGrid, config: &Config) -> Self {
        assert!(
            grid.is_finalized(),
            "scoring context created before the cell grid was finalized"
        );
        let rng = match config.scoring.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            grid,
            cache: RegionDistCache::new(config.cache.lru_cache_size),
            rng,
            toponyms: Arc::new(NoToponyms),
            budget: StageBudget::new(config.scoring.stage_limit()),
        }
    }

    /// Replaces the toponym resolver.
    pub fn with_toponyms(mut self, toponyms: Arc<dyn ToponymResolver>) -> Self {
        self.toponyms = toponyms;
        self
    }

    /// Replaces the stage budget.
    pub fn with_budget(mut self, budget: StageBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Restarts the random number generator from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// The grid being ranked.
    #[inline]
    pub fn grid(&self) -> &'g CellGrid {
        self.grid
    }

    /// The posterior cache.
    pub fn cache(&self) -> &RegionDistCache {
        &self.cache
    }

    /// Mutable access to the posterior cache.
    pub fn cache_mut(&mut self) -> &mut RegionDistCache {
        &mut self.cache
    }

    /// Posterior of `word`, through the cache.
    pub fn posterior(&mut self, word: Word) -> Arc<RegionPosterior> {
        self.cache.get(self.grid, word)
    }

    /// The toponym resolver.
    pub fn toponyms(&self) -> &dyn ToponymResolver {
        self.toponyms.as_ref()
    }

    /// The stage budget.
    pub fn budget(&self) -> &StageBudget {
        &self.budget
    }

    /// The random number generator.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

//! # Gaia - Document Geolocation Engine
//!
//! Gaia predicts where a document was written about by comparing its word
//! distribution with the word distributions of regions of the earth.
//!
//! ## Overview
//!
//! The earth is tiled into a grid of square cells. Training documents with
//! known coordinates contribute their word counts to the cells around them.
//! Once every training document is in, the grid is finalized: cell
//! distributions are smoothed against corpus-wide statistics so that words a
//! cell has never seen still get a small probability. A new document is then
//! geolocated by ranking the cells against it.
//!
//! ## Key Features
//!
//! - **Smoothed word distributions** with a two-phase finish lifecycle
//! - **Overlapping multi-cells** aggregated from a tiling grid
//! - **Ranking strategies**: KL-divergence, cosine similarity, Naive Bayes,
//!   per-word region posteriors and several baselines
//! - **LRU-cached region posteriors** for words
//! - **Parallel batch ranking** with per-worker caches
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gaia::{CellGrid, Config, CorpusReader, ScoringContext, Strategy};
//!
//! let config = Config::default();
//! let docs = CorpusReader::new(&config).read_file("corpus.jsonl")?;
//!
//! let mut grid = CellGrid::new(&config.grid)?;
//! for doc in &docs {
//!     grid.add_document(doc);
//! }
//! grid.finalize(config.distribution.minimum_word_count);
//!
//! let mut query = docs[0].dist.clone();
//! grid.prepare_document(&mut query);
//!
//! let strategy = Strategy::from_config(&config.scoring)?;
//! let mut ctx = ScoringContext::new(&grid, &config);
//! let ranking = strategy.rank(&mut ctx, &query);
//! println!("best cell: {}", ranking.best().unwrap().cell.index());
//! ```
//!
//! ## Architecture
//!
//! - [`distribution`] - Word interning, word distributions, global statistics
//! - [`similarity`] - KL-divergence and cosine similarity
//! - [`geo`] - Coordinates, documents, cells and the cell grid
//! - [`cache`] - LRU cache of per-word region posteriors
//! - [`strategy`] - Cell ranking strategies
//! - [`batch`] - Parallel ranking of many documents
//! - [`text`] - Tokenization and normalization
//! - [`corpus`] - JSON-lines corpus reader

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod budget;
pub mod cache;
pub mod config;
pub mod corpus;
pub mod distribution;
pub mod error;
pub mod geo;
pub mod similarity;
pub mod strategy;
pub mod text;

// Re-export commonly used types
pub use batch::{prepare_documents, rank_documents, BatchRanker, BatchResult};
pub use budget::{StageBudget, StageProgress};
pub use cache::{LruCache, RegionDistCache, RegionPosterior};
pub use config::{
    CacheConfig, Config, DistributionConfig, GridConfig, NaiveBayesWeighting, ScoringConfig,
    TextConfig,
};
pub use corpus::CorpusReader;
pub use distribution::{DistState, GlobalStats, GlobalStatsBuilder, Word, WordDist};
pub use error::{GaiaError, Result};
pub use geo::{CellGrid, CellIndex, Coord, Document, GridSummary, MultiCell, Split};
pub use similarity::{CosineSimilarity, DistributionMeasure, KlDivergence};
pub use strategy::{
    BaselineStrategy, Gazetteer, NaiveBayes, RankedCell, Ranking, ScoringContext, Strategy,
    ToponymResolver,
};
pub use text::{Normalizer, Tokenizer};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

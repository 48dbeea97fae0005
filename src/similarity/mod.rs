//! Measures comparing a document distribution against a cell distribution.

pub mod cosine;
pub mod kl;

pub use cosine::CosineSimilarity;
pub use kl::KlDivergence;

use crate::distribution::WordDist;

/// A comparison between two word distributions used to rank cells.
pub trait DistributionMeasure {
    /// Raw value of the measure between a document and a cell.
    fn measure(&self, doc: &WordDist, cell: &WordDist) -> f64;

    /// Ranking score; lower is better.
    ///
    /// Default implementation: the raw measure.
    fn score(&self, doc: &WordDist, cell: &WordDist) -> f64 {
        self.measure(doc, cell)
    }
}

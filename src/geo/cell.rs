//! Tiling cells and the multi-cells built from them.

use crate::distribution::WordDist;
use crate::geo::document::Document;
use std::fmt;

/// Integer address of a cell: the indices of its southwest tiling cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex {
    /// Latitude index.
    pub lat: i32,
    /// Longitude index.
    pub long: i32,
}

impl CellIndex {
    /// Creates an index.
    #[inline]
    pub fn new(lat: i32, long: i32) -> Self {
        Self { lat, long }
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.lat, self.long)
    }
}

/// Document bookkeeping shared by tiling cells and multi-cells.
#[derive(Debug, Clone, Default)]
pub struct CellStats {
    /// Training documents whose counts went into the distribution.
    pub num_docs_for_word_dist: usize,
    /// All documents located in the cell, any split.
    pub num_docs_for_links: usize,
    /// Sum of the known incoming link counts.
    pub incoming_links: u64,
    /// Title and link count of the most linked-to document.
    pub most_popular: Option<(String, u64)>,
}

impl CellStats {
    fn consider_popular(&mut self, title: &str, links: u64) {
        let current = self.most_popular.as_ref().map_or(0, |(_, l)| *l);
        if links > current {
            self.most_popular = Some((title.to_string(), links));
        }
    }

    pub(crate) fn record(&mut self, doc: &Document) {
        self.num_docs_for_links += 1;
        if let Some(links) = doc.incoming_links {
            self.incoming_links += links;
            self.consider_popular(&doc.title, links);
        }
        if doc.is_training() {
            self.num_docs_for_word_dist += 1;
        }
    }

    pub(crate) fn merge(&mut self, other: &CellStats) {
        self.num_docs_for_word_dist += other.num_docs_for_word_dist;
        self.num_docs_for_links += other.num_docs_for_links;
        self.incoming_links += other.incoming_links;
        if let Some((title, links)) = &other.most_popular {
            self.consider_popular(title, *links);
        }
    }
}

/// The smallest square of the grid. Only lives until the grid is finalized.
#[derive(Debug, Clone)]
pub struct TilingCell {
    pub(crate) dist: WordDist,
    pub(crate) stats: CellStats,
}

impl TilingCell {
    pub(crate) fn new() -> Self {
        Self {
            dist: WordDist::new(),
            stats: CellStats::default(),
        }
    }

    /// Adds a document. Only training documents contribute word counts.
    pub(crate) fn add_document(&mut self, doc: &Document) {
        self.stats.record(doc);
        if doc.is_training() {
            self.dist.add_distribution(&doc.dist);
        }
    }
}

/// A `width x width` block of tiling cells sharing one word distribution.
///
/// This is the unit ranked against documents.
#[derive(Debug, Clone)]
pub struct MultiCell {
    index: CellIndex,
    dist: WordDist,
    stats: CellStats,
}

impl MultiCell {
    pub(crate) fn new(index: CellIndex) -> Self {
        Self {
            index,
            dist: WordDist::new(),
            stats: CellStats::default(),
        }
    }

    pub(crate) fn absorb(&mut self, tiling: &TilingCell) {
        self.dist.add_distribution(&tiling.dist);
        self.stats.merge(&tiling.stats);
    }

    pub(crate) fn dist_mut(&mut self) -> &mut WordDist {
        &mut self.dist
    }

    /// Index of the southwest tiling cell.
    #[inline]
    pub fn index(&self) -> CellIndex {
        self.index
    }

    /// The cell's word distribution.
    #[inline]
    pub fn dist(&self) -> &WordDist {
        &self.dist
    }

    /// Document bookkeeping.
    pub fn stats(&self) -> &CellStats {
        &self.stats
    }

    /// Training documents whose counts went into the distribution.
    pub fn num_docs_for_word_dist(&self) -> usize {
        self.stats.num_docs_for_word_dist
    }

    /// All documents located in the cell.
    pub fn num_docs_for_links(&self) -> usize {
        self.stats.num_docs_for_links
    }

    /// Sum of the known incoming link counts.
    pub fn incoming_links(&self) -> u64 {
        self.stats.incoming_links
    }

    /// Title and link count of the most linked-to document.
    pub fn most_popular_document(&self) -> Option<(&str, u64)> {
        self.stats
            .most_popular
            .as_ref()
            .map(|(title, links)| (title.as_str(), *links))
    }

    /// True if no document of any split falls in the cell.
    pub fn is_empty(&self) -> bool {
        self.stats.num_docs_for_links == 0
    }

    /// True if the word distribution has no tokens.
    pub fn is_empty_for_word_dist(&self) -> bool {
        self.dist.total_tokens() == 0
    }
}

impl fmt::Display for MultiCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MultiCell{}", self.index)?;
        if !self.dist.is_finished() {
            write!(f, ", unfinished")?;
        }
        if let Some((title, links)) = self.most_popular_document() {
            write!(f, ", most-popular {} ({} links)", title, links)?;
        }
        write!(
            f,
            ", {} docs(dist), {} docs(links), {} links",
            self.stats.num_docs_for_word_dist, self.stats.num_docs_for_links, self.stats.incoming_links
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coord, Split};

    fn doc(title: &str, split: Split, links: Option<u64>, words: &[(&str, u32)]) -> Document {
        let mut d = Document::new(
            title,
            Coord::new(0.0, 0.0).unwrap(),
            split,
            WordDist::from_counts(words.iter().copied()),
        );
        d.incoming_links = links;
        d
    }

    #[test]
    fn test_tiling_cell_counts_training_only() {
        let mut cell = TilingCell::new();
        cell.add_document(&doc("a", Split::Training, Some(5), &[("cell-x", 2)]));
        cell.add_document(&doc("b", Split::Test, Some(9), &[("cell-y", 4)]));
        cell.add_document(&doc("c", Split::Training, None, &[("cell-x", 1)]));

        assert_eq!(cell.dist.total_tokens(), 3);
        assert_eq!(cell.stats.num_docs_for_word_dist, 2);
        assert_eq!(cell.stats.num_docs_for_links, 3);
        assert_eq!(cell.stats.incoming_links, 14);
        assert_eq!(cell.stats.most_popular, Some(("b".to_string(), 9)));
    }

    #[test]
    fn test_multicell_absorb() {
        let mut t1 = TilingCell::new();
        t1.add_document(&doc("a", Split::Training, Some(3), &[("cell-z", 2)]));
        let mut t2 = TilingCell::new();
        t2.add_document(&doc("b", Split::Training, Some(7), &[("cell-z", 1)]));

        let mut mc = MultiCell::new(CellIndex::new(1, 2));
        assert!(mc.is_empty());
        mc.absorb(&t1);
        mc.absorb(&t2);

        assert!(!mc.is_empty());
        assert!(!mc.is_empty_for_word_dist());
        assert_eq!(mc.dist().total_tokens(), 3);
        assert_eq!(mc.num_docs_for_links(), 2);
        assert_eq!(mc.incoming_links(), 10);
        assert_eq!(mc.most_popular_document(), Some(("b", 7)));
        assert!(mc.to_string().starts_with("MultiCell(1,2), unfinished"));
    }
}

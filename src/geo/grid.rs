//! The cell grid: coordinate to cell mapping and multi-cell aggregation.
//!
//! Documents are filed into tiling cells as they are added. Multi-cells are
//! only recorded by index at that point; their distributions are summed from
//! the tiling cells they cover when the grid is finalized, so overlapping
//! multi-cells never share mutable state.
//!
//! Latitude indices are clamped at the poles. Longitude indices wrap around
//! the antimeridian.

use crate::budget::{StageBudget, StageProgress};
use crate::config::GridConfig;
use crate::distribution::{DistState, GlobalStats, GlobalStatsBuilder, WordDist};
use crate::error::Result;
use crate::geo::cell::{CellIndex, MultiCell, TilingCell};
use crate::geo::coord::{Coord, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};
use crate::geo::document::Document;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Slack, in index units, applied before flooring a coordinate so that the
/// corner coordinate of a cell maps back to that cell.
const INDEX_EPSILON: f64 = 1e-9;

/// Range of valid cell indices for a given cell size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    /// Southernmost latitude index.
    pub min_lat_index: i32,
    /// Northernmost latitude index.
    pub max_lat_index: i32,
    /// Westernmost longitude index.
    pub min_long_index: i32,
    /// Easternmost longitude index.
    pub max_long_index: i32,
}

impl GridBounds {
    /// Bounds for cells of `degrees_per_cell` degrees.
    pub fn for_cell_size(degrees_per_cell: f64) -> Self {
        let index = |v: f64| (v / degrees_per_cell).floor() as i32;
        Self {
            min_lat_index: index(MIN_LATITUDE),
            max_lat_index: index(MAX_LATITUDE - 1e-10),
            min_long_index: index(MIN_LONGITUDE),
            max_long_index: index(MAX_LONGITUDE - 1e-10),
        }
    }

    /// Number of latitude rows.
    pub fn num_lat_bins(&self) -> i32 {
        self.max_lat_index - self.min_lat_index + 1
    }

    /// Number of longitude columns.
    pub fn num_long_bins(&self) -> i32 {
        self.max_long_index - self.min_long_index + 1
    }

    /// Wraps a longitude index into range.
    #[inline]
    pub fn wrap_long(&self, long: i32) -> i32 {
        (long - self.min_long_index).rem_euclid(self.num_long_bins()) + self.min_long_index
    }

    /// Clamps a latitude index into range.
    #[inline]
    pub fn clamp_lat(&self, lat: i32) -> i32 {
        lat.clamp(self.min_lat_index, self.max_lat_index)
    }

    /// True if the latitude index lies in range.
    #[inline]
    pub fn contains_lat(&self, lat: i32) -> bool {
        (self.min_lat_index..=self.max_lat_index).contains(&lat)
    }

    /// Tiling cells covered by the `width` x `width` multi-cell whose
    /// southwest corner is `index`. Each appears once, even when the width
    /// exceeds the number of longitude columns.
    pub fn covered_tiling_indices(&self, index: CellIndex, width: i32) -> BTreeSet<CellIndex> {
        let mut covered = BTreeSet::new();
        for a in 0..width {
            let lat = index.lat + a;
            if lat > self.max_lat_index {
                break;
            }
            for b in 0..width {
                covered.insert(CellIndex::new(lat, self.wrap_long(index.long + b)));
            }
        }
        covered
    }
}

/// Totals reported when a grid is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridSummary {
    /// Multi-cells recorded.
    pub num_cells: usize,
    /// Multi-cells containing at least one document.
    pub num_nonempty_cells: usize,
    /// Multi-cells with a non-empty word distribution.
    pub num_cells_with_word_dist: usize,
    /// Documents added, any split.
    pub num_documents: usize,
    /// Training documents added.
    pub num_training_documents: usize,
    /// Distinct training words after pruning.
    pub vocabulary_size: u64,
    /// Training tokens after pruning.
    pub total_tokens: u64,
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cells:                     {}", self.num_cells)?;
        writeln!(f, "Non-empty cells:           {}", self.num_nonempty_cells)?;
        writeln!(f, "Cells with word dist:      {}", self.num_cells_with_word_dist)?;
        writeln!(f, "Documents:                 {}", self.num_documents)?;
        writeln!(f, "Training documents:        {}", self.num_training_documents)?;
        writeln!(f, "Vocabulary size:           {}", self.vocabulary_size)?;
        write!(f, "Training tokens:           {}", self.total_tokens)
    }
}

/// Tiling of the earth into cells, with one word distribution per multi-cell.
#[derive(Debug)]
pub struct CellGrid {
    degrees_per_cell: f64,
    width: i32,
    bounds: GridBounds,
    tiling: HashMap<CellIndex, TilingCell>,
    cells: BTreeMap<CellIndex, MultiCell>,
    global: Option<Arc<GlobalStats>>,
    minimum_word_count: u32,
    num_documents: usize,
    num_training_documents: usize,
    total_num_docs_for_links: usize,
    total_incoming_links: u64,
    summary: Option<GridSummary>,
}

impl CellGrid {
    /// Creates an empty grid.
    pub fn new(config: &GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            degrees_per_cell: config.degrees_per_cell,
            width: config.width_of_multi_cell as i32,
            bounds: GridBounds::for_cell_size(config.degrees_per_cell),
            tiling: HashMap::new(),
            cells: BTreeMap::new(),
            global: None,
            minimum_word_count: 0,
            num_documents: 0,
            num_training_documents: 0,
            total_num_docs_for_links: 0,
            total_incoming_links: 0,
            summary: None,
        })
    }

    /// Cell size in degrees.
    pub fn degrees_per_cell(&self) -> f64 {
        self.degrees_per_cell
    }

    /// Tiling cells on a side of a multi-cell.
    pub fn width_of_multi_cell(&self) -> usize {
        self.width as usize
    }

    /// Valid index range.
    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    #[inline]
    fn index_of(&self, degrees: f64) -> i32 {
        (degrees / self.degrees_per_cell + INDEX_EPSILON).floor() as i32
    }

    /// Index of the tiling cell containing `coord`.
    pub fn coord_to_tiling_index(&self, coord: &Coord) -> CellIndex {
        CellIndex::new(
            self.bounds.clamp_lat(self.index_of(coord.lat)),
            self.bounds.wrap_long(self.index_of(coord.long)),
        )
    }

    /// Index of the multi-cell centered on the tiling cell containing
    /// `coord`.
    pub fn coord_to_multicell_index(&self, coord: &Coord) -> CellIndex {
        let offset = (self.width - 1) as f64 / 2.0 * self.degrees_per_cell;
        CellIndex::new(
            self.bounds.clamp_lat(self.index_of(coord.lat - offset)),
            self.bounds.wrap_long(self.index_of(coord.long - offset)),
        )
    }

    /// Southwest corner of a cell.
    pub fn cell_to_coord(&self, index: CellIndex) -> Coord {
        self.offset_coord(index, 0.0)
    }

    /// Center of a multi-cell.
    pub fn multicell_center(&self, index: CellIndex) -> Coord {
        self.offset_coord(index, self.width as f64 / 2.0)
    }

    /// Northeast corner of a multi-cell, coerced into bounds.
    pub fn multicell_far_corner(&self, index: CellIndex) -> Coord {
        self.offset_coord(index, self.width as f64)
    }

    fn offset_coord(&self, index: CellIndex, offset: f64) -> Coord {
        Coord::coerced(
            (index.lat as f64 + offset) * self.degrees_per_cell,
            (index.long as f64 + offset) * self.degrees_per_cell,
        )
    }

    /// Wraps the longitude of an index; `None` if the latitude is off-grid.
    pub fn normalize_index(&self, index: CellIndex) -> Option<CellIndex> {
        if !self.bounds.contains_lat(index.lat) {
            return None;
        }
        Some(CellIndex::new(index.lat, self.bounds.wrap_long(index.long)))
    }

    fn assert_building(&self, op: &str) {
        assert!(
            self.global.is_none(),
            "{} called on a finalized cell grid",
            op
        );
    }

    fn assert_finalized(&self, op: &str) {
        assert!(
            self.global.is_some(),
            "{} called before the cell grid was finalized",
            op
        );
    }

    /// Files a document under its tiling cell and records every multi-cell
    /// covering that tiling cell.
    ///
    /// # Panics
    ///
    /// If the grid has been finalized.
    pub fn add_document(&mut self, doc: &Document) {
        self.assert_building("add_document");

        let tiling_index = self.coord_to_tiling_index(&doc.coord);
        self.tiling
            .entry(tiling_index)
            .or_insert_with(TilingCell::new)
            .add_document(doc);

        self.num_documents += 1;
        if doc.is_training() {
            self.num_training_documents += 1;
        }

        for a in 0..self.width {
            let lat = tiling_index.lat - a;
            if lat < self.bounds.min_lat_index {
                break;
            }
            for b in 0..self.width {
                let index = CellIndex::new(lat, self.bounds.wrap_long(tiling_index.long - b));
                self.cells
                    .entry(index)
                    .or_insert_with(|| MultiCell::new(index));
            }
        }
    }

    /// Adds documents until they run out or the budget expires.
    pub fn add_documents<'a, I>(&mut self, docs: I, budget: &StageBudget) -> StageProgress
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut processed = 0;
        for doc in docs {
            if budget.expired() {
                info!(
                    "Stopping grid population after {} documents ({:.1?})",
                    processed,
                    budget.elapsed()
                );
                return StageProgress {
                    processed,
                    complete: false,
                };
            }
            self.add_document(doc);
            processed += 1;
        }
        StageProgress {
            processed,
            complete: true,
        }
    }

    /// Looks up a multi-cell, creating an empty one if `create` is set.
    ///
    /// After finalization nothing is created: indices without a recorded
    /// cell return `None`.
    pub fn find_cell(&mut self, index: CellIndex, create: bool) -> Option<&MultiCell> {
        let index = self.normalize_index(index)?;
        if !self.cells.contains_key(&index) {
            if !create || self.is_finalized() {
                return None;
            }
            self.cells.insert(index, MultiCell::new(index));
        }
        self.cells.get(&index)
    }

    /// Looks up a multi-cell without creating it.
    pub fn cell(&self, index: CellIndex) -> Option<&MultiCell> {
        let index = self.normalize_index(index)?;
        self.cells.get(&index)
    }

    /// The multi-cell centered on the tiling cell containing `coord`.
    pub fn cell_for_coord(&self, coord: &Coord) -> Option<&MultiCell> {
        self.cells.get(&self.coord_to_multicell_index(coord))
    }

    /// Sums tiling cells into multi-cells, builds the global statistics and
    /// smooths every multi-cell distribution. The grid is read-only
    /// afterwards.
    ///
    /// # Panics
    ///
    /// If called twice.
    pub fn finalize(&mut self, minimum_word_count: u32) -> GridSummary {
        self.assert_building("finalize");

        self.tiling
            .par_iter_mut()
            .for_each(|(_, t)| t.dist.finish_before_global(minimum_word_count));

        let mut builder = GlobalStatsBuilder::new();
        for t in self.tiling.values() {
            builder.add(&t.dist);
        }
        let global = Arc::new(builder.build());

        let bounds = self.bounds;
        let width = self.width;
        let tiling = &self.tiling;
        self.cells.par_iter_mut().for_each(|(index, cell)| {
            for t_index in bounds.covered_tiling_indices(*index, width) {
                if let Some(t) = tiling.get(&t_index) {
                    cell.absorb(t);
                }
            }
            let dist = cell.dist_mut();
            dist.finish_before_global(minimum_word_count);
            dist.finish_after_global(global.clone());
            debug!("{}", cell);
        });

        self.tiling.clear();
        self.global = Some(global.clone());
        self.minimum_word_count = minimum_word_count;
        self.total_num_docs_for_links = self
            .iter_nonempty_cells(false)
            .map(|c| c.num_docs_for_links())
            .sum();
        self.total_incoming_links = self
            .iter_nonempty_cells(false)
            .map(|c| c.incoming_links())
            .sum();

        let summary = GridSummary {
            num_cells: self.cells.len(),
            num_nonempty_cells: self.num_nonempty_cells(false),
            num_cells_with_word_dist: self.num_nonempty_cells(true),
            num_documents: self.num_documents,
            num_training_documents: self.num_training_documents,
            vocabulary_size: global.total_types(),
            total_tokens: global.total_tokens(),
        };
        info!(
            "Finalized grid: {} non-empty cells ({} with word distributions), {} training documents, {} word types",
            summary.num_nonempty_cells,
            summary.num_cells_with_word_dist,
            summary.num_training_documents,
            summary.vocabulary_size
        );
        self.summary = Some(summary.clone());
        summary
    }

    /// True once [`finalize`](Self::finalize) has run.
    pub fn is_finalized(&self) -> bool {
        self.global.is_some()
    }

    /// Summary computed by [`finalize`](Self::finalize).
    pub fn summary(&self) -> Option<&GridSummary> {
        self.summary.as_ref()
    }

    /// Global statistics built at finalization.
    ///
    /// # Panics
    ///
    /// If the grid has not been finalized.
    pub fn global_stats(&self) -> &Arc<GlobalStats> {
        match &self.global {
            Some(global) => global,
            None => panic!("global_stats called before the cell grid was finalized"),
        }
    }

    /// Iterates over cells containing documents, in index order.
    ///
    /// With `require_nonempty_word_dist`, cells whose distribution has no
    /// tokens are skipped as well.
    ///
    /// # Panics
    ///
    /// If the grid has not been finalized.
    pub fn iter_nonempty_cells(
        &self,
        require_nonempty_word_dist: bool,
    ) -> impl Iterator<Item = &MultiCell> + '_ {
        self.assert_finalized("iter_nonempty_cells");
        self.cells.values().filter(move |cell| {
            if require_nonempty_word_dist {
                !cell.is_empty_for_word_dist()
            } else {
                !cell.is_empty()
            }
        })
    }

    /// Number of cells [`iter_nonempty_cells`](Self::iter_nonempty_cells)
    /// yields.
    pub fn num_nonempty_cells(&self, require_nonempty_word_dist: bool) -> usize {
        self.iter_nonempty_cells(require_nonempty_word_dist).count()
    }

    /// Sum of `num_docs_for_links` over non-empty cells.
    pub fn total_num_docs_for_links(&self) -> usize {
        self.assert_finalized("total_num_docs_for_links");
        self.total_num_docs_for_links
    }

    /// Sum of known incoming link counts over non-empty cells.
    pub fn total_incoming_links(&self) -> u64 {
        self.assert_finalized("total_incoming_links");
        self.total_incoming_links
    }

    /// Finishes a non-training document's distribution against the grid's
    /// global statistics so it can be ranked.
    ///
    /// # Panics
    ///
    /// If the grid has not been finalized or `dist` is already globally
    /// finished.
    pub fn prepare_document(&self, dist: &mut WordDist) {
        let global = self.global_stats();
        if dist.state() == DistState::Accumulating {
            dist.finish_before_global(self.minimum_word_count);
        }
        dist.finish_after_global(global.clone());
    }
}

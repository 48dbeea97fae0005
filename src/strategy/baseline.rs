//! Baselines: rankings that use cell popularity, chance, or a single word
//! of the document instead of comparing distributions.

use crate::distribution::{Word, WordDist};
use crate::error::{GaiaError, Result};
use crate::geo::{CellIndex, MultiCell};
use crate::strategy::toponym::adjusted_links;
use crate::strategy::{
    rank_by_posterior, rank_cells, RankedCell, Ranking, ScoringContext, SortOrder,
};
use log::{debug, warn};
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;

/// The baseline strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineStrategy {
    /// Cells by the incoming links of their documents.
    InternalLink,
    /// Cells by number of documents.
    NumDocuments,
    /// Cells in random order.
    Random,
    /// The region posterior of the document's most common place name.
    RegdistMostCommonToponym,
    /// The locations of the document's most common place name, most
    /// linked-to first, then the rest in random order.
    LinkMostCommonToponym,
}

impl BaselineStrategy {
    /// Parses a baseline name or alias.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "internal-link" | "link" => Ok(Self::InternalLink),
            "num-documents" | "num-docs" | "num-articles" | "numarts" => Ok(Self::NumDocuments),
            "random" => Ok(Self::Random),
            "regdist-most-common-toponym" => Ok(Self::RegdistMostCommonToponym),
            "link-most-common-toponym" => Ok(Self::LinkMostCommonToponym),
            other => Err(GaiaError::UnknownStrategy(other.to_string())),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InternalLink => "internal-link",
            Self::NumDocuments => "num-documents",
            Self::Random => "random",
            Self::RegdistMostCommonToponym => "regdist-most-common-toponym",
            Self::LinkMostCommonToponym => "link-most-common-toponym",
        }
    }

    /// Ranks the cells of the context's grid.
    pub fn rank<'g>(&self, ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
        let grid = ctx.grid();
        match self {
            Self::InternalLink => rank_cells(
                grid.iter_nonempty_cells(false),
                ctx.budget(),
                SortOrder::Descending,
                |cell| adjusted_links(Some(cell.incoming_links())),
            ),
            Self::NumDocuments => rank_cells(
                grid.iter_nonempty_cells(false),
                ctx.budget(),
                SortOrder::Descending,
                |cell| cell.num_docs_for_links() as f64,
            ),
            Self::Random => random_ranking(ctx),
            Self::RegdistMostCommonToponym => regdist_most_common_toponym(ctx, doc),
            Self::LinkMostCommonToponym => link_most_common_toponym(ctx, doc),
        }
    }
}

impl fmt::Display for BaselineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_capitalized(word: Word) -> bool {
    word.text().chars().next().is_some_and(char::is_uppercase)
}

/// Every non-empty cell once, shuffled, with score 0.
fn random_ranking<'g>(ctx: &mut ScoringContext<'g>) -> Ranking<'g> {
    let mut cells: Vec<&'g MultiCell> = ctx.grid().iter_nonempty_cells(false).collect();
    cells.shuffle(ctx.rng());
    // Equal scores: the stable sort keeps the shuffled order.
    rank_cells(cells, ctx.budget(), SortOrder::Descending, |_| 0.0)
}

fn regdist_most_common_toponym<'g>(ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
    let word = {
        let toponyms = ctx.toponyms();
        doc.find_most_common_word(|w| is_capitalized(w) && toponyms.is_toponym(&w.text()))
            .or_else(|| doc.find_most_common_word(is_capitalized))
            .or_else(|| doc.find_most_common_word(|_| true))
    };

    match word {
        Some(word) => {
            debug!("Ranking by region posterior of {:?}", word.text());
            let grid = ctx.grid();
            let posterior = ctx.posterior(word);
            rank_by_posterior(grid, &posterior.ranked(), ctx.budget())
        }
        None => random_ranking(ctx),
    }
}

fn link_most_common_toponym<'g>(ctx: &mut ScoringContext<'g>, doc: &WordDist) -> Ranking<'g> {
    let grid = ctx.grid();
    let mut candidates = {
        let toponyms = ctx.toponyms();
        let word = doc
            .find_most_common_word(|w| is_capitalized(w) && toponyms.is_toponym(&w.text()))
            .or_else(|| doc.find_most_common_word(|w| toponyms.is_toponym(&w.text())));
        match word {
            Some(w) => toponyms.candidates(&w.text()),
            None => Vec::new(),
        }
    };
    candidates.sort_by(|a, b| b.adjusted_links().total_cmp(&a.adjusted_links()));

    let mut seen: HashSet<CellIndex> = HashSet::new();
    let mut entries: Vec<RankedCell<'g>> = Vec::new();
    for candidate in &candidates {
        match grid.cell_for_coord(&candidate.coord) {
            Some(cell) => {
                if seen.insert(cell.index()) {
                    entries.push(RankedCell {
                        cell,
                        score: candidate.adjusted_links(),
                    });
                }
            }
            None => warn!(
                "No cell for candidate {} at {}; skipping",
                candidate.name, candidate.coord
            ),
        }
    }

    let rest = random_ranking(ctx);
    entries.extend(
        rest.entries
            .into_iter()
            .filter(|entry| seen.insert(entry.cell.index())),
    );
    Ranking {
        entries,
        complete: rest.complete,
    }
}

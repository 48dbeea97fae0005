//! Place-name lookup used by the toponym-driven baselines.

use crate::geo::{Coord, Document};
use std::collections::HashMap;
use std::fmt;

/// Link count substituted when a candidate's count is unknown or zero, so
/// that every candidate keeps a positive weight.
pub const MIN_ADJUSTED_LINKS: f64 = 0.01;

/// Incoming link count with unknown or zero mapped to a small positive value.
#[inline]
pub fn adjusted_links(links: Option<u64>) -> f64 {
    match links {
        Some(n) if n > 0 => n as f64,
        _ => MIN_ADJUSTED_LINKS,
    }
}

/// A location a place name may refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Name of the location.
    pub name: String,
    /// Where it is.
    pub coord: Coord,
    /// Popularity, if known.
    pub incoming_links: Option<u64>,
}

impl Candidate {
    /// [`adjusted_links`] of this candidate.
    pub fn adjusted_links(&self) -> f64 {
        adjusted_links(self.incoming_links)
    }
}

/// Resolves words to candidate locations.
pub trait ToponymResolver: Send + Sync + fmt::Debug {
    /// True if `word` names at least one known location.
    fn is_toponym(&self, word: &str) -> bool;

    /// Locations `word` may refer to.
    fn candidates(&self, word: &str) -> Vec<Candidate>;
}

/// A resolver that knows no place names.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToponyms;

impl ToponymResolver for NoToponyms {
    fn is_toponym(&self, _word: &str) -> bool {
        false
    }

    fn candidates(&self, _word: &str) -> Vec<Candidate> {
        Vec::new()
    }
}

/// Case-insensitive table of place names.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    by_name: HashMap<String, Vec<Candidate>>,
}

impl Gazetteer {
    /// Creates an empty gazetteer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses every document title as a place name for the document's
    /// location.
    pub fn from_documents<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut gazetteer = Self::new();
        for doc in docs {
            gazetteer.add(Candidate {
                name: doc.title.clone(),
                coord: doc.coord,
                incoming_links: doc.incoming_links,
            });
        }
        gazetteer
    }

    /// Adds a location under its lowercased name.
    pub fn add(&mut self, candidate: Candidate) {
        self.by_name
            .entry(candidate.name.to_lowercase())
            .or_default()
            .push(candidate);
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True if no names are known.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl ToponymResolver for Gazetteer {
    fn is_toponym(&self, word: &str) -> bool {
        self.by_name.contains_key(&word.to_lowercase())
    }

    fn candidates(&self, word: &str) -> Vec<Candidate> {
        self.by_name
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

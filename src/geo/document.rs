//! Geotagged documents.

use crate::distribution::WordDist;
use crate::error::{GaiaError, Result};
use crate::geo::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Corpus partition a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Contributes word counts to cells and to the global statistics.
    Training,
    /// Held out for tuning.
    Dev,
    /// Held out for evaluation.
    Test,
}

impl Split {
    /// The split's name as it appears in corpus files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Training => "training",
            Split::Dev => "dev",
            Split::Test => "test",
        }
    }
}

impl FromStr for Split {
    type Err = GaiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "training" => Ok(Split::Training),
            "dev" => Ok(Split::Dev),
            "test" => Ok(Split::Test),
            other => Err(GaiaError::Corpus(format!("unknown split: {}", other))),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document with a known location.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document title.
    pub title: String,
    /// Location of the document.
    pub coord: Coord,
    /// Corpus partition.
    pub split: Split,
    /// Number of links pointing at the document, if known.
    pub incoming_links: Option<u64>,
    /// The document's word counts.
    pub dist: WordDist,
}

impl Document {
    /// Creates a document with an unknown link count.
    pub fn new(title: impl Into<String>, coord: Coord, split: Split, dist: WordDist) -> Self {
        Self {
            title: title.into(),
            coord,
            split,
            incoming_links: None,
            dist,
        }
    }

    /// Sets the incoming link count.
    pub fn with_incoming_links(mut self, links: u64) -> Self {
        self.incoming_links = Some(links);
        self
    }

    /// True for training documents.
    pub fn is_training(&self) -> bool {
        self.split == Split::Training
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {} ({})", self.title, self.coord, self.split)?;
        if let Some(links) = self.incoming_links {
            write!(f, ", {} links", links)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parse() {
        assert_eq!("training".parse::<Split>().unwrap(), Split::Training);
        assert_eq!("dev".parse::<Split>().unwrap(), Split::Dev);
        assert_eq!("test".parse::<Split>().unwrap(), Split::Test);
        assert!(matches!("train".parse::<Split>(), Err(GaiaError::Corpus(_))));
        assert_eq!(Split::Dev.to_string(), "dev");
    }

    #[test]
    fn test_document() {
        let coord = Coord::new(48.85, 2.35).unwrap();
        let doc = Document::new("Paris", coord, Split::Training, WordDist::new())
            .with_incoming_links(12);
        assert!(doc.is_training());
        assert_eq!(doc.incoming_links, Some(12));
        assert_eq!(doc.to_string(), "Paris at (48.85,2.35) (training), 12 links");
    }
}

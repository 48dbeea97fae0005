//! JSON-lines corpus reader.
//!
//! One document per line:
//!
//! ```json
//! {"title": "Paris", "lat": 48.85, "long": 2.35, "split": "training",
//!  "text": "Paris is the capital of France", "incoming_links": 1200}
//! ```
//!
//! `split` defaults to `training` and `incoming_links` is optional.

use crate::config::Config;
use crate::error::{GaiaError, Result};
use crate::geo::{Coord, Document, Split};
use crate::text::{stopword_set, Tokenizer};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    title: String,
    lat: f64,
    long: f64,
    #[serde(default = "default_split")]
    split: Split,
    #[serde(default)]
    text: String,
    #[serde(default)]
    incoming_links: Option<u64>,
}

fn default_split() -> Split {
    Split::Training
}

/// Turns corpus lines into documents.
#[derive(Debug, Clone)]
pub struct CorpusReader {
    tokenizer: Tokenizer,
    ignore_case: bool,
    stopwords: HashSet<String>,
}

impl CorpusReader {
    /// Creates a reader using the text and distribution settings of `config`.
    pub fn new(config: &Config) -> Self {
        let ignore_case = config.distribution.ignore_case;
        Self {
            tokenizer: Tokenizer::new(config.text.clone()),
            ignore_case,
            stopwords: stopword_set(&config.text, ignore_case),
        }
    }

    /// Parses one line. `line_no` is 1-based and only used in errors.
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Document> {
        let record: CorpusRecord = serde_json::from_str(line)
            .map_err(|e| GaiaError::Corpus(format!("line {}: {}", line_no, e)))?;
        let coord = Coord::new(record.lat, record.long)?;
        let dist = self
            .tokenizer
            .word_dist(&record.text, self.ignore_case, &self.stopwords);

        let mut doc = Document::new(record.title, coord, record.split, dist);
        if let Some(links) = record.incoming_links {
            doc = doc.with_incoming_links(links);
        }
        Ok(doc)
    }

    /// Reads every non-blank line of a file.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Document>> {
        let reader = BufReader::new(File::open(path)?);
        let mut docs = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            docs.push(self.parse_line(&line, i + 1)?);
        }
        if docs.is_empty() {
            return Err(GaiaError::EmptyInput("corpus contains no documents".to_string()));
        }
        Ok(docs)
    }
}

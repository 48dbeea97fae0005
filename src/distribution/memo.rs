//! Word interning.
//!
//! Distributions store compact [`Word`] ids instead of strings. The table is
//! process-wide and append-only: ids are dense, assigned in first-seen order,
//! and never reused, so a `Word` stays valid for the life of the process.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Interned word identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Word(u32);

impl Word {
    /// Returns the raw id.
    #[inline]
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the word's text.
    pub fn text(self) -> String {
        WORDS.resolve(self)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Bidirectional string <-> id table.
#[derive(Debug, Default)]
struct WordTable {
    index_to_word: Vec<String>,
    word_to_index: HashMap<String, u32>,
}

#[derive(Debug, Default)]
struct SharedWordTable {
    inner: RwLock<WordTable>,
}

impl SharedWordTable {
    fn intern(&self, word: &str) -> Word {
        if let Some(w) = self.lookup(word) {
            return w;
        }

        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have won the race between the two locks.
        if let Some(&idx) = table.word_to_index.get(word) {
            return Word(idx);
        }
        let idx = table.index_to_word.len() as u32;
        table.index_to_word.push(word.to_string());
        table.word_to_index.insert(word.to_string(), idx);
        Word(idx)
    }

    fn lookup(&self, word: &str) -> Option<Word> {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        table.word_to_index.get(word).map(|&idx| Word(idx))
    }

    fn resolve(&self, word: Word) -> String {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        table
            .index_to_word
            .get(word.0 as usize)
            .cloned()
            .unwrap_or_else(|| panic!("word id {} was never interned", word.0))
    }

    fn len(&self) -> usize {
        let table = self.inner.read().unwrap_or_else(|e| e.into_inner());
        table.index_to_word.len()
    }
}

static WORDS: Lazy<SharedWordTable> = Lazy::new(SharedWordTable::default);

/// Interns `word`, returning its id.
pub fn intern(word: &str) -> Word {
    WORDS.intern(word)
}

/// Returns the id of `word` if it has been interned, without inserting it.
pub fn lookup(word: &str) -> Option<Word> {
    WORDS.lookup(word)
}

/// Number of distinct words interned so far.
pub fn interned_count() -> usize {
    WORDS.len()
}

//! Stopword lists.

use crate::config::TextConfig;
use crate::error::Result;
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// The configured stopwords as a lookup set.
///
/// With `ignore_case` the words are lowercased, since tokens are matched
/// after case folding.
pub fn stopword_set(config: &TextConfig, ignore_case: bool) -> HashSet<String> {
    config
        .stopwords
        .iter()
        .map(|w| if ignore_case { w.to_lowercase() } else { w.clone() })
        .collect()
}

/// Reads a stopword file, one word per line. Blank lines are skipped.
pub fn read_stopwords<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path.as_ref())?;
    let words: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    info!("Read {} stopwords from {}", words.len(), path.as_ref().display());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_stopword_set_folds_case() {
        let config = TextConfig {
            stopwords: vec!["The".to_string(), "of".to_string()],
            ..TextConfig::default()
        };
        let folded = stopword_set(&config, true);
        assert!(folded.contains("the"));
        assert!(!folded.contains("The"));

        let exact = stopword_set(&config, false);
        assert!(exact.contains("The"));
        assert!(exact.contains("of"));
    }

    #[test]
    fn test_read_stopwords() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "the\n\n  of  \nand").unwrap();
        let words = read_stopwords(file.path()).unwrap();
        assert_eq!(words, vec!["the", "of", "and"]);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_stopwords("/nonexistent/stopwords.txt").is_err());
    }
}

//! Per-token cleanup applied before counting.

use crate::config::TextConfig;
use unicode_normalization::UnicodeNormalization;

/// Applies the token filters of a [`TextConfig`].
///
/// Case is left alone: folding happens when tokens are counted, so the
/// toponym baselines can still see capitalisation when `ignore_case` is off.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: TextConfig,
}

impl Normalizer {
    /// Creates a new normalizer with the given configuration.
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Creates a normalizer with default configuration.
    pub fn default_config() -> Self {
        Self::new(TextConfig::default())
    }

    /// Normalizes a single token.
    ///
    /// Returns `None` if the token should be filtered out.
    pub fn normalize_token(&self, token: &str) -> Option<String> {
        let mut result: String = if self.config.unicode_normalize {
            token.nfc().collect()
        } else {
            token.to_string()
        };

        if self.config.remove_punctuation {
            result.retain(|c| !c.is_ascii_punctuation());
        }

        if self.config.remove_numbers && result.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let len = result.chars().count();
        if len == 0 || len < self.config.min_token_length || len > self.config.max_token_length {
            return None;
        }

        Some(result)
    }
}

//! Configuration for the Gaia geolocation engine.

use crate::error::{GaiaError, Result};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the Gaia engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cell grid configuration.
    pub grid: GridConfig,

    /// Word distribution configuration.
    pub distribution: DistributionConfig,

    /// Region posterior cache configuration.
    pub cache: CacheConfig,

    /// Strategy selection and parameters.
    pub scoring: ScoringConfig,

    /// Text processing configuration.
    pub text: TextConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section for values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;

        if self.cache.lru_cache_size == 0 {
            return Err(GaiaError::Config(
                "lru_cache_size must be at least 1".to_string(),
            ));
        }

        let bw = self.scoring.baseline_weight;
        if !(0.0..=1.0).contains(&bw) {
            return Err(GaiaError::Config(format!(
                "baseline_weight must lie in [0, 1], got {}",
                bw
            )));
        }

        if let Some(secs) = self.scoring.max_time_per_stage {
            if !secs.is_finite() || secs < 0.0 {
                return Err(GaiaError::Config(format!(
                    "max_time_per_stage must be a non-negative number of seconds, got {}",
                    secs
                )));
            }
        }

        Strategy::parse(&self.scoring.strategy, &self.scoring)?;

        if self.text.min_token_length > self.text.max_token_length {
            return Err(GaiaError::Config(
                "min_token_length exceeds max_token_length".to_string(),
            ));
        }

        Ok(())
    }
}

/// Cell grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Size of a tiling cell in degrees of latitude and longitude.
    /// Default: 1.0.
    pub degrees_per_cell: f64,

    /// Number of tiling cells on a side of a multi-cell.
    /// Default: 1.
    pub width_of_multi_cell: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            degrees_per_cell: 1.0,
            width_of_multi_cell: 1,
        }
    }
}

impl GridConfig {
    /// Creates a grid configuration.
    pub fn new(degrees_per_cell: f64, width_of_multi_cell: usize) -> Self {
        Self {
            degrees_per_cell,
            width_of_multi_cell,
        }
    }

    /// Rejects non-positive cell sizes and widths.
    pub fn validate(&self) -> Result<()> {
        if !self.degrees_per_cell.is_finite() || self.degrees_per_cell <= 0.0 {
            return Err(GaiaError::Config(format!(
                "degrees_per_cell must be positive, got {}",
                self.degrees_per_cell
            )));
        }
        if self.degrees_per_cell > 180.0 {
            return Err(GaiaError::Config(format!(
                "degrees_per_cell must not exceed 180, got {}",
                self.degrees_per_cell
            )));
        }
        if self.width_of_multi_cell == 0 {
            return Err(GaiaError::Config(
                "width_of_multi_cell must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Word distribution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Words occurring fewer times than this in a cell are dropped before
    /// smoothing. Values of 0 and 1 disable pruning.
    /// Default: 0.
    pub minimum_word_count: u32,

    /// Fold words to lowercase when building distributions.
    /// Default: true.
    pub ignore_case: bool,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            minimum_word_count: 0,
            ignore_case: true,
        }
    }
}

/// Region posterior cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of word posteriors held per cache.
    /// Default: 400.
    pub lru_cache_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { lru_cache_size: 400 }
    }
}

/// How Naive Bayes weighs word evidence against the cell prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NaiveBayesWeighting {
    /// Pure Naive Bayes: every word and the prior weigh 1.
    #[default]
    Equal,
    /// Words collectively weigh 1 (each word `1 / tokens`), the prior weighs
    /// `baseline_weight`.
    EqualWords,
}

/// Strategy selection and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Strategy name or alias.
    /// Default: "partial-kl-divergence".
    pub strategy: String,

    /// Baseline used when `strategy` is "baseline".
    /// Default: "internal-link".
    pub baseline_strategy: String,

    /// Weight of the cell prior in weighted Naive Bayes.
    /// Default: 0.5.
    pub baseline_weight: f64,

    /// Naive Bayes weighting scheme.
    /// Default: equal.
    pub naive_bayes_weighting: NaiveBayesWeighting,

    /// Seed for the random baseline.
    /// Default: None (entropy).
    pub seed: Option<u64>,

    /// Maximum seconds a grid population or scoring stage may run.
    /// Default: None (unbounded).
    pub max_time_per_stage: Option<f64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strategy: "partial-kl-divergence".to_string(),
            baseline_strategy: "internal-link".to_string(),
            baseline_weight: 0.5,
            naive_bayes_weighting: NaiveBayesWeighting::Equal,
            seed: None,
            max_time_per_stage: None,
        }
    }
}

impl ScoringConfig {
    /// Returns the stage time limit, if any. Invalid values mean no limit.
    pub fn stage_limit(&self) -> Option<Duration> {
        self.max_time_per_stage
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Text processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Minimum token length to include.
    /// Default: 1.
    pub min_token_length: usize,

    /// Maximum token length to include.
    /// Default: 50.
    pub max_token_length: usize,

    /// Remove punctuation from tokens.
    /// Default: true.
    pub remove_punctuation: bool,

    /// Remove numeric tokens.
    /// Default: false.
    pub remove_numbers: bool,

    /// Apply Unicode normalization (NFC).
    /// Default: false.
    pub unicode_normalize: bool,

    /// Words discarded when building distributions.
    /// Default: empty.
    pub stopwords: Vec<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            min_token_length: 1,
            max_token_length: 50,
            remove_punctuation: true,
            remove_numbers: false,
            unicode_normalize: false,
            stopwords: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.grid.degrees_per_cell, 1.0);
        assert_eq!(config.grid.width_of_multi_cell, 1);
        assert_eq!(config.cache.lru_cache_size, 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_grid() {
        assert!(GridConfig::new(0.0, 1).validate().is_err());
        assert!(GridConfig::new(-1.0, 1).validate().is_err());
        assert!(GridConfig::new(f64::NAN, 1).validate().is_err());
        assert!(GridConfig::new(1.0, 0).validate().is_err());
        assert!(GridConfig::new(0.5, 3).validate().is_ok());
    }

    #[test]
    fn test_invalid_scoring() {
        let mut config = Config::default();
        config.scoring.baseline_weight = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scoring.strategy = "no-such-strategy".to_string();
        assert!(matches!(
            config.validate(),
            Err(GaiaError::UnknownStrategy(_))
        ));

        let mut config = Config::default();
        config.cache.lru_cache_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"grid": {{"degrees_per_cell": 10.0}}, "scoring": {{"strategy": "nb-base", "naive_bayes_weighting": "equal-words"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.grid.degrees_per_cell, 10.0);
        assert_eq!(config.grid.width_of_multi_cell, 1);
        assert_eq!(config.scoring.strategy, "nb-base");
        assert_eq!(
            config.scoring.naive_bayes_weighting,
            NaiveBayesWeighting::EqualWords
        );
    }

    #[test]
    fn test_from_file_rejects_bad_grid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"grid": {{"degrees_per_cell": 0.0}}}}"#).unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(GaiaError::Config(_))
        ));
    }
}

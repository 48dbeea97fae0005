//! Error types for the Gaia geolocation engine.

use thiserror::Error;

/// The main error type for Gaia operations.
///
/// Only recoverable conditions are represented here. Calling an operation in
/// the wrong lifecycle state (querying a grid before it is finalized, mutating
/// a finished distribution) is a caller bug and panics instead.
#[derive(Error, Debug)]
pub enum GaiaError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A coordinate outside the representable range.
    #[error("Invalid coordinate: ({lat}, {long})")]
    InvalidCoordinate {
        /// Latitude in degrees.
        lat: f64,
        /// Longitude in degrees.
        long: f64,
    },

    /// Strategy name that does not match any known strategy.
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Malformed corpus input.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty input.
    #[error("Empty input: {0}")]
    EmptyInput(String),
}

/// Result type alias for Gaia operations.
pub type Result<T> = std::result::Result<T, GaiaError>;

// Error taxonomy for the banding pipeline
//
// Only configuration and storage failures are errors. An empty period or an
// inverted date range is a normal, empty answer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BandingError {
    /// rounding_unit or max_num_bands was zero or negative
    #[error("invalid banding configuration: {field} must be positive (got {value})")]
    InvalidConfiguration { field: &'static str, value: i64 },

    /// A stored transaction date could not be parsed
    #[error("invalid transaction date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Failure reported by the backing SQLite store
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, BandingError>;

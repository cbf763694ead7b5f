//! Error types for survey ingestion and analysis.

use thiserror::Error;

/// Result type for survey operations
pub type Result<T> = std::result::Result<T, SurveyError>;

/// Errors raised by the survey engine.
///
/// Empty groups and numerically degenerate comparisons are not errors: they
/// are encoded in the output data (dropped groups, `NaN` p-values).
#[derive(Error, Debug)]
pub enum SurveyError {
    /// A record is missing a required field or a field failed to parse
    #[error("Malformed survey record at line {line}: {reason}")]
    InputShape { line: u64, reason: String },

    /// The network generation label is not one of 2G, 3G or 4G
    #[error("Unknown network generation: {0:?}")]
    UnknownNetworkGeneration(String),

    /// The survey file name does not follow the `L<7 digits>.csv` convention
    #[error("Invalid survey file name: {0}")]
    InvalidFilename(String),

    /// The file ended before all header rows were read
    #[error("Missing header row {row}")]
    MissingHeader { row: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for market construction.
//!
//! Every variant is a configuration error: it is raised before the matching
//! loop starts and is never recovered from inside the engine.

use thiserror::Error;

/// Result type alias for dapmrs operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Which population a configuration value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Applicants,
    Reviewers,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Applicants => f.write_str("applicants"),
            Side::Reviewers => f.write_str("reviewers"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// A column implied by the configuration is absent from the input table.
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// Characteristic count outside the supported 2..=4 range.
    #[error("Invalid characteristic count for {side}: {count} (expected 2, 3 or 4)")]
    InvalidFeatureCount { side: Side, count: usize },

    #[error("Population size mismatch: {applicants} applicants vs {reviewers} reviewers")]
    PopulationSizeMismatch { applicants: usize, reviewers: usize },

    #[error("Cannot match an empty market")]
    EmptyPopulation,

    #[error("Column {column} has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Applicant bias characteristics must be exactly 0 or 1.
    #[error("Applicant {row} has bias characteristic {value}, expected 0 or 1")]
    InvalidBiasCharacteristic { row: usize, value: f64 },

    /// NaN or infinite cell in a column the market reads.
    #[error("Column {column} has a non-finite value at row {row}")]
    NonFiniteValue { column: String, row: usize },

    /// Agent ids must equal their position in the population.
    #[error("{side} agent at position {position} has id {id}")]
    IdMismatch { side: Side, position: usize, id: usize },

    #[error("{side} agent {row} carries a bias value but bias is disabled")]
    UnexpectedBias { side: Side, row: usize },
}

//! Unified error handling for the drive-metrics library.
//!
//! Every derivation is pure and local, so errors only ever describe bad input
//! (a missing or unparseable column, misaligned tables, an invalid
//! configuration) or a numeric condition the caller asked to be strict about.
//! Empty series are not errors: metrics over them degrade to defined defaults.

use thiserror::Error;

/// Unified error type for drive-metrics operations.
#[derive(Debug, Error)]
pub enum DriveMetricsError {
    /// A required column is missing or holds a value of the wrong type.
    #[error("Malformed {table} table, column '{column}': {message}")]
    MalformedInput {
        table: String,
        column: String,
        message: String,
    },

    /// A sample reported zero seconds since the previous one while the
    /// zero-elapsed policy is `Reject`.
    #[error("Sample {index} has zero elapsed time, acceleration is undefined")]
    ZeroElapsedTime { index: usize },

    /// Inertial and label tables are joined by row position and must match.
    #[error("Inertial series has {inertial_rows} rows but label series has {label_rows}")]
    LengthMismatch {
        inertial_rows: usize,
        label_rows: usize,
    },

    /// A label group names a flag column that the label table lacks.
    #[error("Label group '{group}' references unknown column '{column}'")]
    UnknownLabelColumn { group: String, column: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for drive-metrics operations.
pub type Result<T> = std::result::Result<T, DriveMetricsError>;

/// Extension trait for converting Option to DriveMetricsError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a missing-column error.
    fn ok_or_missing_column(self, table: &str, column: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_column(self, table: &str, column: &str) -> Result<T> {
        self.ok_or_else(|| DriveMetricsError::MalformedInput {
            table: table.to_string(),
            column: column.to_string(),
            message: "required column is missing".to_string(),
        })
    }
}

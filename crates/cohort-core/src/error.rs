use std::path::PathBuf;
use thiserror::Error;

use crate::models::YearMonth;

/// All errors produced by the cohort retention crates.
#[derive(Error, Debug)]
pub enum CohortError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be decoded.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// The input path does not exist.
    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    /// No CSV files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A transaction references a customer for whom no cohort anchor exists.
    #[error("No cohort anchor recorded for customer {customer}")]
    MissingAnchor { customer: String },

    /// A transaction is dated before its own customer's cohort anchor.
    #[error(
        "Transaction month {month} precedes cohort anchor {anchor} for customer {customer} (period index {period_index})"
    )]
    PeriodBeforeAnchor {
        customer: String,
        anchor: YearMonth,
        month: YearMonth,
        period_index: i64,
    },

    /// A period index does not fit the column type.
    #[error("Period index {0} is out of range")]
    PeriodOverflow(i64),

    /// A quantity sum does not fit in a `u64`. `period_index` is `None` for
    /// dataset-wide totals.
    #[error(
        "Quantity sum overflowed for cohort {anchor}{}",
        .period_index.map(|p| format!(" at period {p}")).unwrap_or_default()
    )]
    QuantityOverflow {
        anchor: YearMonth,
        period_index: Option<u32>,
    },

    /// Retention at period 1 was not exactly 1.0 for a cohort row.
    #[error("Retention for cohort {anchor} at period 1 is {value}, expected 1.0")]
    RetentionBaseline { anchor: YearMonth, value: f64 },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the cohort crates.
pub type Result<T> = std::result::Result<T, CohortError>;

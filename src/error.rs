//! Error types for the healthtrack application.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when loading the food reference table.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("food data file missing: {0}")]
    FileNotFound(String),

    #[error("cannot read file: {0}")]
    CannotRead(String),

    #[error("invalid Excel format: {0}")]
    InvalidFormat(String),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("invalid {column} value in row {row}: {value}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Errors caused by user input that fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown activity level: {0}")]
    UnknownActivityLevel(String),

    #[error("unknown gender: {0}")]
    UnknownSex(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("food item not found in reference table: {0}")]
    UnknownFood(String),
}

/// Errors that can occur in formula calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("daily calorie deficit or surplus must be non-zero, got {0}")]
    ZeroCalorieDelta(f64),
}

/// Reason a trend query over committed day summaries is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "error", content = "details")]
pub enum TrendError {
    /// Fewer committed summaries than the window requires.
    #[serde(rename = "insufficient_summaries")]
    #[error("need {required} saved days, found {available}")]
    InsufficientSummaries { available: usize, required: usize },

    /// The sample is too small for the test statistic to be defined.
    #[serde(rename = "degenerate_sample")]
    #[error("significance test needs at least {required} values, window is {window}")]
    DegenerateSample { window: usize, required: usize },
}

//! Error types for configuration loading and the analysis pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons the analysis pipeline stops before producing results.
#[derive(Debug, Error, PartialEq)]
pub enum AnalyzeError {
    /// Merge was asked to combine zero tables.
    #[error("no parsed tables to merge")]
    NothingToMerge,

    /// No text column with a name-like header was found and no manual choice was made.
    #[error("student name column not auto-detected; choose one of: {}", columns.join(", "))]
    IdentityUndetected { columns: Vec<String> },

    #[error("column '{column}' not found in dataset")]
    UnknownColumn { column: String },

    /// A manually chosen metric column holds text values.
    #[error("column '{column}' is not numeric and cannot be scored")]
    NonNumericMetric { column: String },

    /// A manual metric column shares its name with the derived total.
    #[error("column '{column}' clashes with the derived Total and cannot be a subject")]
    ReservedMetricName { column: String },

    #[error("no subject (numeric) columns detected")]
    NoMetricColumns,

    /// The chart metric is neither the total nor one of the scored columns.
    #[error("'{metric}' is not a selectable metric; choose one of: {}", choices.join(", "))]
    UnknownMetric { metric: String, choices: Vec<String> },

    #[error("top N must be between {min} and {max}, got {value}")]
    TopNOutOfRange { value: usize, min: usize, max: usize },

    #[error("top N must be at least 1")]
    InvalidTopN,
}

/// Errors raised while loading or validating an [`AnalyzerConfig`](crate::config::AnalyzerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown text encoding '{label}'")]
    UnknownEncoding { label: String },

    #[error("invalid top N bounds: min {min}, default {default}, max {max}")]
    InvalidTopNBounds {
        min: usize,
        default: usize,
        max: usize,
    },

    #[error("max score per subject must be positive, got {0}")]
    InvalidMaxScore(f64),
}

//! Tunable heuristics and limits for the analyzer.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//! ```json
//! {
//!   "classifier": { "identity_keywords": ["name", "pupil"] },
//!   "scoring": { "pass_threshold": 50.0 }
//! }
//! ```

use std::path::Path;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration, loaded from JSON or built with [`Default`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub ingest: IngestConfig,
    pub classifier: ClassifierConfig,
    pub scoring: ScoringConfig,
    pub controls: ControlsConfig,
    pub chart: ChartConfig,
}

impl AnalyzerConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest.resolved_encodings()?;

        let bounds = &self.controls.top_n;
        if bounds.min == 0 || bounds.min > bounds.default || bounds.default > bounds.max {
            return Err(ConfigError::InvalidTopNBounds {
                min: bounds.min,
                default: bounds.default,
                max: bounds.max,
            });
        }

        let max_score = self.scoring.max_score;
        if max_score.is_nan() || max_score <= 0.0 {
            return Err(ConfigError::InvalidMaxScore(self.scoring.max_score));
        }

        Ok(())
    }
}

/// How uploaded bytes are decoded and which cells count as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Encoding labels tried in order until one decodes and parses.
    pub encodings: Vec<String>,
    /// Cell texts read as missing values.
    pub missing_markers: Vec<String>,
}

impl IngestConfig {
    /// Maps each label to an `encoding_rs` encoding, failing on the first unknown label.
    pub fn resolved_encodings(&self) -> Result<Vec<&'static Encoding>, ConfigError> {
        self.encodings
            .iter()
            .map(|label| {
                Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
                    ConfigError::UnknownEncoding {
                        label: label.clone(),
                    }
                })
            })
            .collect()
    }

    pub fn is_missing_marker(&self, cell: &str) -> bool {
        self.missing_markers.iter().any(|m| m == cell)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            encodings: strings(&["utf-8", "latin1", "cp1252"]),
            missing_markers: strings(&[
                "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
                "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
            ]),
        }
    }
}

/// Keyword heuristics for picking the identity and metric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A text column whose lowercased name contains one of these labels the rows.
    pub identity_keywords: Vec<String>,
    /// A numeric column whose lowercased name contains one of these is not a subject.
    pub metric_exclusions: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            identity_keywords: strings(&["name", "student", "candidate", "learner", "person"]),
            metric_exclusions: strings(&["total", "percent", "percentage", "rank", "id", "roll"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Percentage at or above which a row passes.
    pub pass_threshold: f64,
    /// Highest attainable score in one subject.
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 40.0,
            max_score: 100.0,
        }
    }
}

/// Ranges and sizes for the interactive controls and tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub top_n: TopNBounds,
    pub preview_rows: usize,
    pub top_table_rows: usize,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            top_n: TopNBounds::default(),
            preview_rows: 10,
            top_table_rows: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopNBounds {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl TopNBounds {
    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

impl Default for TopNBounds {
    fn default() -> Self {
        Self {
            min: 3,
            max: 15,
            default: 5,
        }
    }
}

/// Pixel size of rendered chart images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

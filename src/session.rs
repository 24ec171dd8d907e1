//! Per-session state: the active dataset and the user's current choices.
//!
//! The dataset is replaced wholesale by each upload that yields at least one
//! parsed file. Every other interaction only changes the [`Selection`] and
//! re-runs the pipeline against the stored dataset.

use tracing::{info, warn};

use crate::analyzers::analyzer::{Analysis, Selection, analyze};
use crate::analyzers::types::MetricChoice;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::ingest::{UploadedFile, read_upload};
use crate::table::Table;

/// Which uploads were merged and which were dropped as unparseable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub parsed: Vec<String>,
    pub dropped: Vec<String>,
}

impl UploadSummary {
    pub fn is_success(&self) -> bool {
        !self.parsed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    config: AnalyzerConfig,
    dataset: Option<Table>,
    selection: Selection,
}

impl Session {
    pub fn new(config: AnalyzerConfig) -> Self {
        let selection = Selection::with_defaults(&config);
        Self {
            config,
            dataset: None,
            selection,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Table> {
        self.dataset.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Ingests and merges `files`.
    ///
    /// With at least one parsed file the merged table replaces the current
    /// dataset and column choices tied to the old dataset are reset. With none,
    /// the current dataset stays as it was.
    pub fn upload(&mut self, files: &[UploadedFile]) -> UploadSummary {
        let mut summary = UploadSummary::default();
        let mut tables = Vec::new();

        for file in files {
            match read_upload(file, &self.config.ingest) {
                Some(table) => {
                    summary.parsed.push(file.name.clone());
                    tables.push(table);
                }
                None => summary.dropped.push(file.name.clone()),
            }
        }

        if tables.is_empty() {
            warn!(files = files.len(), "No uploaded file could be parsed");
            return summary;
        }

        match Table::merge(tables) {
            Ok(merged) => {
                info!(
                    files = summary.parsed.len(),
                    dropped = summary.dropped.len(),
                    rows = merged.height(),
                    columns = merged.width(),
                    "Files uploaded and merged"
                );
                self.dataset = Some(merged);
                self.selection = Selection {
                    top_n: self.selection.top_n,
                    ..Selection::with_defaults(&self.config)
                };
            }
            Err(e) => warn!(error = %e, "Merge failed"),
        }

        summary
    }

    pub fn select_identity(&mut self, column: impl Into<String>) {
        self.selection.identity = Some(column.into());
    }

    pub fn select_metrics(&mut self, metrics: Option<Vec<String>>) {
        self.selection.metrics = metrics;
    }

    pub fn select_chart_metric(&mut self, metric: MetricChoice) {
        self.selection.chart_metric = metric;
    }

    /// Sets the number of individually shown rows, within the configured bounds.
    pub fn set_top_n(&mut self, top_n: usize) -> Result<(), AnalyzeError> {
        let bounds = self.config.controls.top_n;
        if !bounds.contains(top_n) {
            return Err(AnalyzeError::TopNOutOfRange {
                value: top_n,
                min: bounds.min,
                max: bounds.max,
            });
        }
        self.selection.top_n = top_n;
        Ok(())
    }

    /// Re-runs the pipeline on the stored dataset; `None` until an upload succeeds.
    pub fn run(&self) -> Option<Result<Analysis, AnalyzeError>> {
        let dataset = self.dataset.as_ref()?;
        Some(analyze(dataset, &self.selection, &self.config))
    }
}

use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::aggregate::score_table;
use crate::analyzers::classify::{resolve_identity, resolve_metrics};
use crate::analyzers::types::{MetricChoice, RankTable, Scoreboard};
use crate::charts::pie::{ChartArtifact, pass_fail, top_n_title, top_n_with_others};
use crate::config::AnalyzerConfig;
use crate::error::AnalyzeError;
use crate::table::{Table, Value};

/// User choices that drive one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Manual identity column; `None` means auto-detect.
    pub identity: Option<String>,
    /// Manual metric columns; `None` means auto-detect.
    pub metrics: Option<Vec<String>>,
    pub chart_metric: MetricChoice,
    pub top_n: usize,
}

impl Selection {
    /// Auto-detected columns, the total as chart metric and the default top N.
    pub fn with_defaults(config: &AnalyzerConfig) -> Self {
        Self {
            identity: None,
            metrics: None,
            chart_metric: MetricChoice::Total,
            top_n: config.controls.top_n.default,
        }
    }
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub identity: String,
    pub identity_detected: bool,
    pub metrics: Vec<String>,
    pub chart_metric: MetricChoice,
    pub top_n: usize,
    pub scoreboard: Scoreboard,
    pub metric_chart: ChartArtifact,
    pub pass_fail_chart: ChartArtifact,
    pub top_table: RankTable,
}

impl Analysis {
    /// Metrics selectable for the chart: the total first, then each subject.
    pub fn metric_choices(&self) -> Vec<MetricChoice> {
        metric_choices(&self.metrics)
    }
}

pub fn metric_choices(metrics: &[String]) -> Vec<MetricChoice> {
    std::iter::once(MetricChoice::Total)
        .chain(metrics.iter().cloned().map(MetricChoice::Column))
        .collect()
}

/// Runs classify → aggregate → charts → top table over `table`.
///
/// Pure apart from logging: the same inputs always give the same output and
/// `table` is never modified.
#[tracing::instrument(skip_all, fields(rows = table.height(), metric = %selection.chart_metric, top_n = selection.top_n))]
pub fn analyze(
    table: &Table,
    selection: &Selection,
    config: &AnalyzerConfig,
) -> Result<Analysis, AnalyzeError> {
    let bounds = config.controls.top_n;
    if !bounds.contains(selection.top_n) {
        return Err(AnalyzeError::TopNOutOfRange {
            value: selection.top_n,
            min: bounds.min,
            max: bounds.max,
        });
    }

    let identity = resolve_identity(table, selection.identity.as_deref(), &config.classifier)?;
    let metrics = resolve_metrics(table, selection.metrics.as_deref(), &config.classifier)?;

    let choices = metric_choices(&metrics);
    if !choices.contains(&selection.chart_metric) {
        return Err(AnalyzeError::UnknownMetric {
            metric: selection.chart_metric.to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
        });
    }

    let scoreboard = score_table(table, &identity.name, &metrics, &config.scoring)?;
    debug!(rows = scoreboard.rows.len(), "Scored rows");

    let values = scoreboard
        .metric_values(&selection.chart_metric)
        .ok_or_else(|| AnalyzeError::UnknownMetric {
            metric: selection.chart_metric.to_string(),
            choices: choices.iter().map(ToString::to_string).collect(),
        })?;
    let labels = scoreboard.rows.iter().map(|r| match &r.label {
        Value::Missing => None,
        label => Some(label.to_string()),
    });

    let metric_label = selection.chart_metric.label();
    let metric_chart = top_n_with_others(
        labels.zip(values),
        selection.top_n,
        &top_n_title(selection.top_n, metric_label),
    )?;
    let pass_fail_chart = pass_fail(&scoreboard.results());
    let top_table = scoreboard.top_rows(config.controls.top_table_rows);

    info!(
        identity = %identity.name,
        identity_detected = identity.detected,
        metrics = metrics.len(),
        "Analysis complete"
    );

    Ok(Analysis {
        identity: identity.name,
        identity_detected: identity.detected,
        metrics,
        chart_metric: selection.chart_metric.clone(),
        top_n: selection.top_n,
        scoreboard,
        metric_chart: ChartArtifact::metric(metric_label, metric_chart),
        pass_fail_chart: ChartArtifact::pass_fail(pass_fail_chart),
        top_table,
    })
}

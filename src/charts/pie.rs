use serde::Serialize;

use crate::analyzers::outcome::Outcome;
use crate::config::ChartConfig;
use crate::error::AnalyzeError;

pub const OTHERS_LABEL: &str = "Others";

const TOP_N_START_ANGLE: f64 = 140.0;
const PASS_FAIL_START_ANGLE: f64 = 90.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

/// A pie chart ready to render: slices in drawing order, counter-clockwise
/// from `start_angle` degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
    pub start_angle: f64,
}

impl PieChart {
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Share of the whole for each slice, in percent. All zero for an empty pie.
    pub fn percentages(&self) -> Vec<f64> {
        let total = self.total();
        self.slices
            .iter()
            .map(|s| {
                if total > 0.0 {
                    s.value / total * 100.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Percentages formatted to one decimal place, e.g. `"37.5%"`.
    pub fn percentage_labels(&self) -> Vec<String> {
        self.percentages()
            .into_iter()
            .map(|p| format!("{p:.1}%"))
            .collect()
    }
}

/// Builds a pie of the `top_n` largest values plus one `Others` slice for the rest.
///
/// Pairs with a missing label or value are dropped first. Values are sorted
/// descending with a stable sort, so equal values keep their input order. The
/// `Others` slice is added only when the remainder sums to more than zero.
pub fn top_n_with_others<I>(pairs: I, top_n: usize, title: &str) -> Result<PieChart, AnalyzeError>
where
    I: IntoIterator<Item = (Option<String>, Option<f64>)>,
{
    if top_n == 0 {
        return Err(AnalyzeError::InvalidTopN);
    }

    let mut present: Vec<(String, f64)> = pairs
        .into_iter()
        .filter_map(|(label, value)| Some((label?, value?)))
        .collect();
    present.sort_by(|a, b| b.1.total_cmp(&a.1));

    let rest = present.split_off(top_n.min(present.len()));
    let others_sum: f64 = rest.iter().map(|(_, v)| v).sum();

    let mut slices: Vec<PieSlice> = present
        .into_iter()
        .map(|(label, value)| PieSlice { label, value })
        .collect();
    if others_sum > 0.0 {
        slices.push(PieSlice {
            label: OTHERS_LABEL.to_string(),
            value: others_sum,
        });
    }

    Ok(PieChart {
        title: title.to_string(),
        slices,
        start_angle: TOP_N_START_ANGLE,
    })
}

/// Title of the metric pie, e.g. `Top 5 Students by Total`.
pub fn top_n_title(top_n: usize, metric: &str) -> String {
    format!("Top {top_n} Students by {metric}")
}

/// Builds a pie with one slice per outcome present, sized by row count.
///
/// Slices are ordered by count, largest first; on a tie Pass comes first.
pub fn pass_fail(results: &[Outcome]) -> PieChart {
    let mut counts: Vec<(Outcome, usize)> = [Outcome::Pass, Outcome::Fail]
        .into_iter()
        .map(|o| (o, results.iter().filter(|r| **r == o).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    PieChart {
        title: "Pass vs Fail Distribution".to_string(),
        slices: counts
            .into_iter()
            .map(|(o, n)| PieSlice {
                label: o.to_string(),
                value: n as f64,
            })
            .collect(),
        start_angle: PASS_FAIL_START_ANGLE,
    }
}

/// A chart paired with the file name it is offered for download under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartArtifact {
    pub file_name: String,
    pub chart: PieChart,
}

impl ChartArtifact {
    pub fn metric(metric: &str, chart: PieChart) -> Self {
        Self {
            file_name: format!("{metric}_pie.png"),
            chart,
        }
    }

    pub fn pass_fail(chart: PieChart) -> Self {
        Self {
            file_name: "pass_fail.png".to_string(),
            chart,
        }
    }

    pub fn to_png(&self, config: &ChartConfig) -> anyhow::Result<Vec<u8>> {
        super::render::render_png(&self.chart, config)
    }
}

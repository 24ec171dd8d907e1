use crate::analyzers::outcome::classify;
use crate::analyzers::types::{ScoredRow, Scoreboard};
use crate::analyzers::utility::{dense_rank, round_to};
use crate::config::ScoringConfig;
use crate::error::AnalyzeError;
use crate::table::{Table, Value};

/// Scores every row of `table` over the `metrics` columns.
///
/// - Total: sum of the metric cells, missing cells counted as 0.
/// - Percentage: Total over `max_score * metrics.len()`, as a percentage rounded to 2 places.
/// - Rank: dense rank by Percentage, highest first.
/// - Result: pass/fail against `pass_threshold`.
///
/// The input table is not modified.
pub fn score_table(
    table: &Table,
    identity: &str,
    metrics: &[String],
    scoring: &ScoringConfig,
) -> Result<Scoreboard, AnalyzeError> {
    if metrics.is_empty() {
        return Err(AnalyzeError::NoMetricColumns);
    }

    let identity_idx = column_index(table, identity)?;
    let metric_idx = metrics
        .iter()
        .map(|m| column_index(table, m))
        .collect::<Result<Vec<_>, _>>()?;

    let max_total = scoring.max_score * metrics.len() as f64;

    let mut rows: Vec<ScoredRow> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let scores: Vec<Value> = metric_idx.iter().map(|&i| row[i].clone()).collect();
            let total: f64 = scores.iter().filter_map(Value::as_number).sum();
            let percentage = round_to(total / max_total * 100.0, 2);

            ScoredRow {
                index,
                label: row[identity_idx].clone(),
                scores,
                total,
                percentage,
                rank: 0,
                result: classify(percentage, scoring.pass_threshold),
            }
        })
        .collect();

    let percentages: Vec<f64> = rows.iter().map(|r| r.percentage).collect();
    for (row, rank) in rows.iter_mut().zip(dense_rank(&percentages)) {
        row.rank = rank;
    }

    Ok(Scoreboard {
        identity: identity.to_string(),
        metrics: metrics.to_vec(),
        rows,
    })
}

fn column_index(table: &Table, name: &str) -> Result<usize, AnalyzeError> {
    table
        .column_index(name)
        .ok_or_else(|| AnalyzeError::UnknownColumn {
            column: name.to_string(),
        })
}

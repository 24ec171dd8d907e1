//! Data types produced by the scoring pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::analyzers::outcome::Outcome;
use crate::table::{Table, Value, format_number};

pub const TOTAL_COLUMN: &str = "Total";
pub const PERCENTAGE_COLUMN: &str = "Percentage";
pub const RANK_COLUMN: &str = "Rank";
pub const RESULT_COLUMN: &str = "Result";

/// The value a metric chart is drawn from: the row total or one subject column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MetricChoice {
    #[default]
    Total,
    Column(String),
}

impl MetricChoice {
    pub fn label(&self) -> &str {
        match self {
            MetricChoice::Total => TOTAL_COLUMN,
            MetricChoice::Column(name) => name,
        }
    }
}

impl fmt::Display for MetricChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == TOTAL_COLUMN {
            MetricChoice::Total
        } else {
            MetricChoice::Column(s.to_string())
        })
    }
}

impl Serialize for MetricChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One dataset row with its derived scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRow {
    /// Position of the row in the merged dataset.
    pub index: usize,
    pub label: Value,
    /// Metric cells in the scoreboard's metric order.
    pub scores: Vec<Value>,
    pub total: f64,
    pub percentage: f64,
    pub rank: u32,
    pub result: Outcome,
}

/// Derived Total, Percentage, Rank and Result for every row, in dataset order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoreboard {
    pub identity: String,
    pub metrics: Vec<String>,
    pub rows: Vec<ScoredRow>,
}

impl Scoreboard {
    /// Values of `choice` per row; `None` marks a missing cell.
    ///
    /// Returns `None` if `choice` names a column that was not scored.
    pub fn metric_values(&self, choice: &MetricChoice) -> Option<Vec<Option<f64>>> {
        match choice {
            MetricChoice::Total => Some(self.rows.iter().map(|r| Some(r.total)).collect()),
            MetricChoice::Column(name) => {
                let idx = self.metrics.iter().position(|m| m == name)?;
                Some(self.rows.iter().map(|r| r.scores[idx].as_number()).collect())
            }
        }
    }

    pub fn results(&self) -> Vec<Outcome> {
        self.rows.iter().map(|r| r.result).collect()
    }

    /// Rows ordered by rank ascending; rows sharing a rank keep dataset order.
    pub fn ranked(&self) -> Vec<&ScoredRow> {
        let mut rows: Vec<&ScoredRow> = self.rows.iter().collect();
        rows.sort_by_key(|r| r.rank);
        rows
    }

    /// The best `n` rows as `[Rank, <identity>, Total, Percentage, <metrics…>]`.
    pub fn top_rows(&self, n: usize) -> RankTable {
        let mut columns = vec![
            RANK_COLUMN.to_string(),
            self.identity.clone(),
            TOTAL_COLUMN.to_string(),
            PERCENTAGE_COLUMN.to_string(),
        ];
        columns.extend(self.metrics.iter().cloned());

        let rows = self
            .ranked()
            .into_iter()
            .take(n)
            .map(|r| {
                let mut cells = vec![
                    Value::Number(f64::from(r.rank)),
                    r.label.clone(),
                    Value::Number(r.total),
                    Value::Number(r.percentage),
                ];
                cells.extend(r.scores.iter().cloned());
                cells
            })
            .collect();

        RankTable { columns, rows }
    }

    /// Copy of `source` with Total, Percentage, Rank and Result appended.
    ///
    /// A derived name already taken by a source column gets a `.1`-style suffix.
    pub fn augment(&self, source: &Table) -> Table {
        let mut columns: Vec<String> = source.columns().to_vec();
        for name in [TOTAL_COLUMN, PERCENTAGE_COLUMN, RANK_COLUMN, RESULT_COLUMN] {
            let mut candidate = name.to_string();
            let mut suffix = 1;
            while columns.contains(&candidate) {
                candidate = format!("{name}.{suffix}");
                suffix += 1;
            }
            columns.push(candidate);
        }

        let mut table = Table::new(columns);
        for (row, scored) in source.rows().iter().zip(&self.rows) {
            let mut cells = row.clone();
            cells.push(Value::Number(scored.total));
            cells.push(Value::Number(scored.percentage));
            cells.push(Value::Number(f64::from(scored.rank)));
            cells.push(Value::Text(scored.result.to_string()));
            table.push_row(cells);
        }
        table
    }
}

/// A small display table of ranked rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RankTable {
    /// Cells rendered as display strings.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Value::Number(n) => format_number(*n),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}

//! In-memory tabular dataset built from uploaded score sheets.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::AnalyzeError;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Formats whole numbers without a fractional part and everything else with `f64`'s shortest form.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Inferred type of a column across all of its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// At least one number and no text.
    Numeric,
    /// At least one text cell.
    Text,
    /// No rows, or every cell missing.
    Empty,
}

/// Named columns with rows of cells aligned to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding it with missing cells up to the table width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        debug_assert!(row.len() <= self.columns.len());
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        let idx = self.column_index(name)?;
        Some(self.kind_at(idx))
    }

    fn kind_at(&self, idx: usize) -> ColumnKind {
        let mut saw_number = false;
        for row in &self.rows {
            match &row[idx] {
                Value::Text(_) => return ColumnKind::Text,
                Value::Number(_) => saw_number = true,
                Value::Missing => {}
            }
        }
        if saw_number {
            ColumnKind::Numeric
        } else {
            ColumnKind::Empty
        }
    }

    /// Columns paired with their inferred kind, in table order.
    pub fn column_kinds(&self) -> Vec<(&str, ColumnKind)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), self.kind_at(idx)))
            .collect()
    }

    /// Copy of the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Concatenates tables row-wise, aligning cells by column name.
    ///
    /// The result has the union of all columns in first-seen order and every
    /// input row in input order; cells a table lacks are [`Value::Missing`].
    pub fn merge<I>(tables: I) -> Result<Table, AnalyzeError>
    where
        I: IntoIterator<Item = Table>,
    {
        let tables: Vec<Table> = tables.into_iter().collect();
        if tables.is_empty() {
            return Err(AnalyzeError::NothingToMerge);
        }

        let mut columns: Vec<String> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for table in &tables {
            for name in &table.columns {
                if !positions.contains_key(name) {
                    positions.insert(name.clone(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let mut merged = Table::new(columns);
        merged.rows.reserve(tables.iter().map(Table::height).sum());

        for table in tables {
            let targets: Vec<usize> = table.columns.iter().map(|c| positions[c]).collect();
            for row in table.rows {
                let mut aligned = vec![Value::Missing; merged.width()];
                for (cell, &target) in row.into_iter().zip(&targets) {
                    if aligned[target].is_missing() {
                        aligned[target] = cell;
                    }
                }
                merged.rows.push(aligned);
            }
        }

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row);
        }
        t
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_merge_unions_columns_in_first_seen_order() {
        let a = table(
            &["Name", "Math"],
            vec![vec![text("A"), Value::Number(90.0)]],
        );
        let b = table(
            &["Name", "Science", "Math"],
            vec![vec![text("B"), Value::Number(35.0), Value::Number(40.0)]],
        );

        let merged = Table::merge(vec![a, b]).unwrap();

        assert_eq!(merged.columns(), &["Name", "Math", "Science"]);
        assert_eq!(
            merged.rows()[0],
            vec![text("A"), Value::Number(90.0), Value::Missing]
        );
        assert_eq!(
            merged.rows()[1],
            vec![text("B"), Value::Number(40.0), Value::Number(35.0)]
        );
    }

    #[test]
    fn test_merge_empty_input_fails() {
        assert_eq!(
            Table::merge(Vec::new()).unwrap_err(),
            AnalyzeError::NothingToMerge
        );
    }

    #[test]
    fn test_merge_keeps_empty_tables() {
        let a = table(&["Name"], vec![vec![text("A")]]);
        let merged = Table::merge(vec![Table::default(), a]).unwrap();
        assert_eq!(merged.height(), 1);
        assert_eq!(merged.columns(), &["Name"]);
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let t = table(&["A", "B", "C"], vec![vec![Value::Number(1.0)]]);
        assert_eq!(
            t.rows()[0],
            vec![Value::Number(1.0), Value::Missing, Value::Missing]
        );
    }

    #[test]
    fn test_column_kind() {
        let t = table(
            &["Name", "Score", "Blank", "Mixed"],
            vec![
                vec![text("A"), Value::Number(1.0), Value::Missing, Value::Number(3.0)],
                vec![text("B"), Value::Missing, Value::Missing, text("absent")],
            ],
        );
        assert_eq!(t.column_kind("Name"), Some(ColumnKind::Text));
        assert_eq!(t.column_kind("Score"), Some(ColumnKind::Numeric));
        assert_eq!(t.column_kind("Blank"), Some(ColumnKind::Empty));
        assert_eq!(t.column_kind("Mixed"), Some(ColumnKind::Text));
        assert_eq!(t.column_kind("Nope"), None);
    }

    #[test]
    fn test_head_copies_first_rows() {
        let t = table(
            &["N"],
            (0..15).map(|i| vec![Value::Number(i as f64)]).collect(),
        );
        let head = t.head(10);
        assert_eq!(head.height(), 10);
        assert_eq!(t.height(), 15);
        assert_eq!(head.rows()[9], vec![Value::Number(9.0)]);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(90.0).to_string(), "90");
        assert_eq!(Value::Number(87.5).to_string(), "87.5");
        assert_eq!(Value::Missing.to_string(), "");
        assert_eq!(text("Ana").to_string(), "Ana");
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        (
            proptest::sample::subsequence(vec!["a", "b", "c", "d", "e"], 0..=5),
            0usize..6,
        )
            .prop_map(|(cols, height)| {
                let width = cols.len();
                table(
                    &cols,
                    (0..height)
                        .map(|i| (0..width).map(|j| Value::Number((i * 10 + j) as f64)).collect())
                        .collect(),
                )
            })
    }

    proptest! {
        #[test]
        fn prop_merge_preserves_rows_and_unions_columns(tables in proptest::collection::vec(arb_table(), 1..5)) {
            let expected_rows: usize = tables.iter().map(Table::height).sum();
            let mut expected_cols: Vec<String> = Vec::new();
            for t in &tables {
                for c in t.columns() {
                    if !expected_cols.contains(c) {
                        expected_cols.push(c.clone());
                    }
                }
            }

            let merged = Table::merge(tables).unwrap();

            prop_assert_eq!(merged.height(), expected_rows);
            prop_assert_eq!(merged.columns(), expected_cols.as_slice());
            prop_assert!(merged.rows().iter().all(|r| r.len() == merged.width()));
        }
    }
}

//! Output formatting and persistence for analysis results.
//!
//! Supports terminal tables, JSON summaries, PNG chart files and a CSV export
//! of the full ranked dataset.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table as TermTable};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::analyzer::Analysis;
use crate::analyzers::types::{RankTable, Scoreboard};
use crate::charts::pie::ChartArtifact;
use crate::config::ChartConfig;
use crate::table::{Table, Value};

/// Serialized summary of one analysis run.
#[derive(Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub analysis: &'a Analysis,
}

/// Logs the analysis using Rust's debug pretty-print format.
pub fn print_pretty(analysis: &Analysis) {
    debug!("{:#?}", analysis);
}

/// Prints the analysis as pretty-printed JSON on stdout.
pub fn print_json(analysis: &Analysis) -> Result<()> {
    let report = Report {
        generated_at: Utc::now(),
        analysis,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cell(value: &Value) -> Cell {
    match value {
        Value::Number(_) => Cell::new(value).set_alignment(CellAlignment::Right),
        _ => Cell::new(value),
    }
}

fn styled(mut table: TermTable) -> TermTable {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Terminal table of the first `rows` rows of the merged dataset.
pub fn preview_table(dataset: &Table, rows: usize) -> TermTable {
    let mut table = TermTable::new();
    table.set_header(dataset.columns().iter().map(Cell::new));
    for row in dataset.rows().iter().take(rows) {
        table.add_row(row.iter().map(cell));
    }
    styled(table)
}

/// Terminal table of the top-ranked rows.
pub fn rank_table(ranked: &RankTable) -> TermTable {
    let mut table = TermTable::new();
    table.set_header(ranked.columns.iter().map(Cell::new));
    for row in &ranked.rows {
        table.add_row(row.iter().map(cell));
    }
    styled(table)
}

pub fn print_preview(dataset: &Table, rows: usize) {
    println!("{}", preview_table(dataset, rows));
}

pub fn print_top_table(ranked: &RankTable) {
    println!("{}", rank_table(ranked));
}

/// Replaces characters that cannot appear in a file name on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Renders `artifact` and writes it to `dir` under its suggested file name.
///
/// Creates `dir` if needed and returns the written path.
pub fn write_chart(dir: &Path, artifact: &ChartArtifact, config: &ChartConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let png = artifact.to_png(config)?;
    let path = dir.join(sanitize_file_name(&artifact.file_name));
    std::fs::write(&path, png).with_context(|| format!("failed to write {}", path.display()))?;

    info!(path = %path.display(), "Chart written");
    Ok(path)
}

/// Writes the dataset with Total, Percentage, Rank and Result appended as CSV.
pub fn write_ranked_csv(path: &Path, scoreboard: &Scoreboard, dataset: &Table) -> Result<()> {
    let augmented = scoreboard.augment(dataset);
    debug!(path = %path.display(), rows = augmented.height(), "Writing ranked CSV");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(augmented.columns())?;
    for row in augmented.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::{Selection, analyze};
    use crate::config::AnalyzerConfig;
    use crate::ingest::read_table;

    fn dataset() -> Table {
        read_table(
            b"Name,Math,Science\nA,90,85\nB,40,35\nC,30,50\nD,70,60\n",
            &crate::config::IngestConfig::default(),
        )
        .unwrap()
    }

    fn analysis(table: &Table) -> Analysis {
        let config = AnalyzerConfig::default();
        analyze(table, &Selection::with_defaults(&config), &config).unwrap()
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&analysis(&dataset()));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&analysis(&dataset())).unwrap();
    }

    #[test]
    fn test_report_serializes_summary() {
        let table = dataset();
        let analysis = analysis(&table);
        let report = Report {
            generated_at: Utc::now(),
            analysis: &analysis,
        };
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["identity"], "Name");
        assert_eq!(json["chart_metric"], "Total");
        assert_eq!(json["metric_chart"]["file_name"], "Total_pie.png");
        assert_eq!(json["scoreboard"]["rows"][0]["result"], "Pass");
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn test_preview_table_limits_rows() {
        let rendered = preview_table(&dataset(), 2).to_string();
        assert!(rendered.contains("Science"));
        assert!(rendered.contains("A"));
        assert!(!rendered.contains("70"));
    }

    #[test]
    fn test_rank_table_has_rank_header() {
        let rendered = rank_table(&analysis(&dataset()).top_table).to_string();
        assert!(rendered.contains("Rank"));
        assert!(rendered.contains("Percentage"));
        assert!(rendered.contains("87.5"));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Math/Stats_pie.png"), "Math_Stats_pie.png");
        assert_eq!(sanitize_file_name("Total_pie.png"), "Total_pie.png");
    }

    #[test]
    fn test_write_chart_creates_png() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = analysis(&dataset());
        let config = ChartConfig {
            width: 300,
            height: 200,
        };

        let path = write_chart(&dir.path().join("charts"), &analysis.pass_fail_chart, &config).unwrap();

        assert!(path.ends_with("pass_fail.png"));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_write_ranked_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranked.csv");
        let table = dataset();
        let analysis = analysis(&table);

        write_ranked_csv(&path, &analysis.scoreboard, &table).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Name,Math,Science,Total,Percentage,Rank,Result");
        assert_eq!(lines[1], "A,90,85,175,87.5,1,Pass");
        assert_eq!(lines[2], "B,40,35,75,37.5,4,Fail");
    }
}

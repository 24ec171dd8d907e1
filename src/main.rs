//! CLI entry point for the score sheet analyzer.
//!
//! Provides subcommands for a one-shot analysis that writes chart images, a
//! quick inspection of how columns are classified, and an interactive
//! explorer that re-runs the analysis after every change.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use scoresheet_analyzer::analyzers::analyzer::Analysis;
use scoresheet_analyzer::analyzers::classify::{detect_identity_column, detect_metric_columns};
use scoresheet_analyzer::analyzers::types::MetricChoice;
use scoresheet_analyzer::config::AnalyzerConfig;
use scoresheet_analyzer::error::AnalyzeError;
use scoresheet_analyzer::explore::{ExploreCommand, HELP};
use scoresheet_analyzer::ingest::UploadedFile;
use scoresheet_analyzer::output::{
    print_json, print_pretty, print_preview, print_top_table, write_chart, write_ranked_csv,
};
use scoresheet_analyzer::session::{Session, UploadSummary};
use std::ffi::OsStr;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "scoresheet_analyzer")]
#[command(about = "Merge student score sheets, rank students and chart the results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// CSV score sheets to upload and merge
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// JSON file overriding the default heuristics and limits
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank students, print the top table and write both pie charts
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Column holding student names (skips auto-detection)
        #[arg(short, long)]
        name_column: Option<String>,

        /// Comma-separated subject columns (skips auto-detection)
        #[arg(long, value_delimiter = ',')]
        metrics: Option<Vec<String>>,

        /// Metric for the top-N pie: "Total" or a subject column
        #[arg(short, long, default_value = "Total")]
        metric: String,

        /// Number of students shown individually in the pie
        #[arg(short, long)]
        top_n: Option<usize>,

        /// Directory the chart images are written to
        #[arg(short, long, default_value = "charts")]
        out_dir: PathBuf,

        /// Also print the full analysis as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Optional: write the ranked dataset to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Preview the merged data and show which columns were detected
    Inspect {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Interactively change the chart metric, top N and name column
    Explore {
        #[command(flatten)]
        input: InputArgs,

        /// Directory the chart images are written to on `save`
        #[arg(short, long, default_value = "charts")]
        out_dir: PathBuf,
    },
    /// Print the default configuration as JSON
    DefaultConfig,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            name_column,
            metrics,
            metric,
            top_n,
            out_dir,
            json,
            csv,
        } => {
            let mut session = Session::new(load_config(input.config.as_deref())?);
            let summary = upload_files(&mut session, &input.files);
            report_upload(&summary);
            let Some(dataset) = session.dataset() else {
                bail!("none of the {} file(s) could be parsed", input.files.len());
            };
            print_preview(dataset, session.config().controls.preview_rows);

            if let Some(column) = name_column {
                session.select_identity(column);
            }
            session.select_metrics(metrics);
            session.select_chart_metric(metric.parse().unwrap_or_default());
            if let Some(n) = top_n {
                session.set_top_n(n)?;
            }

            let analysis = run_with_identity_prompt(&mut session)?;
            report_analysis(&analysis);
            print_pretty(&analysis);
            save_charts(&analysis, &out_dir, &session)?;

            if let (Some(path), Some(dataset)) = (csv, session.dataset()) {
                write_ranked_csv(&path, &analysis.scoreboard, dataset)?;
                println!("Ranked table written to {}", path.display());
            }

            if json {
                print_json(&analysis)?;
            }
        }
        Commands::Inspect { input } => {
            let mut session = Session::new(load_config(input.config.as_deref())?);
            let summary = upload_files(&mut session, &input.files);
            report_upload(&summary);
            let Some(dataset) = session.dataset() else {
                bail!("none of the {} file(s) could be parsed", input.files.len());
            };
            print_preview(dataset, session.config().controls.preview_rows);

            let classifier = &session.config().classifier;
            match detect_identity_column(dataset, &classifier.identity_keywords) {
                Some(column) => println!("Detected Student Name Column: {column}"),
                None => println!("Student name column not auto-detected"),
            }
            let metrics = detect_metric_columns(dataset, &classifier.metric_exclusions);
            if metrics.is_empty() {
                println!("No subject (numeric) columns detected.");
            } else {
                println!("Detected Subject Columns: {}", metrics.join(", "));
            }
        }
        Commands::Explore { input, out_dir } => {
            let mut session = Session::new(load_config(input.config.as_deref())?);
            let summary = upload_files(&mut session, &input.files);
            report_upload(&summary);
            if let Some(dataset) = session.dataset() {
                print_preview(dataset, session.config().controls.preview_rows);
            }
            explore(&mut session, &out_dir)?;
        }
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&AnalyzerConfig::default())?);
        }
    }

    Ok(())
}

/// Colored stderr logging plus a JSON rolling log file.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/scoresheet_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("scoresheet_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => {
            let config = AnalyzerConfig::load(path)?;
            info!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Reads `paths` from disk and uploads them; unreadable files count as dropped.
fn upload_files(session: &mut Session, paths: &[PathBuf]) -> UploadSummary {
    let mut unreadable = Vec::new();
    let uploads: Vec<UploadedFile> = paths
        .iter()
        .filter_map(|path| match UploadedFile::from_path(path) {
            Ok(upload) => Some(upload),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable file");
                unreadable.push(path.display().to_string());
                None
            }
        })
        .collect();

    let mut summary = session.upload(&uploads);
    summary.dropped.extend(unreadable);
    summary
}

fn report_upload(summary: &UploadSummary) {
    if summary.is_success() {
        println!("Files uploaded & merged successfully");
    }
    if !summary.dropped.is_empty() {
        println!("Skipped unreadable file(s): {}", summary.dropped.join(", "));
    }
}

/// Runs the pipeline, asking for the name column on the terminal if it cannot be detected.
fn run_with_identity_prompt(session: &mut Session) -> Result<Analysis> {
    loop {
        match session.run() {
            None => bail!("no dataset loaded"),
            Some(Ok(analysis)) => return Ok(analysis),
            Some(Err(AnalyzeError::IdentityUndetected { columns })) => {
                println!("Student name column not auto-detected");
                let column = prompt_column(&columns)?;
                session.select_identity(column);
            }
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

fn prompt_column(columns: &[String]) -> Result<String> {
    if columns.is_empty() {
        bail!("the merged dataset has no columns");
    }
    if !std::io::stdin().is_terminal() {
        bail!("student name column not auto-detected; pass --name-column with one of: {}", columns.join(", "));
    }

    for (i, column) in columns.iter().enumerate() {
        eprintln!("  {}) {column}", i + 1);
    }

    let stdin = std::io::stdin();
    loop {
        eprint!("Select Student Name Column Manually: ");
        std::io::stderr().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("no column selected");
        }
        let answer = line.trim();

        let chosen = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| columns.get(i))
            .or_else(|| columns.iter().find(|c| c.as_str() == answer));
        if let Some(column) = chosen {
            return Ok(column.clone());
        }
        eprintln!("'{answer}' is not one of the listed columns");
    }
}

fn report_analysis(analysis: &Analysis) {
    if analysis.identity_detected {
        println!("Detected Student Name Column: {}", analysis.identity);
    } else {
        println!("Using Student Name Column: {}", analysis.identity);
    }
    println!("Detected Subject Columns: {}", analysis.metrics.join(", "));

    let choices: Vec<String> = analysis
        .metric_choices()
        .iter()
        .map(MetricChoice::to_string)
        .collect();
    println!(
        "{} (metric choices: {})",
        analysis.metric_chart.chart.title,
        choices.join(", ")
    );

    let chart = &analysis.pass_fail_chart.chart;
    let shares: Vec<String> = chart
        .slices
        .iter()
        .zip(chart.percentage_labels())
        .map(|(slice, pct)| format!("{} {pct}", slice.label))
        .collect();
    println!("{}: {}", chart.title, shares.join(", "));

    println!("Top {} Students", analysis.top_table.rows.len());
    print_top_table(&analysis.top_table);
}

fn save_charts(analysis: &Analysis, out_dir: &Path, session: &Session) -> Result<()> {
    let chart_config = &session.config().chart;
    for artifact in [&analysis.metric_chart, &analysis.pass_fail_chart] {
        let path = write_chart(out_dir, artifact, chart_config)
            .with_context(|| format!("failed to save {}", artifact.file_name))?;
        println!("Chart saved to {}", path.display());
    }
    Ok(())
}

/// Reads explorer commands from stdin until `quit` or end of input.
fn explore(session: &mut Session, out_dir: &Path) -> Result<()> {
    println!("{HELP}");
    show(session);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = match ExploreCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            ExploreCommand::Quit => break,
            ExploreCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ExploreCommand::Upload(paths) => {
                let summary = upload_files(session, &paths);
                report_upload(&summary);
                if !summary.is_success() {
                    println!("No file could be parsed; keeping the current data");
                    continue;
                }
                if let Some(dataset) = session.dataset() {
                    print_preview(dataset, session.config().controls.preview_rows);
                }
            }
            ExploreCommand::Identity(column) => session.select_identity(column),
            ExploreCommand::Metric(metric) => session.select_chart_metric(metric),
            ExploreCommand::TopN(n) => {
                if let Err(e) = session.set_top_n(n) {
                    eprintln!("{e}");
                    continue;
                }
            }
            ExploreCommand::Show => {}
            ExploreCommand::Save => {
                match session.run() {
                    Some(Ok(analysis)) => save_charts(&analysis, out_dir, session)?,
                    Some(Err(e)) => eprintln!("{e}"),
                    None => eprintln!("upload a file first"),
                }
                continue;
            }
        }

        show(session);
    }

    Ok(())
}

fn show(session: &Session) {
    match session.run() {
        None => println!("No data yet; use 'upload <file>...'"),
        Some(Ok(analysis)) => report_analysis(&analysis),
        Some(Err(AnalyzeError::IdentityUndetected { columns })) => {
            println!("Student name column not auto-detected");
            println!("Choose one with 'name <column>': {}", columns.join(", "));
        }
        Some(Err(e)) => println!("{e}"),
    }
}

//! Command language of the interactive explorer.
//!
//! Each line typed by the user maps to one [`ExploreCommand`]; the CLI applies
//! it to the [`Session`](crate::session::Session) and re-runs the pipeline.

use std::path::PathBuf;

use crate::analyzers::types::MetricChoice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExploreCommand {
    /// Replace the dataset with newly uploaded files.
    Upload(Vec<PathBuf>),
    /// Choose the identity column by name.
    Identity(String),
    /// Choose the chart metric.
    Metric(MetricChoice),
    /// Choose how many rows the metric chart shows individually.
    TopN(usize),
    Show,
    /// Write both chart images to the output directory.
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  upload <file>...   replace the dataset with these CSV files
  name <column>      use <column> as the student name column
  metric <name>      chart 'Total' or one subject column
  top <n>            show the top <n> students in the metric chart
  show               print the current results
  save               write the chart images
  help               show this help
  quit               leave the explorer";

impl ExploreCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "upload" => {
                let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if files.is_empty() {
                    return Err("upload needs at least one file".to_string());
                }
                ExploreCommand::Upload(files)
            }
            "name" => ExploreCommand::Identity(required(rest, "name")?.to_string()),
            "metric" => {
                let name = required(rest, "metric")?;
                ExploreCommand::Metric(name.parse().unwrap_or_default())
            }
            "top" => {
                let n = required(rest, "top")?;
                let n = n
                    .parse::<usize>()
                    .map_err(|_| format!("'{n}' is not a whole number"))?;
                ExploreCommand::TopN(n)
            }
            "show" => ExploreCommand::Show,
            "save" => ExploreCommand::Save,
            "help" | "?" => ExploreCommand::Help,
            "quit" | "exit" | "q" => ExploreCommand::Quit,
            other => return Err(format!("unknown command '{other}', type 'help'")),
        };

        Ok(Some(command))
    }
}

fn required<'a>(arg: &'a str, command: &str) -> Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("{command} needs an argument"))
    } else {
        Ok(arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ExploreCommand::parse("metric Math").unwrap(),
            Some(ExploreCommand::Metric(MetricChoice::Column("Math".into())))
        );
        assert_eq!(
            ExploreCommand::parse("metric Total").unwrap(),
            Some(ExploreCommand::Metric(MetricChoice::Total))
        );
        assert_eq!(
            ExploreCommand::parse("  TOP 7 ").unwrap(),
            Some(ExploreCommand::TopN(7))
        );
        assert_eq!(
            ExploreCommand::parse("name Student Name").unwrap(),
            Some(ExploreCommand::Identity("Student Name".into()))
        );
        assert_eq!(
            ExploreCommand::parse("upload a.csv b.csv").unwrap(),
            Some(ExploreCommand::Upload(vec!["a.csv".into(), "b.csv".into()]))
        );
        assert_eq!(ExploreCommand::parse("q").unwrap(), Some(ExploreCommand::Quit));
        assert_eq!(ExploreCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(ExploreCommand::parse("top many").is_err());
        assert!(ExploreCommand::parse("metric").is_err());
        assert!(ExploreCommand::parse("upload").is_err());
        assert!(ExploreCommand::parse("dance").is_err());
    }
}

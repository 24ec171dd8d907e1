//! Name- and type-based heuristics for picking identity and metric columns.

use tracing::debug;

use crate::analyzers::types::TOTAL_COLUMN;
use crate::config::ClassifierConfig;
use crate::error::AnalyzeError;
use crate::table::{ColumnKind, Table};

/// The column used to label rows, and whether it was found automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityColumn {
    pub name: String,
    pub detected: bool,
}

fn name_matches(column: &str, keywords: &[String]) -> bool {
    let lowered = column.to_lowercase();
    keywords
        .iter()
        .any(|k| lowered.contains(k.to_lowercase().as_str()))
}

/// First text column whose name contains one of `keywords`.
pub fn detect_identity_column(table: &Table, keywords: &[String]) -> Option<String> {
    table
        .column_kinds()
        .into_iter()
        .find(|(name, kind)| *kind == ColumnKind::Text && name_matches(name, keywords))
        .map(|(name, _)| name.to_string())
}

/// Every numeric column whose name contains none of `exclusions`, in table order.
///
/// A column with only missing cells counts as numeric. A column named like the
/// derived total is never a metric.
pub fn detect_metric_columns(table: &Table, exclusions: &[String]) -> Vec<String> {
    table
        .column_kinds()
        .into_iter()
        .filter(|(name, kind)| {
            matches!(kind, ColumnKind::Numeric | ColumnKind::Empty)
                && *name != TOTAL_COLUMN
                && !name_matches(name, exclusions)
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Uses the manual choice when given, otherwise detection.
///
/// Fails with [`AnalyzeError::IdentityUndetected`] when neither yields a
/// column, so the caller can ask for one.
pub fn resolve_identity(
    table: &Table,
    manual: Option<&str>,
    config: &ClassifierConfig,
) -> Result<IdentityColumn, AnalyzeError> {
    if let Some(name) = manual {
        if table.column_index(name).is_none() {
            return Err(AnalyzeError::UnknownColumn {
                column: name.to_string(),
            });
        }
        return Ok(IdentityColumn {
            name: name.to_string(),
            detected: false,
        });
    }

    match detect_identity_column(table, &config.identity_keywords) {
        Some(name) => {
            debug!(column = %name, "Detected identity column");
            Ok(IdentityColumn {
                name,
                detected: true,
            })
        }
        None => Err(AnalyzeError::IdentityUndetected {
            columns: table.columns().to_vec(),
        }),
    }
}

/// Uses the manual metric list when given, otherwise detection.
///
/// Manual columns must exist, be numeric and not be named like the derived
/// total. An empty result is
/// [`AnalyzeError::NoMetricColumns`].
pub fn resolve_metrics(
    table: &Table,
    manual: Option<&[String]>,
    config: &ClassifierConfig,
) -> Result<Vec<String>, AnalyzeError> {
    let metrics = match manual {
        Some(names) => {
            for name in names {
                if name == TOTAL_COLUMN {
                    return Err(AnalyzeError::ReservedMetricName {
                        column: name.clone(),
                    });
                }
                match table.column_kind(name) {
                    None => {
                        return Err(AnalyzeError::UnknownColumn {
                            column: name.clone(),
                        });
                    }
                    Some(ColumnKind::Text) => {
                        return Err(AnalyzeError::NonNumericMetric {
                            column: name.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
            names.to_vec()
        }
        None => detect_metric_columns(table, &config.metric_exclusions),
    };

    if metrics.is_empty() {
        return Err(AnalyzeError::NoMetricColumns);
    }

    debug!(metrics = ?metrics, "Resolved metric columns");
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn sheet() -> Table {
        let mut t = Table::new(
            ["Roll No", "Class", "Student Name", "Math", "Science", "Total", "Grade Id"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        t.push_row(vec![
            Value::Number(1.0),
            Value::Text("7B".into()),
            Value::Text("Ana".into()),
            Value::Number(90.0),
            Value::Number(85.0),
            Value::Number(175.0),
            Value::Number(3.0),
        ]);
        t
    }

    #[test]
    fn test_detects_first_textual_name_column() {
        let config = ClassifierConfig::default();
        assert_eq!(
            detect_identity_column(&sheet(), &config.identity_keywords),
            Some("Student Name".to_string())
        );
    }

    #[test]
    fn test_numeric_name_column_is_not_identity() {
        let mut t = Table::new(vec!["Name".into(), "Learner".into()]);
        t.push_row(vec![Value::Number(5.0), Value::Text("Bo".into())]);
        let config = ClassifierConfig::default();
        assert_eq!(
            detect_identity_column(&t, &config.identity_keywords),
            Some("Learner".to_string())
        );
    }

    #[test]
    fn test_metric_detection_skips_excluded_names() {
        let config = ClassifierConfig::default();
        assert_eq!(
            detect_metric_columns(&sheet(), &config.metric_exclusions),
            vec!["Math", "Science"]
        );
    }

    #[test]
    fn test_keywords_match_case_insensitively() {
        let keywords = vec!["PUPIL".to_string()];
        let mut t = Table::new(vec!["pupil_label".into()]);
        t.push_row(vec![Value::Text("x".into())]);
        assert_eq!(
            detect_identity_column(&t, &keywords),
            Some("pupil_label".to_string())
        );
    }

    #[test]
    fn test_undetected_identity_lists_columns() {
        let mut t = Table::new(vec!["Pupil".into(), "Math".into()]);
        t.push_row(vec![Value::Text("Ana".into()), Value::Number(1.0)]);

        let err = resolve_identity(&t, None, &ClassifierConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AnalyzeError::IdentityUndetected {
                columns: vec!["Pupil".into(), "Math".into()]
            }
        );

        let manual = resolve_identity(&t, Some("Pupil"), &ClassifierConfig::default()).unwrap();
        assert_eq!(manual.name, "Pupil");
        assert!(!manual.detected);
    }

    #[test]
    fn test_manual_identity_must_exist() {
        let err = resolve_identity(&sheet(), Some("Nope"), &ClassifierConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::UnknownColumn { .. }));
    }

    #[test]
    fn test_no_metrics_is_an_error() {
        let mut t = Table::new(vec!["Name".into(), "Total".into()]);
        t.push_row(vec![Value::Text("Ana".into()), Value::Number(1.0)]);
        assert_eq!(
            resolve_metrics(&t, None, &ClassifierConfig::default()).unwrap_err(),
            AnalyzeError::NoMetricColumns
        );
    }

    #[test]
    fn test_manual_metrics_must_be_numeric() {
        let config = ClassifierConfig::default();
        let err = resolve_metrics(&sheet(), Some(&["Class".to_string()]), &config).unwrap_err();
        assert!(matches!(err, AnalyzeError::NonNumericMetric { column } if column == "Class"));

        let ok = resolve_metrics(&sheet(), Some(&["Grade Id".to_string()]), &config).unwrap();
        assert_eq!(ok, vec!["Grade Id"]);
    }

    #[test]
    fn test_manual_metric_cannot_shadow_total() {
        let config = ClassifierConfig::default();
        let err = resolve_metrics(&sheet(), Some(&["Total".to_string()]), &config).unwrap_err();
        assert_eq!(
            err,
            AnalyzeError::ReservedMetricName {
                column: "Total".into()
            }
        );
    }

    #[test]
    fn test_total_column_never_detected_without_exclusions() {
        assert_eq!(
            detect_metric_columns(&sheet(), &[]),
            vec!["Roll No", "Math", "Science", "Grade Id"]
        );
    }

    #[test]
    fn test_all_missing_column_is_a_metric_candidate() {
        let mut t = Table::new(vec!["Name".into(), "Math".into(), "Remarks".into()]);
        t.push_row(vec![Value::Text("A".into()), Value::Number(80.0), Value::Missing]);
        t.push_row(vec![Value::Text("B".into()), Value::Number(50.0), Value::Missing]);
        let config = ClassifierConfig::default();

        assert_eq!(
            detect_metric_columns(&t, &config.metric_exclusions),
            vec!["Math", "Remarks"]
        );
        assert_eq!(
            resolve_metrics(&t, Some(&["Remarks".to_string()]), &config).unwrap(),
            vec!["Remarks"]
        );
        assert_eq!(detect_identity_column(&t, &config.identity_keywords), Some("Name".into()));
    }
}

//! CSV ingestion with encoding fallback.
//!
//! Each upload is decoded with the configured encodings in order; the first
//! encoding under which the whole file decodes and parses wins. A file that
//! fails under every encoding is dropped, not reported as an error.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::config::IngestConfig;
use crate::table::{Table, Value};

/// Raw bytes of one uploaded file together with its display name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, naming the upload after its file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Parses an upload, returning `None` when no configured encoding yields a table.
#[tracing::instrument(skip_all, fields(file = %file.name, bytes = file.bytes.len()))]
pub fn read_upload(file: &UploadedFile, config: &IngestConfig) -> Option<Table> {
    let table = read_table(&file.bytes, config);
    if table.is_none() {
        warn!("File could not be parsed under any encoding, skipping");
    }
    table
}

/// Decodes and parses delimited text, trying each configured encoding in order.
pub fn read_table(bytes: &[u8], config: &IngestConfig) -> Option<Table> {
    let encodings = match config.resolved_encodings() {
        Ok(encodings) => encodings,
        Err(e) => {
            warn!(error = %e, "Invalid encoding list");
            return None;
        }
    };

    for encoding in encodings {
        let Some(text) = decode(bytes, encoding) else {
            debug!(encoding = encoding.name(), "Bytes are malformed for encoding");
            continue;
        };

        match parse_csv(&text, config) {
            Ok(table) => {
                debug!(
                    encoding = encoding.name(),
                    rows = table.height(),
                    columns = table.width(),
                    "Parsed CSV"
                );
                return Some(table);
            }
            Err(e) => debug!(encoding = encoding.name(), error = %e, "CSV parse failed"),
        }
    }

    None
}

fn decode<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Parses CSV text whose first record is the header.
///
/// Records shorter than the header are padded with missing cells; a longer
/// record fails the whole parse.
pub fn parse_csv(text: &str, config: &IngestConfig) -> Result<Table> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.is_empty() {
        return Ok(Table::default());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = normalize_headers(reader.headers()?.iter());
    let mut table = Table::new(headers);

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > table.width() {
            // +2: header line plus one-based numbering
            bail!(
                "line {} has {} fields, expected at most {}",
                idx + 2,
                record.len(),
                table.width()
            );
        }
        table.push_row(record.iter().map(|cell| parse_cell(cell, config)).collect());
    }

    Ok(table)
}

/// Names blank headers `Unnamed: <index>` and suffixes repeated names with `.1`, `.2`, …
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for (idx, name) in raw.enumerate() {
        let base = if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }

        seen.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

fn parse_cell(raw: &str, config: &IngestConfig) -> Value {
    if config.is_missing_marker(raw) {
        return Value::Missing;
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Missing;
    }

    match trimmed.parse::<f64>() {
        Ok(n) if !n.is_nan() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_read_utf8_table() {
        let table = read_table(
            "Name,Math,Science\nA,90,85\nB,40,35\n".as_bytes(),
            &IngestConfig::default(),
        )
        .unwrap();

        assert_eq!(table.columns(), &["Name", "Math", "Science"]);
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.rows()[0],
            vec![text("A"), Value::Number(90.0), Value::Number(85.0)]
        );
    }

    #[test]
    fn test_latin1_bytes_fall_back() {
        // "José" in ISO-8859-1 is not valid UTF-8
        let bytes = b"Name,Math\nJos\xe9,70\n";
        let table = read_table(bytes, &IngestConfig::default()).unwrap();

        assert_eq!(table.rows()[0][0], text("José"));
        assert_eq!(table.rows()[0][1], Value::Number(70.0));
    }

    #[test]
    fn test_all_encodings_fail_returns_none() {
        let config = IngestConfig {
            encodings: vec!["utf-8".to_string()],
            ..IngestConfig::default()
        };
        assert!(read_table(b"Name\nJos\xe9\n", &config).is_none());
    }

    #[test]
    fn test_overlong_record_fails_every_encoding() {
        let bytes = b"Name,Math\nA,90,extra\n";
        assert!(read_table(bytes, &IngestConfig::default()).is_none());
    }

    #[test]
    fn test_short_record_is_padded() {
        let table = read_table(b"Name,Math,Science\nA,90\n", &IngestConfig::default()).unwrap();
        assert_eq!(
            table.rows()[0],
            vec![text("A"), Value::Number(90.0), Value::Missing]
        );
    }

    #[test]
    fn test_missing_markers() {
        let table = read_table(
            b"Name,Math,Science,Art\nA,NA,,n/a\n",
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(
            table.rows()[0],
            vec![text("A"), Value::Missing, Value::Missing, Value::Missing]
        );
    }

    #[test]
    fn test_padded_numbers_parse() {
        let table = read_table(b"Name,Math\nA, 91.5 \n", &IngestConfig::default()).unwrap();
        assert_eq!(table.rows()[0][1], Value::Number(91.5));
    }

    #[test]
    fn test_bom_is_stripped() {
        let table = read_table(
            "\u{feff}Name,Math\nA,1\n".as_bytes(),
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(table.columns()[0], "Name");
    }

    #[test]
    fn test_empty_input_is_empty_table() {
        let table = read_table(b"", &IngestConfig::default()).unwrap();
        assert_eq!(table.width(), 0);
        assert_eq!(table.height(), 0);
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let table = read_table(b"Name,Math\n", &IngestConfig::default()).unwrap();
        assert_eq!(table.columns(), &["Name", "Math"]);
        assert_eq!(table.height(), 0);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = read_table(b"Name,Math,Math,,Math\n", &IngestConfig::default()).unwrap();
        assert_eq!(
            table.columns(),
            &["Name", "Math", "Math.1", "Unnamed: 3", "Math.2"]
        );
    }

    #[test]
    fn test_upload_from_path() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Name,Math\nA,1\n").unwrap();

        let upload = UploadedFile::from_path(file.path()).unwrap();
        let table = read_upload(&upload, &IngestConfig::default()).unwrap();
        assert_eq!(table.height(), 1);
    }
}

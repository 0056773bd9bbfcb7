//! Record formatting and persistence.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use cardex_core::{ExtractionReport, ExtractionResult, FieldKind, Verdict};

/// Column order of tabular exports.
pub const TABLE_COLUMNS: [FieldKind; 4] = [
    FieldKind::Name,
    FieldKind::FatherName,
    FieldKind::IdNumber,
    FieldKind::DateOfBirth,
];

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// One extracted record as written to disk.
#[derive(Debug, Serialize)]
pub struct Record<'a> {
    pub source: String,
    #[serde(flatten)]
    pub result: &'a ExtractionResult,
    pub verdict: Verdict,
    pub extracted_at: DateTime<Utc>,
}

impl<'a> Record<'a> {
    pub fn new(source: &Path, result: &'a ExtractionResult, verdict: Verdict) -> Self {
        Self {
            source: source.display().to_string(),
            result,
            verdict,
            extracted_at: Utc::now(),
        }
    }
}

pub fn format_record(record: &Record<'_>, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(std::slice::from_ref(&record.result)),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

/// Tabular export with a header row.
pub fn format_csv(results: &[&ExtractionResult]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    write_table(&mut wtr, results)?;
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Write a tabular export to `path`.
pub fn write_csv(path: &Path, results: &[&ExtractionResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_table(&mut wtr, results)?;
    wtr.flush()?;
    Ok(())
}

fn write_table<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    results: &[&ExtractionResult],
) -> anyhow::Result<()> {
    wtr.write_record(TABLE_COLUMNS.map(FieldKind::label))?;
    for result in results {
        wtr.write_record(TABLE_COLUMNS.map(|kind| result.value(kind)))?;
    }
    Ok(())
}

fn format_text(record: &Record<'_>) -> String {
    let mut output = String::new();

    for kind in TABLE_COLUMNS {
        let value = record.result.value(kind);
        let shown = if value.is_empty() { "-" } else { value };
        let flag = if record.result.unverified().contains(&kind) {
            " (unverified)"
        } else {
            ""
        };
        output.push_str(&format!("{:<14} {}{}\n", format!("{}:", kind.label()), shown, flag));
    }

    if !record.result.missing().is_empty() {
        output.push_str(&format!("\nMissing: {}\n", join_keys(record.result.missing())));
    }

    output
}

/// Comma-separated field keys.
pub fn join_keys<'a>(kinds: impl IntoIterator<Item = &'a FieldKind>) -> String {
    kinds
        .into_iter()
        .map(|k| k.key())
        .collect::<Vec<_>>()
        .join(",")
}

/// Human-readable verdict line.
pub fn describe_verdict(verdict: Verdict, result: &ExtractionResult) -> String {
    match verdict {
        Verdict::Complete => "All fields extracted".to_string(),
        Verdict::Incomplete => format!(
            "Incomplete record, unresolved: {}",
            join_keys(&result.unresolved())
        ),
        Verdict::RetryWithClearerImage => format!(
            "Too many unresolved fields ({}), retry with a clearer image",
            join_keys(&result.unresolved())
        ),
    }
}

/// Per-region lines for `--explain`.
pub fn explain(report: &ExtractionReport) -> Vec<String> {
    report
        .outcomes
        .iter()
        .map(|outcome| {
            let detail = match (&outcome.candidate, &outcome.error) {
                (_, Some(error)) => error.to_string(),
                (Some(candidate), None) => format!("{:?}", candidate.value),
                (None, None) => "no candidate".to_string(),
            };
            format!("#{} {}: {}", outcome.index, outcome.kind.key(), detail)
        })
        .collect()
}

/// Persist one record as `<dir>/<stem>.json`.
pub fn write_record_json(dir: &Path, stem: &str, record: &Record<'_>) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("{}.json", stem));
    fs::write(&path, serde_json::to_string_pretty(record)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardex_core::models::Resolution;
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractionResult {
        ExtractionResult::assemble([
            (FieldKind::Name, Resolution::verified("Rahul Kumar")),
            (FieldKind::IdNumber, Resolution::verified("ABCDE1234F")),
            (FieldKind::DateOfBirth, Resolution::verified("05/08/1990")),
        ])
    }

    #[test]
    fn test_csv_headers_and_order() {
        let result = sample();
        let csv = format_csv(&[&result]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Name,Father's Name,ID Number,DOB");
        assert_eq!(lines[1], "Rahul Kumar,,ABCDE1234F,05/08/1990");
    }

    #[test]
    fn test_json_record_flattens_result() {
        let result = sample();
        let record = Record::new(Path::new("front.jpg"), &result, Verdict::Incomplete);
        let json: serde_json::Value =
            serde_json::from_str(&format_record(&record, OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["source"], "front.jpg");
        assert_eq!(json["values"]["id_number"], "ABCDE1234F");
        assert_eq!(json["missing"], serde_json::json!(["father_name"]));
        assert_eq!(json["verdict"], "incomplete");
    }

    #[test]
    fn test_text_lists_missing() {
        let result = sample();
        let record = Record::new(Path::new("front.jpg"), &result, Verdict::Incomplete);
        let text = format_record(&record, OutputFormat::Text).unwrap();

        assert!(text.contains("Father's Name: -"));
        assert!(text.contains("Missing: father_name"));
    }
}

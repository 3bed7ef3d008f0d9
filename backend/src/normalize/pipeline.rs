//! CSV ingestion: parse, reconcile headers, normalize, with progress logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use alchemist::models::Client;
//! use alchemist::normalize::pipeline::ingest_file;
//!
//! let ingested = ingest_file::<Client>(Path::new("clients.csv"))?;
//! println!("{} clients, {} issues", ingested.result.mapped.len(), ingested.result.issues.len());
//! ```

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::{alias_table, map_and_normalize, CanonicalRecord, ColumnMapResult};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineResult;
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, ParseResult};

/// Upload metadata reported back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingested<T> {
    pub result: ColumnMapResult<T>,
    pub csv_info: CsvInfo,
}

pub fn ingest_file<T: CanonicalRecord>(path: &Path) -> PipelineResult<Ingested<T>> {
    log_info(format!("Reading {}", path.display()));
    let parsed = parse_csv_file_auto(path)?;
    Ok(ingest_parsed(parsed))
}

pub fn ingest_bytes<T: CanonicalRecord>(bytes: &[u8]) -> PipelineResult<Ingested<T>> {
    let parsed = parse_bytes_auto(bytes)?;
    Ok(ingest_parsed(parsed))
}

/// Ingest rows that were already parsed elsewhere.
pub fn ingest_records<T: CanonicalRecord>(records: Vec<Value>, headers: Vec<String>) -> Ingested<T> {
    ingest_parsed(ParseResult {
        records,
        encoding: "utf-8".to_string(),
        delimiter: ',',
        headers,
    })
}

fn ingest_parsed<T: CanonicalRecord>(parsed: ParseResult) -> Ingested<T> {
    let kind = T::KIND;
    log_info(format!("Ingesting {}", kind));
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.records.len()));

    let result: ColumnMapResult<T> = map_and_normalize(&parsed.records, &parsed.headers);

    let table = alias_table(kind);
    for (original, canonical) in result.header_map.mapped(table) {
        log_info_indent(format!("{} → {}", original, canonical), 1);
    }
    let unmapped: Vec<&str> = result.header_map.unmapped(table).collect();
    if !unmapped.is_empty() {
        log_warning(format!("{} unmapped column(s): {}", unmapped.len(), unmapped.join(", ")));
    }

    if result.issues.is_empty() {
        log_success(format!("{} {} normalized", result.mapped.len(), kind));
    } else {
        log_warning(format!(
            "{} {} normalized, {} ingestion issue(s)",
            result.mapped.len(),
            kind,
            result.issues.len()
        ));
    }

    Ingested {
        csv_info: CsvInfo {
            encoding: parsed.encoding,
            delimiter: format_delimiter(parsed.delimiter).to_string(),
            headers: parsed.headers,
            row_count: parsed.records.len(),
        },
        result,
    }
}

fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, PipelineError};
    use crate::models::{Task, Worker};
    use std::io::Write;

    #[test]
    fn test_ingest_bytes_with_aliases() {
        let csv = "task_id;name;duration;skills;preferred\nT1;Weld;2;welding|cutting;1-3\n;Paint;1;painting;2";
        let ingested = ingest_bytes::<Task>(csv.as_bytes()).unwrap();

        assert_eq!(ingested.csv_info.delimiter, ";");
        assert_eq!(ingested.csv_info.row_count, 2);
        let tasks = &ingested.result.mapped;
        assert_eq!(tasks[0].required_skills, vec!["welding", "cutting"]);
        assert_eq!(tasks[0].preferred_phases, vec![1.0, 2.0, 3.0]);
        assert_eq!(ingested.result.issues.len(), 1);
        assert_eq!(ingested.result.issues[0].id, "tasks:1:TaskID");
    }

    #[test]
    fn test_ingest_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "WorkerID,Skills,AvailableSlots,MaxLoadPerPhase").unwrap();
        writeln!(file, "W1,\"welding,painting\",\"[1,2]\",2").unwrap();

        let ingested = ingest_file::<Worker>(file.path()).unwrap();
        let worker = &ingested.result.mapped[0];
        assert_eq!(worker.skills, vec!["welding", "painting"]);
        assert_eq!(worker.available_slots, vec![1.0, 2.0]);
    }

    #[test]
    fn test_ingest_empty_bytes_fails() {
        let err = ingest_bytes::<Task>(b"").unwrap_err();
        assert!(matches!(err, PipelineError::Csv(CsvError::EmptyFile)));
    }

    #[test]
    fn test_ingest_records() {
        let rows = vec![serde_json::json!({"TaskID": "T1", "Duration": 1})];
        let ingested = ingest_records::<Task>(rows, vec!["TaskID".into(), "Duration".into()]);
        assert_eq!(ingested.result.mapped[0].duration, 1.0);
        assert!(ingested.result.issues.is_empty());
    }
}

//! Normalization of uploaded rows into canonical records.
//!
//! # Flow
//!
//! ```text
//! rows + headers ──► reconcile_headers ──► map_row ──► from_row ──► ColumnMapResult<T>
//! ```
//!
//! - [`headers`] - alias tables and header reconciliation
//! - [`coerce`] - total cell coercion primitives
//! - [`records`] - per-entity row normalizers
//! - [`pipeline`] - CSV ingestion with logging
//!
//! Nothing here fails: a row without identifier is kept (with an empty id)
//! and reported as an error issue.

pub mod coerce;
pub mod headers;
pub mod pipeline;
pub mod records;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{Client, EntityKind, Task, Worker};
use crate::validation::ValidationIssue;

pub use headers::{alias_table, map_row, reconcile_headers, AliasTable, HeaderMap};
pub use records::{normalize_client, normalize_task, normalize_worker};

/// A canonical record type built from a canonical-keyed row.
pub trait CanonicalRecord: Clone + Serialize {
    const KIND: EntityKind;

    fn from_row(row: &Map<String, Value>) -> Self;

    fn identifier(&self) -> &str;
}

/// Records and ingestion issues of one upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapResult<T> {
    pub mapped: Vec<T>,
    pub issues: Vec<ValidationIssue>,
    pub header_map: HeaderMap,
}

impl<T> Default for ColumnMapResult<T> {
    fn default() -> Self {
        Self {
            mapped: Vec::new(),
            issues: Vec::new(),
            header_map: HeaderMap::default(),
        }
    }
}

/// Headers to reconcile: the given list, or the row keys in first-seen order.
fn effective_headers(rows: &[Value], headers: &[String]) -> Vec<String> {
    if !headers.is_empty() {
        return headers.to_vec();
    }
    let mut seen: Vec<String> = Vec::new();
    for key in rows.iter().filter_map(Value::as_object).flat_map(|o| o.keys()) {
        if !seen.contains(key) {
            seen.push(key.clone());
        }
    }
    seen
}

/// Reconcile headers, then normalize every row into `T`.
pub fn map_and_normalize<T: CanonicalRecord>(rows: &[Value], headers: &[String]) -> ColumnMapResult<T> {
    let header_map = reconcile_headers(&effective_headers(rows, headers), alias_table(T::KIND));

    let mapped: Vec<T> = rows.iter().map(|row| T::from_row(&map_row(row, &header_map))).collect();
    let issues = missing_identifier_issues(&mapped);

    ColumnMapResult {
        mapped,
        issues,
        header_map,
    }
}

/// One `Missing <IdField>` error per record whose identifier is empty.
///
/// Ids are `<entity>:<index>:<IdField>`, so the same row always yields the
/// same issue whether it comes from an upload or a later edit.
pub fn missing_identifier_issues<T: CanonicalRecord>(records: &[T]) -> Vec<ValidationIssue> {
    let kind = T::KIND;
    let field = kind.id_field();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.identifier().is_empty())
        .map(|(index, _)| {
            ValidationIssue::error(format!("{}:{}:{}", kind, index, field), kind, format!("Missing {}", field))
                .with_row_index(index)
                .with_column(field)
        })
        .collect()
}

pub fn map_clients(rows: &[Value], headers: &[String]) -> ColumnMapResult<Client> {
    map_and_normalize(rows, headers)
}

pub fn map_workers(rows: &[Value], headers: &[String]) -> ColumnMapResult<Worker> {
    map_and_normalize(rows, headers)
}

pub fn map_tasks(rows: &[Value], headers: &[String]) -> ColumnMapResult<Task> {
    map_and_normalize(rows, headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_aliased_headers_normalize() {
        let rows = vec![json!({"id": "T1", "name": "Weld", "phases": "2", "skills": "welding"})];
        let result = map_tasks(&rows, &headers(&["id", "name", "phases", "skills"]));

        assert!(result.issues.is_empty());
        let task = &result.mapped[0];
        assert_eq!(task.task_id, "T1");
        assert_eq!(task.task_name, "Weld");
        assert_eq!(task.duration, 2.0);
        assert_eq!(task.required_skills, vec!["welding"]);
        assert_eq!(result.header_map.canonical("phases"), "Duration");
    }

    #[test]
    fn test_missing_identifier_single_issue() {
        let rows = vec![
            json!({"ClientID": "C1", "PriorityLevel": "2"}),
            json!({"ClientID": "  ", "PriorityLevel": "3"}),
        ];
        let result = map_clients(&rows, &headers(&["ClientID", "PriorityLevel"]));

        assert_eq!(result.mapped.len(), 2);
        assert_eq!(result.mapped[1].client_id, "");
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.id, "clients:1:ClientID");
        assert_eq!(issue.message, "Missing ClientID");
        assert_eq!(issue.row_index, Some(1));
        assert!(issue.is_error());
    }

    #[test]
    fn test_headers_derived_from_rows() {
        let rows = vec![json!({"workerid": "W1", "skill": "a|b"})];
        let result = map_workers(&rows, &[]);
        assert_eq!(result.mapped[0].worker_id, "W1");
        assert_eq!(result.mapped[0].skills, vec!["a", "b"]);
        assert_eq!(result.header_map.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let result = map_workers(&[], &[]);
        assert!(result.mapped.is_empty());
        assert!(result.issues.is_empty());
        assert!(result.header_map.is_empty());
    }
}

//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{EntityKind, Rule, Task};
use crate::nl::TaskFilter;
use crate::normalize::pipeline::{CsvInfo, Ingested};
use crate::normalize::HeaderMap;
use crate::validation::{ValidationIssue, ValidationSummary};
use crate::workspace::Workspace;

/// Sent back after an upload replaced a collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// `ready` when nothing was reported, `warning` otherwise.
    pub status: String,
    pub entity: EntityKind,
    pub row_count: usize,
    pub csv_info: CsvInfo,
    pub header_map: HeaderMap,
    pub ingestion_issues: Vec<ValidationIssue>,
    pub validation: ValidationSummary,
}

impl IngestResponse {
    /// Describe an upload before it is stored. The validation summary is
    /// filled in by [`IngestResponse::with_validation`].
    pub fn new<T>(entity: EntityKind, ingested: &Ingested<T>) -> Self {
        let result = &ingested.result;
        Self {
            status: if result.issues.is_empty() { "ready" } else { "warning" }.to_string(),
            entity,
            row_count: result.mapped.len(),
            csv_info: ingested.csv_info.clone(),
            header_map: result.header_map.clone(),
            ingestion_issues: result.issues.clone(),
            validation: ValidationSummary::default(),
        }
    }

    pub fn with_validation(mut self, validation: ValidationSummary) -> Self {
        if validation.has_errors() {
            self.status = "warning".to_string();
        }
        self.validation = validation;
        self
    }
}

/// Cross-entity summary plus the rows currently missing their identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    #[serde(flatten)]
    pub summary: ValidationSummary,
    pub ingestion_issues: Vec<ValidationIssue>,
}

impl ValidationResponse {
    pub fn from_workspace(ws: &Workspace) -> Self {
        Self {
            summary: ws.summary().clone(),
            ingestion_issues: ws.ingestion_issues(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResponse {
    pub record: Value,
    pub validation: ValidationResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub ordered_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NlRulesRequest {
    pub input: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NlRulesResponse {
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NlSearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NlSearchResponse {
    pub filter: TaskFilter,
    pub results: Vec<Task>,
}

/// Error body shared by every route.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

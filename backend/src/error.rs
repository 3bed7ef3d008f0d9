//! Error types for the outer layers of Alchemist.
//!
//! The normalizer and the validator never fail: malformed data becomes
//! validation issues. Everything around them (file parsing, rule editing,
//! bundle import, export, configuration, HTTP) reports failures through:
//!
//! - [`CsvError`] - CSV parsing errors
//! - [`RuleError`] - Rule authoring errors
//! - [`BundleError`] - Rules bundle import errors
//! - [`ExportError`] - Cleaned export errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`PipelineError`] - Ingestion orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes.
    #[error("Failed to decode content as {encoding}: {message}")]
    EncodingError { encoding: String, message: String },

    /// Invalid CSV format.
    #[error("Line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Rule Errors
// =============================================================================

/// Errors while adding, removing or checking rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule content makes no sense.
    #[error("Invalid rule '{id}': {message}")]
    Invalid { id: String, message: String },

    /// Another rule already uses this id.
    #[error("Duplicate rule id: {0}")]
    DuplicateId(String),

    /// No rule with this id.
    #[error("Rule not found: {0}")]
    NotFound(String),
}

// =============================================================================
// Bundle Errors
// =============================================================================

/// Errors while importing a `{rules, priorities}` document.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Document does not match the embedded schema.
    #[error("Rules bundle does not match schema: {}", errors.join("; "))]
    SchemaError { errors: Vec<String> },

    /// JSON syntax or shape error.
    #[error("Rules bundle JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A rule in the bundle is rejected.
    #[error("Rules bundle contains an invalid rule: {0}")]
    Rule(#[from] RuleError),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing cleaned exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Export JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Ingestion orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity name not recognized.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Rule error.
    #[error("{0}")]
    Rule(#[from] RuleError),

    /// Bundle error.
    #[error("{0}")]
    Bundle(#[from] BundleError),

    /// Export error.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::UnknownEntity(_)) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Csv(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Rule(RuleError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Rule(_) | ServerError::Bundle(_) => StatusCode::BAD_REQUEST,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Export(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = crate::api::types::error_response(&self.to_string());
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError -> ServerError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let server_err: ServerError = pipeline_err.into();
        assert_eq!(server_err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rule_error_status() {
        let err: ServerError = RuleError::NotFound("r9".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("r9"));

        let err: ServerError = RuleError::DuplicateId("r1".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_schema_error_format() {
        let err = BundleError::SchemaError {
            errors: vec!["missing rules".into(), "bad type".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing rules; bad type"));
    }
}

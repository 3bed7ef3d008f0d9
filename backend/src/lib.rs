//! # Alchemist - spreadsheet ingestion, validation and rule authoring
//!
//! Alchemist takes loosely-structured client, worker and task spreadsheets,
//! turns them into canonical records, checks them against each other and
//! exports a cleaned bundle together with user-authored allocation rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌────────────┐   ┌───────────┐
//! │  CSV file │──▶│  Parser   │──▶│ Normalizer │──▶│ Validator  │──▶│  Export   │
//! │ (any enc) │   │(auto-enc) │   │ (aliases)  │   │(cross-ref) │   │(CSV+JSON) │
//! └───────────┘   └───────────┘   └────────────┘   └────────────┘   └───────────┘
//!                                        │                ▲
//!                                        ▼                │
//!                                  ┌──────────────────────┴──┐
//!                                  │ Workspace (rules, prios) │
//!                                  └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use alchemist::{ingest_file, validate, Client, Task, Worker};
//!
//! let clients = ingest_file::<Client>("clients.csv".as_ref())?.result.mapped;
//! let workers = ingest_file::<Worker>("workers.csv".as_ref())?.result.mapped;
//! let tasks = ingest_file::<Task>("tasks.csv".as_ref())?.result.mapped;
//!
//! let summary = validate(&clients, &workers, &tasks);
//! println!("{} errors", summary.counts().error);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Canonical records, rules and priorities
//! - [`parser`] - CSV parsing with auto-detection
//! - [`normalize`] - Header reconciliation, coercion and ingestion
//! - [`validation`] - Cross-entity checks and bundle schema
//! - [`workspace`] - In-memory store that revalidates on every change
//! - [`nl`] - Plain-language rule and filter helpers
//! - [`export`] - Cleaned CSV and `rules.json` writer
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Ingestion
pub mod normalize;
pub mod parser;

// Validation
pub mod validation;

// State
pub mod workspace;

// Authoring helpers
pub mod nl;

// Output
pub mod export;

// HTTP API
pub mod api;
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BundleError, ConfigError, CsvError, ExportError, PipelineError, RuleError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Attributes, Client, Criterion, EntityKind, PrioritiesConfig, Profile, QualificationLevel, Rule, RuleKind,
    RulesBundle, Task, Weights, Worker,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    csv_to_json, decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    ParseResult,
};

// =============================================================================
// Re-exports - Normalization
// =============================================================================

pub use normalize::pipeline::{ingest_bytes, ingest_file, ingest_records, CsvInfo, Ingested};
pub use normalize::{
    alias_table, map_and_normalize, map_row, missing_identifier_issues, normalize_client, normalize_task,
    normalize_worker, reconcile_headers, CanonicalRecord, ColumnMapResult, HeaderMap,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    import_bundle, parse_bundle, validate, validate_bundle, IssueCounts, IssueLevel, ValidationIssue,
    ValidationSummary,
};

// =============================================================================
// Re-exports - Workspace, NL, Export
// =============================================================================

pub use export::{write_bundle, write_csv};
pub use nl::{parse_rules, parse_task_filter, TaskFilter};
pub use workspace::{ExportBundle, Workspace};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
    pub use crate::config::ServerConfig;
}

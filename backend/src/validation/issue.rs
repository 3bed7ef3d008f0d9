//! Validation issues and their summary.

use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::models::EntityKind;

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
    Info,
}

/// One finding, located by entity and optionally row and column.
///
/// `id` is deterministic: the same data always produces the same ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub id: String,
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub level: IssueLevel,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        level: IssueLevel,
        id: impl Into<String>,
        entity: EntityKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity,
            row_id: None,
            row_index: None,
            column: None,
            level,
            message: message.into(),
        }
    }

    pub fn error(id: impl Into<String>, entity: EntityKind, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Error, id, entity, message)
    }

    pub fn warning(id: impl Into<String>, entity: EntityKind, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Warning, id, entity, message)
    }

    pub fn info(id: impl Into<String>, entity: EntityKind, message: impl Into<String>) -> Self {
        Self::new(IssueLevel::Info, id, entity, message)
    }

    pub fn with_row(mut self, row_id: impl Into<String>) -> Self {
        self.row_id = Some(row_id.into());
        self
    }

    pub fn with_row_index(mut self, index: usize) -> Self {
        self.row_index = Some(index);
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }
}

/// Issue count per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl IssueCounts {
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a ValidationIssue>) -> Self {
        issues.into_iter().fold(Self::default(), |mut counts, issue| {
            match issue.level {
                IssueLevel::Error => counts.error += 1,
                IssueLevel::Warning => counts.warning += 1,
                IssueLevel::Info => counts.info += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Outcome of a validation pass.
///
/// Only the issues are stored; counts are recomputed on demand and written
/// out alongside them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValidationSummary {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationSummary {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn counts(&self) -> IssueCounts {
        IssueCounts::tally(&self.issues)
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn for_entity(&self, entity: EntityKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.entity == entity)
    }
}

impl Serialize for ValidationSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationSummary", 2)?;
        state.serialize_field("issues", &self.issues)?;
        state.serialize_field("counts", &self.counts())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_wire_format() {
        let issue = ValidationIssue::error("clients:0:ClientID", EntityKind::Clients, "Missing ClientID")
            .with_row_index(0)
            .with_column("ClientID");
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["entity"], "clients");
        assert_eq!(value["level"], "error");
        assert_eq!(value["rowIndex"], 0);
        assert_eq!(value["column"], "ClientID");
        assert!(value.get("rowId").is_none());
    }

    #[test]
    fn test_counts_are_derived() {
        let summary = ValidationSummary::new(vec![
            ValidationIssue::error("a", EntityKind::Tasks, "x"),
            ValidationIssue::warning("b", EntityKind::Tasks, "y"),
            ValidationIssue::info("c", EntityKind::Workers, "z"),
            ValidationIssue::error("d", EntityKind::Clients, "w"),
        ]);
        let counts = summary.counts();
        assert_eq!(counts, IssueCounts { error: 2, warning: 1, info: 1 });
        assert_eq!(counts.total(), summary.issues.len());
        assert!(summary.has_errors());
        assert_eq!(summary.for_entity(EntityKind::Tasks).count(), 2);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["counts"], json!({"error": 2, "warning": 1, "info": 1}));
    }

    #[test]
    fn test_summary_deserialize_ignores_counts() {
        let summary: ValidationSummary = serde_json::from_value(json!({
            "issues": [{"id": "a", "entity": "workers", "level": "info", "message": "m"}],
            "counts": {"error": 9, "warning": 9, "info": 9}
        }))
        .unwrap();
        assert_eq!(summary.counts(), IssueCounts { error: 0, warning: 0, info: 1 });
    }
}

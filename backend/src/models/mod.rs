//! Domain models shared by the normalizer, the validator and the workspace.
//!
//! - [`Client`], [`Worker`], [`Task`] - canonical records produced by normalization
//! - [`EntityKind`] - which collection a record or issue belongs to
//! - [`Attributes`] - the three-state `AttributesJSON` field
//! - [`QualificationLevel`] - free scalar carried by workers
//! - [`rules`] - allocation rules and the exported bundle
//! - [`priorities`] - prioritization weights

pub mod priorities;
pub mod rules;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use priorities::{Criterion, PrioritiesConfig, Profile, Weights};
pub use rules::{GroupKind, Rule, RuleKind, RulesBundle, SpecificPriority, TargetGroup};

/// A phase number. Phases come from spreadsheets, so they are kept as floats.
pub type PhaseNumber = f64;

// =============================================================================
// Entity Kind
// =============================================================================

/// The three record collections handled by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Workers,
    Tasks,
}

impl EntityKind {
    /// All kinds, in upload order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Clients, EntityKind::Workers, EntityKind::Tasks];

    /// Plural lowercase name used in issue ids and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Workers => "workers",
            Self::Tasks => "tasks",
        }
    }

    /// Singular label (`Client`, `Worker`, `Task`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clients => "Client",
            Self::Workers => "Worker",
            Self::Tasks => "Task",
        }
    }

    /// Canonical name of the identifier column.
    pub fn id_field(&self) -> &'static str {
        match self {
            Self::Clients => "ClientID",
            Self::Workers => "WorkerID",
            Self::Tasks => "TaskID",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clients" | "client" => Ok(Self::Clients),
            "workers" | "worker" => Ok(Self::Workers),
            "tasks" | "task" => Ok(Self::Tasks),
            other => Err(format!("unknown entity '{}' (expected clients, workers or tasks)", other)),
        }
    }
}

// =============================================================================
// AttributesJSON
// =============================================================================

/// State of a client's `AttributesJSON` cell.
///
/// An absent cell and a cell whose text failed to parse must stay
/// distinguishable: only the latter is reported by the validator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Attributes {
    /// Empty cell or explicit JSON `null`.
    #[default]
    Absent,
    /// Parsed JSON value.
    Parsed(Value),
    /// Non-empty text that is not valid JSON, kept verbatim.
    Invalid(String),
}

impl Attributes {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Attributes::Invalid(_))
    }

    /// Text form used for tabular export.
    pub fn to_cell(&self) -> String {
        match self {
            Attributes::Absent => String::new(),
            Attributes::Parsed(value) => value.to_string(),
            Attributes::Invalid(raw) => raw.clone(),
        }
    }
}

// Invalid text serializes as the raw string, so a round trip through JSON
// re-parses it and lands in the same state. A parsed JSON string is written
// as its JSON text for the same reason.
impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attributes::Absent => serializer.serialize_none(),
            Attributes::Parsed(value @ Value::String(_)) => serializer.serialize_str(&value.to_string()),
            Attributes::Parsed(value) => value.serialize(serializer),
            Attributes::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(crate::normalize::coerce::attributes(Some(&value)))
    }
}

// =============================================================================
// Qualification Level
// =============================================================================

/// Worker qualification: spreadsheets carry either a grade number or a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QualificationLevel {
    Number(f64),
    Text(String),
}

// =============================================================================
// Canonical records
// =============================================================================

/// A client requesting tasks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "ClientID", default)]
    pub client_id: String,
    #[serde(rename = "ClientName", default)]
    pub client_name: String,
    /// Expected in `[1, 5]`.
    #[serde(rename = "PriorityLevel", default)]
    pub priority_level: f64,
    #[serde(rename = "RequestedTaskIDs", default)]
    pub requested_task_ids: Vec<String>,
    #[serde(rename = "GroupTag", default, skip_serializing_if = "Option::is_none")]
    pub group_tag: Option<String>,
    #[serde(rename = "AttributesJSON", default)]
    pub attributes: Attributes,
}

/// A worker offering skills during some phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(rename = "WorkerID", default)]
    pub worker_id: String,
    #[serde(rename = "WorkerName", default)]
    pub worker_name: String,
    #[serde(rename = "Skills", default)]
    pub skills: Vec<String>,
    #[serde(rename = "AvailableSlots", default)]
    pub available_slots: Vec<PhaseNumber>,
    #[serde(rename = "MaxLoadPerPhase", default)]
    pub max_load_per_phase: f64,
    #[serde(rename = "WorkerGroup", default, skip_serializing_if = "Option::is_none")]
    pub worker_group: Option<String>,
    #[serde(rename = "QualificationLevel", default, skip_serializing_if = "Option::is_none")]
    pub qualification_level: Option<QualificationLevel>,
}

/// A task that clients request and workers perform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "TaskID", default)]
    pub task_id: String,
    #[serde(rename = "TaskName", default)]
    pub task_name: String,
    #[serde(rename = "Category", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Number of phases, at least 1.
    #[serde(rename = "Duration", default)]
    pub duration: f64,
    #[serde(rename = "RequiredSkills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "PreferredPhases", default)]
    pub preferred_phases: Vec<PhaseNumber>,
    #[serde(rename = "MaxConcurrent", default)]
    pub max_concurrent: f64,
}

/// Format a number the way a spreadsheet shows it: integral values without `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

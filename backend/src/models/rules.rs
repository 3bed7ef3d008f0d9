//! Allocation rules authored on top of the uploaded data.
//!
//! Rules are a closed set of variants discriminated by a `type` tag:
//!
//! ```json
//! { "id": "r1", "type": "coRun", "tasks": ["T1", "T2"], "priority": 1 }
//! { "id": "r2", "type": "phaseWindow", "taskId": "T3", "allowedPhases": [1, 2, 3] }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::priorities::PrioritiesConfig;
use super::PhaseNumber;
use crate::error::RuleError;

/// A rule with its common envelope (id, description, precedence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Precedence ordering, 1 = highest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// Rule variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuleKind {
    /// Tasks that must run together.
    CoRun { tasks: Vec<String> },
    /// A client or worker group must share at least `min_common_slots` slots.
    SlotRestriction {
        target_group: TargetGroup,
        min_common_slots: u32,
    },
    /// Cap on slots per phase for a worker group.
    LoadLimit {
        worker_group: String,
        max_slots_per_phase: f64,
    },
    /// Phases a task is allowed to run in.
    PhaseWindow {
        task_id: String,
        allowed_phases: Vec<PhaseNumber>,
    },
    /// Regex-driven rule template.
    PatternMatch {
        regex: String,
        template: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
    },
    /// Overrides of global or per-entity priority.
    PrecedenceOverride {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global_priority: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        specific_priorities: Option<Vec<SpecificPriority>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Client,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub kind: GroupKind,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificPriority {
    pub id: String,
    pub priority: f64,
}

impl RuleKind {
    /// Tag as written in the `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            RuleKind::CoRun { .. } => "coRun",
            RuleKind::SlotRestriction { .. } => "slotRestriction",
            RuleKind::LoadLimit { .. } => "loadLimit",
            RuleKind::PhaseWindow { .. } => "phaseWindow",
            RuleKind::PatternMatch { .. } => "patternMatch",
            RuleKind::PrecedenceOverride { .. } => "precedenceOverride",
        }
    }
}

impl Rule {
    /// New rule with a random id.
    pub fn new(kind: RuleKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            description: None,
            priority: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject rules that cannot mean anything.
    pub fn check(&self) -> Result<(), RuleError> {
        let invalid = |message: &str| RuleError::Invalid {
            id: self.id.clone(),
            message: message.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("rule id is empty"));
        }

        match &self.kind {
            RuleKind::CoRun { tasks } => {
                if tasks.iter().filter(|t| !t.trim().is_empty()).count() < 2 {
                    return Err(invalid("co-run needs at least two tasks"));
                }
            }
            RuleKind::PhaseWindow { task_id, allowed_phases } => {
                if task_id.trim().is_empty() {
                    return Err(invalid("phase window has no task"));
                }
                if allowed_phases.is_empty() {
                    return Err(invalid("phase window allows no phase"));
                }
            }
            RuleKind::PatternMatch { regex, .. } => {
                regex::Regex::new(regex)
                    .map_err(|e| invalid(&format!("invalid regex: {}", e)))?;
            }
            RuleKind::LoadLimit { max_slots_per_phase, .. } => {
                if *max_slots_per_phase < 0.0 || max_slots_per_phase.is_nan() {
                    return Err(invalid("max slots per phase must be >= 0"));
                }
            }
            RuleKind::SlotRestriction { .. } | RuleKind::PrecedenceOverride { .. } => {}
        }

        Ok(())
    }
}

/// Exported rules document: `{rules, priorities}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesBundle {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub priorities: PrioritiesConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_wire_format() {
        let rule = Rule {
            id: "r1".into(),
            kind: RuleKind::PhaseWindow {
                task_id: "T3".into(),
                allowed_phases: vec![1.0, 2.0],
            },
            description: None,
            priority: Some(1),
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["type"], "phaseWindow");
        assert_eq!(value["taskId"], "T3");
        assert_eq!(value["allowedPhases"], json!([1.0, 2.0]));
        assert_eq!(value["priority"], 1);
    }

    #[test]
    fn test_rule_parses_slot_restriction() {
        let rule: Rule = serde_json::from_value(json!({
            "id": "r2",
            "type": "slotRestriction",
            "targetGroup": { "kind": "worker", "tag": "night" },
            "minCommonSlots": 2
        }))
        .unwrap();
        match rule.kind {
            RuleKind::SlotRestriction { target_group, min_common_slots } => {
                assert_eq!(target_group.kind, GroupKind::Worker);
                assert_eq!(target_group.tag, "night");
                assert_eq!(min_common_slots, 2);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_check_rejects_single_task_corun() {
        let rule = Rule::new(RuleKind::CoRun { tasks: vec!["T1".into()] });
        assert!(rule.check().is_err());
        let rule = Rule::new(RuleKind::CoRun { tasks: vec!["T1".into(), "T2".into()] });
        assert!(rule.check().is_ok());
    }

    #[test]
    fn test_check_rejects_bad_regex() {
        let rule = Rule::new(RuleKind::PatternMatch {
            regex: "([a-z".into(),
            template: "x".into(),
            params: None,
        });
        let err = rule.check().unwrap_err();
        assert!(err.to_string().contains("invalid regex"));
    }
}

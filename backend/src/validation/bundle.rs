//! JSON Schema check for imported rules bundles.
//!
//! The schema is embedded at compile time from `schemas/rules-bundle.json`
//! and applied with the Draft 7 validator before deserializing.

use serde_json::Value;
use std::collections::HashSet;

use crate::error::{BundleError, RuleError};
use crate::models::RulesBundle;

const RULES_BUNDLE_SCHEMA: &str = include_str!("../../schemas/rules-bundle.json");

/// Validate a document against a JSON schema, collecting every violation.
pub fn validate_against(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a `{rules, priorities}` document against the embedded schema.
pub fn validate_bundle(data: &Value) -> Result<(), BundleError> {
    let schema: Value = serde_json::from_str(RULES_BUNDLE_SCHEMA)?;
    validate_against(&schema, data).map_err(|errors| BundleError::SchemaError { errors })
}

/// Schema-check, deserialize, then check every rule and id uniqueness.
pub fn import_bundle(data: &Value) -> Result<RulesBundle, BundleError> {
    validate_bundle(data)?;
    let bundle: RulesBundle = serde_json::from_value(data.clone())?;

    let mut ids = HashSet::new();
    for rule in &bundle.rules {
        rule.check()?;
        if !ids.insert(rule.id.as_str()) {
            return Err(RuleError::DuplicateId(rule.id.clone()).into());
        }
    }

    Ok(bundle)
}

/// [`import_bundle`] from JSON text.
pub fn parse_bundle(text: &str) -> Result<RulesBundle, BundleError> {
    let data: Value = serde_json::from_str(text)?;
    import_bundle(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, RuleKind};
    use serde_json::json;

    #[test]
    fn test_embedded_schema_parses() {
        let schema: Value = serde_json::from_str(RULES_BUNDLE_SCHEMA).unwrap();
        assert!(jsonschema::draft7::new(&schema).is_ok());
    }

    #[test]
    fn test_valid_bundle_imports() {
        let bundle = import_bundle(&json!({
            "rules": [
                { "id": "r1", "type": "coRun", "tasks": ["T1", "T2"], "priority": 1 },
                { "id": "r2", "type": "phaseWindow", "taskId": "T3", "allowedPhases": [1, 2] }
            ],
            "priorities": { "profile": "fairDistribution", "weights": { "fairnessWeight": 0.3 } }
        }))
        .unwrap();

        assert_eq!(bundle.rules.len(), 2);
        assert!(matches!(bundle.rules[1].kind, RuleKind::PhaseWindow { .. }));
        assert_eq!(bundle.priorities.profile, Profile::FairDistribution);
        assert_eq!(bundle.priorities.weights.client_priority_weight, 0.3);
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let err = validate_bundle(&json!({
            "rules": [{ "id": "r1", "type": "teleport" }]
        }))
        .unwrap_err();
        assert!(matches!(err, BundleError::SchemaError { .. }));
    }

    #[test]
    fn test_missing_variant_field_rejected() {
        let result = validate_bundle(&json!({
            "rules": [{ "id": "r1", "type": "loadLimit", "workerGroup": "night" }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let result = validate_bundle(&json!({
            "rules": [],
            "priorities": { "weights": { "durationWeight": 1.5 } }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_rule_ids_rejected() {
        let err = parse_bundle(
            r#"{"rules": [
                {"id": "r1", "type": "coRun", "tasks": ["T1", "T2"]},
                {"id": "r1", "type": "coRun", "tasks": ["T3", "T4"]}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::Rule(RuleError::DuplicateId(_))));
    }

    #[test]
    fn test_bad_regex_rejected_after_schema() {
        let err = import_bundle(&json!({
            "rules": [{ "id": "r1", "type": "patternMatch", "regex": "([", "template": "t" }]
        }))
        .unwrap_err();
        assert!(matches!(err, BundleError::Rule(RuleError::Invalid { .. })));
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(parse_bundle("{rules"), Err(BundleError::JsonError(_))));
    }
}

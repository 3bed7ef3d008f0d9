//! Sentence → rule conversion.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Rule, RuleKind};
use crate::normalize::coerce::expand_phases;

static CO_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)co[- ]?run\s+([a-z0-9_-]+)\s+([a-z0-9_-]+)").expect("co-run pattern is valid")
});

static PHASE_WINDOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)phase\s*window\s+([a-z0-9_-]+).*?(\d+)\s*-\s*(\d+)").expect("phase window pattern is valid")
});

/// Rules described by `text`. Both patterns may match in one sentence.
///
/// Returned rules get fresh ids and are not added anywhere.
pub fn parse_rules(text: &str) -> Vec<Rule> {
    let mut rules = Vec::new();

    if let Some(caps) = CO_RUN.captures(text) {
        rules.push(
            Rule::new(RuleKind::CoRun {
                tasks: vec![caps[1].to_uppercase(), caps[2].to_uppercase()],
            })
            .with_description("NL: co-run"),
        );
    }

    if let Some(caps) = PHASE_WINDOW.captures(text) {
        let phases = expand_phases(&format!("{}-{}", &caps[2], &caps[3]));
        if !phases.is_empty() {
            rules.push(
                Rule::new(RuleKind::PhaseWindow {
                    task_id: caps[1].to_uppercase(),
                    allowed_phases: phases,
                })
                .with_description("NL: phase window"),
            );
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_co_run_spellings() {
        for text in ["co-run t1 t2", "CoRun T1 T2", "please co run t1 t2 together"] {
            let rules = parse_rules(text);
            assert_eq!(rules.len(), 1, "{}", text);
            assert_eq!(
                rules[0].kind,
                RuleKind::CoRun {
                    tasks: vec!["T1".into(), "T2".into()]
                }
            );
            assert!(rules[0].check().is_ok());
        }
    }

    #[test]
    fn test_phase_window() {
        let rules = parse_rules("Phase window t3 phases 1-3");
        assert_eq!(rules.len(), 1);
        assert_eq!(
            rules[0].kind,
            RuleKind::PhaseWindow {
                task_id: "T3".into(),
                allowed_phases: vec![1.0, 2.0, 3.0],
            }
        );
        assert_eq!(rules[0].description.as_deref(), Some("NL: phase window"));
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        assert!(parse_rules("phase window T3 phases 4-2").is_empty());
    }

    #[test]
    fn test_both_patterns() {
        let rules = parse_rules("co-run T1 T2 and phase window T1 in 2 - 3");
        let kinds: Vec<_> = rules.iter().map(|r| r.kind.type_name()).collect();
        assert_eq!(kinds, vec!["coRun", "phaseWindow"]);
        assert_ne!(rules[0].id, rules[1].id);
    }

    #[test]
    fn test_unrelated_text() {
        assert!(parse_rules("make everything faster").is_empty());
    }
}

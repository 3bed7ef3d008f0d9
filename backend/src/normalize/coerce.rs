//! Coercion of loosely-typed spreadsheet cells into canonical values.
//!
//! Every function here is total: malformed input degrades to a default
//! (empty string, `None`, empty list) and never panics. Cells arrive as
//! `Option<&Value>` because a column may be missing from the row entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

use crate::models::{format_number, Attributes, PhaseNumber, QualificationLevel};

/// Largest range expression expanded into explicit phases.
pub const MAX_PHASE_SPAN: u64 = 10_000;

static PHASE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\s*-\s*(\d+)$").expect("phase range pattern is valid")
});

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_number).unwrap_or_default()
    }
}

/// Text form of a scalar cell. `null` has none.
fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Stringified and trimmed cell; missing cells become `""`.
pub fn text(value: Option<&Value>) -> String {
    value
        .and_then(as_string)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Like [`text`] but empty results are absent.
pub fn optional_text(value: Option<&Value>) -> Option<String> {
    Some(text(value)).filter(|s| !s.is_empty())
}

/// Finite number, or `None` for empty/unparsable/non-finite cells.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    Some(n).filter(|n| n.is_finite())
}

/// Numeric scalar fields default to `0`.
pub fn number_or_zero(value: Option<&Value>) -> f64 {
    number(value).unwrap_or(0.0)
}

fn split_delimited(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c| matches!(c, ',' | ';' | '|'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Bracketed text that parses as a JSON array.
fn json_array(text: &str) -> Option<Vec<Value>> {
    if !(text.starts_with('[') && text.ends_with(']')) {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(as_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// List of free-form tags or ids.
///
/// Native list → bracketed JSON array → split on `,` `;` `|`.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    let value = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(v) => v,
    };

    if let Value::Array(items) = value {
        return string_items(items);
    }

    let text = text(Some(value));
    if let Some(items) = json_array(&text) {
        return string_items(&items);
    }

    split_delimited(&text).map(str::to_string).collect()
}

/// Expand a single `<start>-<end>` expression into the inclusive phase list.
///
/// Anything else, including `end < start` and spans above [`MAX_PHASE_SPAN`],
/// yields an empty list.
pub fn expand_phases(text: &str) -> Vec<PhaseNumber> {
    let Some(caps) = PHASE_RANGE.captures(text.trim()) else {
        return Vec::new();
    };
    let (Ok(start), Ok(end)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
        return Vec::new();
    };
    if end < start || end - start >= MAX_PHASE_SPAN {
        return Vec::new();
    }
    (start..=end).map(|p| p as PhaseNumber).collect()
}

fn number_items(items: &[Value]) -> Vec<PhaseNumber> {
    items.iter().filter_map(|v| number(Some(v))).collect()
}

/// List of phase numbers.
///
/// Native list → bracketed JSON array → range expression → delimiter split.
/// The order matters: `"1-3"` is only read as a range at the third step.
pub fn phase_list(value: Option<&Value>) -> Vec<PhaseNumber> {
    let value = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(v) => v,
    };

    if let Value::Array(items) = value {
        return number_items(items);
    }

    let text = text(Some(value));
    if let Some(items) = json_array(&text) {
        return number_items(&items);
    }

    let range = expand_phases(&text);
    if !range.is_empty() {
        return range;
    }

    split_delimited(&text)
        .filter_map(|piece| piece.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect()
}

/// `AttributesJSON` cell.
pub fn attributes(value: Option<&Value>) -> Attributes {
    match value {
        None | Some(Value::Null) => Attributes::Absent,
        Some(Value::String(raw)) => {
            if raw.trim().is_empty() {
                return Attributes::Absent;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Null) => Attributes::Absent,
                Ok(parsed) => Attributes::Parsed(parsed),
                Err(_) => Attributes::Invalid(raw.clone()),
            }
        }
        Some(structured) => Attributes::Parsed(structured.clone()),
    }
}

/// `QualificationLevel` cell: numeric cells (including numeric text) become
/// numbers, other non-empty text stays text.
pub fn qualification(value: Option<&Value>) -> Option<QualificationLevel> {
    let value = value?;
    if let Value::String(_) | Value::Number(_) = value {
        if let Some(n) = number(Some(value)) {
            return Some(QualificationLevel::Number(n));
        }
    }
    optional_text(Some(value)).map(QualificationLevel::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_trims_and_stringifies() {
        assert_eq!(text(Some(&json!("  C1  "))), "C1");
        assert_eq!(text(Some(&json!(42))), "42");
        assert_eq!(text(Some(&Value::Null)), "");
        assert_eq!(text(None), "");
        assert_eq!(optional_text(Some(&json!("   "))), None);
    }

    #[test]
    fn test_number() {
        assert_eq!(number(Some(&json!("3"))), Some(3.0));
        assert_eq!(number(Some(&json!(" 2.5 "))), Some(2.5));
        assert_eq!(number(Some(&json!(4))), Some(4.0));
        assert_eq!(number(Some(&json!(""))), None);
        assert_eq!(number(Some(&json!("abc"))), None);
        assert_eq!(number(Some(&json!("inf"))), None);
        assert_eq!(number(Some(&json!("NaN"))), None);
        assert_eq!(number_or_zero(Some(&json!("high"))), 0.0);
    }

    #[test]
    fn test_string_list_delimiters() {
        assert_eq!(string_list(Some(&json!("T1, T2;T3|T4"))), vec!["T1", "T2", "T3", "T4"]);
        assert_eq!(string_list(Some(&json!("T1,,  ,T2"))), vec!["T1", "T2"]);
        assert!(string_list(Some(&json!(""))).is_empty());
        assert!(string_list(None).is_empty());
    }

    #[test]
    fn test_string_list_json_and_native() {
        assert_eq!(string_list(Some(&json!("[\"T1\", \" T2 \"]"))), vec!["T1", "T2"]);
        assert_eq!(string_list(Some(&json!(["a", " ", 3]))), vec!["a", "3"]);
        // Broken JSON falls back to splitting
        assert_eq!(string_list(Some(&json!("[T1, T2]"))), vec!["[T1", "T2]"]);
    }

    #[test]
    fn test_expand_phases() {
        assert_eq!(expand_phases("1-3"), vec![1.0, 2.0, 3.0]);
        assert_eq!(expand_phases("5-5"), vec![5.0]);
        assert!(expand_phases("5-2").is_empty());
        assert_eq!(expand_phases(" 2 - 4 "), vec![2.0, 3.0, 4.0]);
        assert!(expand_phases("1-3,5").is_empty());
        assert!(expand_phases("1-99999999").is_empty());
    }

    #[test]
    fn test_phase_list_precedence() {
        assert_eq!(phase_list(Some(&json!([1, "2", null, "x"]))), vec![1.0, 2.0]);
        assert_eq!(phase_list(Some(&json!("[3, 4]"))), vec![3.0, 4.0]);
        assert_eq!(phase_list(Some(&json!("1-3"))), vec![1.0, 2.0, 3.0]);
        assert_eq!(phase_list(Some(&json!("1;3|5"))), vec![1.0, 3.0, 5.0]);
        assert_eq!(phase_list(Some(&json!("1,two,3"))), vec![1.0, 3.0]);
        assert!(phase_list(Some(&json!("5-2"))).is_empty());
        assert!(phase_list(Some(&json!(""))).is_empty());
        assert_eq!(phase_list(Some(&json!(2))), vec![2.0]);
    }

    #[test]
    fn test_attributes_states() {
        assert_eq!(attributes(None), Attributes::Absent);
        assert_eq!(attributes(Some(&json!(""))), Attributes::Absent);
        assert_eq!(attributes(Some(&json!("null"))), Attributes::Absent);
        assert_eq!(
            attributes(Some(&json!("{\"tier\": \"gold\"}"))),
            Attributes::Parsed(json!({"tier": "gold"}))
        );
        assert_eq!(
            attributes(Some(&json!({"tier": "gold"}))),
            Attributes::Parsed(json!({"tier": "gold"}))
        );
        assert_eq!(
            attributes(Some(&json!("{tier: gold"))),
            Attributes::Invalid("{tier: gold".into())
        );
    }

    #[test]
    fn test_qualification() {
        assert_eq!(qualification(Some(&json!(3))), Some(QualificationLevel::Number(3.0)));
        assert_eq!(
            qualification(Some(&json!(" senior "))),
            Some(QualificationLevel::Text("senior".into()))
        );
        assert_eq!(qualification(Some(&json!(" 2 "))), Some(QualificationLevel::Number(2.0)));
        assert_eq!(qualification(Some(&json!(""))), None);
        assert_eq!(qualification(None), None);
    }
}

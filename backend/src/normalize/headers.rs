//! Header reconciliation: spreadsheet column names → canonical field names.
//!
//! Each entity has a table of canonical fields and the lowercase spellings
//! accepted for them. Headers are trimmed and matched case-insensitively;
//! the first field in table order wins and unmatched headers keep their name.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::models::EntityKind;

/// One canonical field and its accepted aliases.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

/// Alias table for one entity, in canonical column order.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub kind: EntityKind,
    pub fields: &'static [FieldAliases],
}

const fn field(canonical: &'static str, aliases: &'static [&'static str]) -> FieldAliases {
    FieldAliases { canonical, aliases }
}

pub static CLIENT_ALIASES: AliasTable = AliasTable {
    kind: EntityKind::Clients,
    fields: &[
        field("ClientID", &["clientid", "client_id", "id"]),
        field("ClientName", &["clientname", "client_name", "name"]),
        field("PriorityLevel", &["priority", "priority_level"]),
        field("RequestedTaskIDs", &["requestedtasks", "requested_task_ids", "taskids", "tasks"]),
        field("GroupTag", &["group", "group_tag", "clientgroup"]),
        field("AttributesJSON", &["attributes", "meta", "attributes_json", "metadata"]),
    ],
};

pub static WORKER_ALIASES: AliasTable = AliasTable {
    kind: EntityKind::Workers,
    fields: &[
        field("WorkerID", &["workerid", "worker_id", "id"]),
        field("WorkerName", &["workername", "worker_name", "name"]),
        field("Skills", &["skill", "tags"]),
        field("AvailableSlots", &["availableslots", "slots", "availability"]),
        field("MaxLoadPerPhase", &["maxloadperphase", "max_load", "max_load_per_phase"]),
        field("WorkerGroup", &["group", "group_tag", "workergroup"]),
        field("QualificationLevel", &["qualification", "qualification_level", "level"]),
    ],
};

pub static TASK_ALIASES: AliasTable = AliasTable {
    kind: EntityKind::Tasks,
    fields: &[
        field("TaskID", &["taskid", "task_id", "id"]),
        field("TaskName", &["taskname", "task_name", "name"]),
        field("Category", &["category", "type"]),
        field("Duration", &["duration", "phases"]),
        field("RequiredSkills", &["requiredskills", "skills", "req_skills"]),
        field("PreferredPhases", &["preferredphases", "phases_pref", "preferred"]),
        field("MaxConcurrent", &["maxconcurrent", "concurrency", "max_parallel"]),
    ],
};

/// Alias table of an entity.
pub fn alias_table(kind: EntityKind) -> &'static AliasTable {
    match kind {
        EntityKind::Clients => &CLIENT_ALIASES,
        EntityKind::Workers => &WORKER_ALIASES,
        EntityKind::Tasks => &TASK_ALIASES,
    }
}

impl AliasTable {
    /// Canonical column names in table order.
    pub fn canonical_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.canonical)
    }

    pub fn is_canonical(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.canonical == name)
    }

    /// Canonical field for a raw header, if any spelling matches.
    pub fn resolve(&self, header: &str) -> Option<&'static str> {
        let lowered = header.trim().to_lowercase();
        self.fields
            .iter()
            .find(|f| {
                f.canonical.to_lowercase() == lowered || f.aliases.iter().any(|a| *a == lowered)
            })
            .map(|f| f.canonical)
    }
}

/// Original header → canonical field, in file column order.
///
/// Lookups are total: a header that was never reconciled maps to itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn canonical<'a>(&'a self, header: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(original, _)| original == header)
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(header)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(o, c)| (o.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Headers that resolved to a canonical field of `table`.
    pub fn mapped<'a>(&'a self, table: &'a AliasTable) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter().filter(move |(_, c)| table.is_canonical(c))
    }

    /// Headers that matched nothing in `table`.
    pub fn unmapped<'a>(&'a self, table: &'a AliasTable) -> impl Iterator<Item = &'a str> {
        self.iter()
            .filter(move |(_, c)| !table.is_canonical(c))
            .map(|(o, _)| o)
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (original, canonical) in &self.entries {
            map.serialize_entry(original, canonical)?;
        }
        map.end()
    }
}

/// Reconcile raw headers against an alias table.
pub fn reconcile_headers(headers: &[String], table: &AliasTable) -> HeaderMap {
    let entries = headers
        .iter()
        .map(|header| {
            let canonical = table
                .resolve(header)
                .map(str::to_string)
                .unwrap_or_else(|| header.clone());
            (header.clone(), canonical)
        })
        .collect();
    HeaderMap { entries }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Re-key a raw row by canonical names.
///
/// When two columns land on the same field, the first non-empty one wins.
/// Keys of the row that are not in the map are carried under their own name.
pub fn map_row(row: &Value, header_map: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(raw) = row.as_object() else {
        return out;
    };

    let mut put = |key: &str, value: &Value| match out.get(key) {
        Some(existing) if !is_blank(existing) => {}
        _ => {
            out.insert(key.to_string(), value.clone());
        }
    };

    for (original, canonical) in header_map.iter() {
        if let Some(value) = raw.get(original) {
            put(canonical, value);
        }
    }
    for (key, value) in raw {
        if !header_map.entries.iter().any(|(o, _)| o == key) {
            put(header_map.canonical(key), value);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_names_map_to_themselves() {
        for kind in EntityKind::ALL {
            let table = alias_table(kind);
            let names: Vec<String> = table.canonical_fields().map(str::to_string).collect();
            let map = reconcile_headers(&names, table);
            for name in &names {
                assert_eq!(map.canonical(name), name);
            }
        }
    }

    #[test]
    fn test_alias_sets_disjoint() {
        for kind in EntityKind::ALL {
            let table = alias_table(kind);
            let mut seen = HashSet::new();
            for f in table.fields {
                let mut spellings: HashSet<String> = f.aliases.iter().map(|a| a.to_string()).collect();
                spellings.insert(f.canonical.to_lowercase());
                for spelling in spellings {
                    assert!(seen.insert(spelling.clone()), "'{}' repeated in {}", spelling, kind);
                }
            }
        }
    }

    #[test]
    fn test_aliases_trimmed_case_insensitive() {
        let map = reconcile_headers(&headers(&[" Client_ID ", "NAME", "Priority", "Notes"]), &CLIENT_ALIASES);
        assert_eq!(map.canonical(" Client_ID "), "ClientID");
        assert_eq!(map.canonical("NAME"), "ClientName");
        assert_eq!(map.canonical("Priority"), "PriorityLevel");
        assert_eq!(map.canonical("Notes"), "Notes");
        assert_eq!(map.unmapped(&CLIENT_ALIASES).collect::<Vec<_>>(), vec!["Notes"]);
        assert_eq!(map.mapped(&CLIENT_ALIASES).count(), 3);
    }

    #[test]
    fn test_lookup_is_total() {
        let map = HeaderMap::default();
        assert_eq!(map.canonical("Whatever"), "Whatever");
    }

    #[test]
    fn test_same_alias_differs_per_entity() {
        let map = reconcile_headers(&headers(&["skills"]), &TASK_ALIASES);
        assert_eq!(map.canonical("skills"), "RequiredSkills");
        let map = reconcile_headers(&headers(&["skills"]), &WORKER_ALIASES);
        assert_eq!(map.canonical("skills"), "Skills");
    }

    #[test]
    fn test_map_row_first_non_empty_wins() {
        let hdrs = headers(&["id", "TaskID", "name"]);
        let map = reconcile_headers(&hdrs, &TASK_ALIASES);

        let row = json!({"id": "", "TaskID": "T1", "name": "Weld"});
        let mapped = map_row(&row, &map);
        assert_eq!(mapped["TaskID"], "T1");
        assert_eq!(mapped["TaskName"], "Weld");

        let row = json!({"id": "T2", "TaskID": "T3", "name": ""});
        let mapped = map_row(&row, &map);
        assert_eq!(mapped["TaskID"], "T2");
    }

    #[test]
    fn test_header_map_serializes_in_order() {
        let map = reconcile_headers(&headers(&["workerid", "skill"]), &WORKER_ALIASES);
        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"workerid":"WorkerID","skill":"Skills"}"#);
    }
}

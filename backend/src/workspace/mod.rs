//! In-memory workspace: the one place that owns records, rules and priorities.
//!
//! Every record mutation re-runs [`validate`] and recomputes the missing
//! identifier issues, so [`Workspace::summary`] and
//! [`Workspace::ingestion_issues`] always describe the records currently held.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::error::RuleError;
use crate::models::{Client, EntityKind, PrioritiesConfig, Profile, Rule, RulesBundle, Task, Worker};
use crate::normalize::{missing_identifier_issues, CanonicalRecord, ColumnMapResult, HeaderMap};
use crate::validation::{validate, ValidationIssue, ValidationSummary};

/// Header mapping of the last upload of one entity, and the rows of that
/// entity currently missing their identifier.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub header_map: HeaderMap,
    pub issues: Vec<ValidationIssue>,
}

/// Snapshot returned by [`Workspace::export_bundle`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub clients: Vec<Client>,
    pub workers: Vec<Worker>,
    pub tasks: Vec<Task>,
    pub rules_bundle: RulesBundle,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    clients: Vec<Client>,
    workers: Vec<Worker>,
    tasks: Vec<Task>,
    ingestion: BTreeMap<EntityKind, IngestionReport>,
    summary: ValidationSummary,
    rules: Vec<Rule>,
    priorities: PrioritiesConfig,
}

/// Merge a canonical-keyed patch into a record and normalize the result.
fn patch_record<T: CanonicalRecord>(record: &T, patch: &Map<String, Value>) -> T {
    let mut row = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        row.insert(key.clone(), value.clone());
    }
    T::from_row(&row)
}

fn upsert_in<T: CanonicalRecord>(records: &mut [T], index: usize, patch: &Map<String, Value>) -> bool {
    match records.get_mut(index) {
        Some(record) => {
            *record = patch_record(record, patch);
            true
        }
        None => false,
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn summary(&self) -> &ValidationSummary {
        &self.summary
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn priorities(&self) -> &PrioritiesConfig {
        &self.priorities
    }

    pub fn ingestion_report(&self, kind: EntityKind) -> Option<&IngestionReport> {
        self.ingestion.get(&kind)
    }

    /// Missing identifier issues of every entity, clients first.
    pub fn ingestion_issues(&self) -> Vec<ValidationIssue> {
        self.ingestion.values().flat_map(|report| report.issues.iter().cloned()).collect()
    }

    /// Ingestion issues followed by the cross-entity issues.
    pub fn combined_summary(&self) -> ValidationSummary {
        let mut issues = self.ingestion_issues();
        issues.extend(self.summary.issues.iter().cloned());
        ValidationSummary::new(issues)
    }

    /// Records of one entity as JSON.
    pub fn records_json(&self, kind: EntityKind) -> Value {
        let value = match kind {
            EntityKind::Clients => serde_json::to_value(&self.clients),
            EntityKind::Workers => serde_json::to_value(&self.workers),
            EntityKind::Tasks => serde_json::to_value(&self.tasks),
        };
        value.unwrap_or(Value::Array(Vec::new()))
    }

    pub fn record_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Clients => self.clients.len(),
            EntityKind::Workers => self.workers.len(),
            EntityKind::Tasks => self.tasks.len(),
        }
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    pub fn set_clients(&mut self, clients: Vec<Client>) {
        self.clients = clients;
        self.revalidate();
    }

    pub fn set_workers(&mut self, workers: Vec<Worker>) {
        self.workers = workers;
        self.revalidate();
    }

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.revalidate();
    }

    /// Replace the clients with an upload result and keep its header map.
    pub fn load_clients(&mut self, result: ColumnMapResult<Client>) {
        self.record_header_map::<Client>(result.header_map);
        self.set_clients(result.mapped);
    }

    pub fn load_workers(&mut self, result: ColumnMapResult<Worker>) {
        self.record_header_map::<Worker>(result.header_map);
        self.set_workers(result.mapped);
    }

    pub fn load_tasks(&mut self, result: ColumnMapResult<Task>) {
        self.record_header_map::<Task>(result.header_map);
        self.set_tasks(result.mapped);
    }

    fn record_header_map<T: CanonicalRecord>(&mut self, header_map: HeaderMap) {
        self.ingestion.entry(T::KIND).or_default().header_map = header_map;
    }

    fn refresh_ingestion_issues<T: CanonicalRecord>(&mut self, issues: Vec<ValidationIssue>) {
        match self.ingestion.get_mut(&T::KIND) {
            Some(report) => report.issues = issues,
            None if !issues.is_empty() => {
                self.ingestion.insert(
                    T::KIND,
                    IngestionReport {
                        header_map: HeaderMap::default(),
                        issues,
                    },
                );
            }
            None => {}
        }
    }

    /// Patch one client. Returns `false` when `index` is out of range.
    pub fn upsert_client(&mut self, index: usize, patch: &Map<String, Value>) -> bool {
        let changed = upsert_in(&mut self.clients, index, patch);
        if changed {
            self.revalidate();
        }
        changed
    }

    pub fn upsert_worker(&mut self, index: usize, patch: &Map<String, Value>) -> bool {
        let changed = upsert_in(&mut self.workers, index, patch);
        if changed {
            self.revalidate();
        }
        changed
    }

    pub fn upsert_task(&mut self, index: usize, patch: &Map<String, Value>) -> bool {
        let changed = upsert_in(&mut self.tasks, index, patch);
        if changed {
            self.revalidate();
        }
        changed
    }

    pub fn upsert(&mut self, kind: EntityKind, index: usize, patch: &Map<String, Value>) -> bool {
        match kind {
            EntityKind::Clients => self.upsert_client(index, patch),
            EntityKind::Workers => self.upsert_worker(index, patch),
            EntityKind::Tasks => self.upsert_task(index, patch),
        }
    }

    pub fn revalidate(&mut self) -> &ValidationSummary {
        let clients = missing_identifier_issues(&self.clients);
        let workers = missing_identifier_issues(&self.workers);
        let tasks = missing_identifier_issues(&self.tasks);
        self.refresh_ingestion_issues::<Client>(clients);
        self.refresh_ingestion_issues::<Worker>(workers);
        self.refresh_ingestion_issues::<Task>(tasks);

        self.summary = validate(&self.clients, &self.workers, &self.tasks);
        &self.summary
    }

    // -------------------------------------------------------------------------
    // Rules
    // -------------------------------------------------------------------------

    pub fn add_rule(&mut self, rule: Rule) -> Result<(), RuleError> {
        rule.check()?;
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(RuleError::DuplicateId(rule.id));
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn remove_rule(&mut self, id: &str) -> Result<Rule, RuleError> {
        let position = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        Ok(self.rules.remove(position))
    }

    /// Put the listed rules first, in the given order, and renumber
    /// priorities from 1. Unlisted rules follow in their current order.
    pub fn reorder_rules(&mut self, ordered_ids: &[String]) {
        let mut remaining = std::mem::take(&mut self.rules);
        let mut placed = HashSet::new();
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in ordered_ids {
            if !placed.insert(id.as_str()) {
                continue;
            }
            if let Some(position) = remaining.iter().position(|r| &r.id == id) {
                ordered.push(remaining.remove(position));
            }
        }
        ordered.append(&mut remaining);

        for (index, rule) in ordered.iter_mut().enumerate() {
            rule.priority = u32::try_from(index + 1).ok();
        }
        self.rules = ordered;
    }

    // -------------------------------------------------------------------------
    // Priorities and bundle
    // -------------------------------------------------------------------------

    pub fn set_priorities(&mut self, priorities: PrioritiesConfig) {
        self.priorities = priorities;
    }

    pub fn apply_preset(&mut self, profile: Profile) -> &PrioritiesConfig {
        self.priorities.apply_preset(profile);
        &self.priorities
    }

    /// Replace rules and priorities with an already-checked bundle.
    pub fn replace_rules_bundle(&mut self, bundle: RulesBundle) {
        self.rules = bundle.rules;
        self.priorities = bundle.priorities;
    }

    pub fn rules_bundle(&self) -> RulesBundle {
        RulesBundle {
            rules: self.rules.clone(),
            priorities: self.priorities.clone(),
        }
    }

    pub fn export_bundle(&self) -> ExportBundle {
        ExportBundle {
            clients: self.clients.clone(),
            workers: self.workers.clone(),
            tasks: self.tasks.clone(),
            rules_bundle: self.rules_bundle(),
            exported_at: Utc::now(),
        }
    }
}

//! Cross-entity validation of canonical records.
//!
//! [`validate`] is pure and deterministic. Checks run in a fixed order and
//! each one only appends issues, so the output order is stable:
//!
//! 1. Duplicate identifiers per collection
//! 2. Client ranges (`PriorityLevel`, `AttributesJSON`)
//! 3. Worker ranges (`AvailableSlots`, `MaxLoadPerPhase`)
//! 4. Task ranges (`Duration`, `MaxConcurrent`)
//! 5. Requested task references
//! 6. Skill coverage
//!
//! [`bundle`] holds the JSON Schema check used when importing rules.

pub mod bundle;
pub mod issue;

use std::collections::HashSet;

use crate::models::{Client, EntityKind, Task, Worker};

pub use bundle::{import_bundle, parse_bundle, validate_bundle};
pub use issue::{IssueCounts, IssueLevel, ValidationIssue, ValidationSummary};

/// Validate the three collections together.
pub fn validate(clients: &[Client], workers: &[Worker], tasks: &[Task]) -> ValidationSummary {
    let mut issues = Vec::new();

    check_duplicates(EntityKind::Clients, clients.iter().map(|c| c.client_id.as_str()), &mut issues);
    check_duplicates(EntityKind::Workers, workers.iter().map(|w| w.worker_id.as_str()), &mut issues);
    check_duplicates(EntityKind::Tasks, tasks.iter().map(|t| t.task_id.as_str()), &mut issues);

    check_clients(clients, &mut issues);
    check_workers(workers, &mut issues);
    check_tasks(tasks, &mut issues);
    check_requested_tasks(clients, tasks, &mut issues);
    check_skill_coverage(workers, tasks, &mut issues);

    ValidationSummary::new(issues)
}

/// Issue located on one row, keyed `<check>:<index>:<id>`.
fn row_issue(kind: EntityKind, check: &str, index: usize, id: &str, column: &str, message: String) -> ValidationIssue {
    ValidationIssue::error(format!("{}:{}:{}", check, index, id), kind, message)
        .with_row(id)
        .with_row_index(index)
        .with_column(column)
}

fn check_duplicates<'a>(
    kind: EntityKind,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut seen = HashSet::new();
    let label = kind.label();
    for (index, id) in ids.enumerate() {
        if !seen.insert(id) {
            issues.push(
                ValidationIssue::error(
                    format!("dup-{}:{}:{}", label.to_lowercase(), id, index),
                    kind,
                    format!("Duplicate {}", kind.id_field()),
                )
                .with_row(id)
                .with_row_index(index)
                .with_column(kind.id_field()),
            );
        }
    }
}

fn out_of_range(value: f64, min: f64, max: f64) -> bool {
    value.is_nan() || value < min || value > max
}

fn check_clients(clients: &[Client], issues: &mut Vec<ValidationIssue>) {
    let kind = EntityKind::Clients;
    for (index, client) in clients.iter().enumerate() {
        let id = client.client_id.as_str();
        if out_of_range(client.priority_level, 1.0, 5.0) {
            issues.push(row_issue(
                kind,
                "client-priority",
                index,
                id,
                "PriorityLevel",
                "PriorityLevel must be between 1 and 5".to_string(),
            ));
        }
        if client.attributes.is_invalid() {
            issues.push(row_issue(
                kind,
                "client-attr",
                index,
                id,
                "AttributesJSON",
                "AttributesJSON contains invalid JSON".to_string(),
            ));
        }
    }
}

fn check_workers(workers: &[Worker], issues: &mut Vec<ValidationIssue>) {
    let kind = EntityKind::Workers;
    for (index, worker) in workers.iter().enumerate() {
        let id = worker.worker_id.as_str();
        if worker.available_slots.iter().any(|s| !s.is_finite()) {
            issues.push(row_issue(
                kind,
                "worker-slots",
                index,
                id,
                "AvailableSlots",
                "AvailableSlots contains non-numeric entries".to_string(),
            ));
        }
        if out_of_range(worker.max_load_per_phase, 0.0, f64::INFINITY) {
            issues.push(row_issue(
                kind,
                "worker-maxload",
                index,
                id,
                "MaxLoadPerPhase",
                "MaxLoadPerPhase must be >= 0".to_string(),
            ));
        }
    }
}

fn check_tasks(tasks: &[Task], issues: &mut Vec<ValidationIssue>) {
    let kind = EntityKind::Tasks;
    for (index, task) in tasks.iter().enumerate() {
        let id = task.task_id.as_str();
        if out_of_range(task.duration, 1.0, f64::INFINITY) {
            issues.push(row_issue(kind, "task-duration", index, id, "Duration", "Duration must be >= 1".to_string()));
        }
        if out_of_range(task.max_concurrent, 1.0, f64::INFINITY) {
            issues.push(row_issue(
                kind,
                "task-concurrent",
                index,
                id,
                "MaxConcurrent",
                "MaxConcurrent must be >= 1".to_string(),
            ));
        }
    }
}

fn check_requested_tasks(clients: &[Client], tasks: &[Task], issues: &mut Vec<ValidationIssue>) {
    let known: HashSet<&str> = tasks.iter().map(|t| t.task_id.as_str()).collect();
    for (index, client) in clients.iter().enumerate() {
        let mut unknown: Vec<&str> = Vec::new();
        for requested in &client.requested_task_ids {
            if !known.contains(requested.as_str()) && !unknown.contains(&requested.as_str()) {
                unknown.push(requested);
            }
        }
        if !unknown.is_empty() {
            issues.push(row_issue(
                EntityKind::Clients,
                "client-unknown-tasks",
                index,
                &client.client_id,
                "RequestedTaskIDs",
                format!("Unknown RequestedTaskIDs: {}", unknown.join(", ")),
            ));
        }
    }
}

fn check_skill_coverage(workers: &[Worker], tasks: &[Task], issues: &mut Vec<ValidationIssue>) {
    let offered: HashSet<String> = workers
        .iter()
        .flat_map(|w| &w.skills)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut missing: Vec<String> = Vec::new();
    for skill in tasks.iter().flat_map(|t| &t.required_skills) {
        let skill = skill.trim().to_lowercase();
        if !skill.is_empty() && !offered.contains(&skill) && !missing.contains(&skill) {
            missing.push(skill);
        }
    }

    if !missing.is_empty() {
        issues.push(
            ValidationIssue::error(
                "skill-coverage",
                EntityKind::Tasks,
                format!("No workers possess required skills: {}", missing.join(", ")),
            )
            .with_column("RequiredSkills"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attributes;

    fn client(id: &str, priority: f64, requested: &[&str]) -> Client {
        Client {
            client_id: id.into(),
            priority_level: priority,
            requested_task_ids: requested.iter().map(|s| s.to_string()).collect(),
            ..Client::default()
        }
    }

    fn worker(id: &str, skills: &[&str]) -> Worker {
        Worker {
            worker_id: id.into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            max_load_per_phase: 1.0,
            ..Worker::default()
        }
    }

    fn task(id: &str, skills: &[&str]) -> Task {
        Task {
            task_id: id.into(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            duration: 1.0,
            max_concurrent: 1.0,
            ..Task::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let summary = validate(&[], &[], &[]);
        assert!(summary.is_empty());
        assert_eq!(summary.counts(), IssueCounts::default());
    }

    #[test]
    fn test_duplicate_reported_once_on_later_row() {
        let clients = vec![client("C1", 3.0, &[]), client("C2", 3.0, &[]), client("C1", 3.0, &[])];
        let summary = validate(&clients, &[], &[]);

        assert_eq!(summary.issues.len(), 1);
        let issue = &summary.issues[0];
        assert_eq!(issue.id, "dup-client:C1:2");
        assert_eq!(issue.message, "Duplicate ClientID");
        assert_eq!(issue.row_index, Some(2));
    }

    #[test]
    fn test_priority_bounds() {
        let clients = vec![
            client("C1", 1.0, &[]),
            client("C2", 5.0, &[]),
            client("C3", 0.0, &[]),
            client("C4", 6.0, &[]),
        ];
        let summary = validate(&clients, &[], &[]);
        let flagged: Vec<_> = summary.issues.iter().filter_map(|i| i.row_id.as_deref()).collect();
        assert_eq!(flagged, vec!["C3", "C4"]);
        assert!(summary.issues.iter().all(|i| i.message == "PriorityLevel must be between 1 and 5"));
    }

    #[test]
    fn test_invalid_attributes() {
        let mut bad = client("C1", 2.0, &[]);
        bad.attributes = Attributes::Invalid("{oops".into());
        let summary = validate(&[bad, client("C2", 2.0, &[])], &[], &[]);
        assert_eq!(summary.issues.len(), 1);
        assert_eq!(summary.issues[0].column.as_deref(), Some("AttributesJSON"));
    }

    #[test]
    fn test_unknown_requested_tasks() {
        let clients = vec![client("C1", 2.0, &["T1", "T9"])];
        let tasks = vec![task("T1", &[])];
        let summary = validate(&clients, &[], &tasks);

        assert_eq!(summary.issues.len(), 1);
        assert_eq!(summary.issues[0].message, "Unknown RequestedTaskIDs: T9");
        assert_eq!(summary.issues[0].entity, EntityKind::Clients);
    }

    #[test]
    fn test_skill_coverage_single_aggregate() {
        let workers = vec![worker("W1", &["Welding"])];
        let tasks = vec![task("T1", &["welding", "painting"]), task("T2", &["Painting"])];
        let summary = validate(&[], &workers, &tasks);

        assert_eq!(summary.issues.len(), 1);
        let issue = &summary.issues[0];
        assert_eq!(issue.id, "skill-coverage");
        assert!(issue.message.contains("painting"));
        assert!(!issue.message.contains("welding"));
    }

    #[test]
    fn test_worker_and_task_ranges() {
        let mut w = worker("W1", &[]);
        w.max_load_per_phase = -1.0;
        w.available_slots = vec![1.0, f64::NAN];
        let mut t = task("T1", &[]);
        t.duration = 0.0;
        t.max_concurrent = 0.5;

        let summary = validate(&[], &[w], &[t]);
        let ids: Vec<_> = summary.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["worker-slots:0:W1", "worker-maxload:0:W1", "task-duration:0:T1", "task-concurrent:0:T1"]
        );
        assert_eq!(summary.counts().error, 4);
    }

    #[test]
    fn test_emission_order_and_determinism() {
        let clients = vec![client("C1", 9.0, &["T5"]), client("C1", 2.0, &[])];
        let tasks = vec![task("T1", &["x"])];
        let first = validate(&clients, &[], &tasks);
        let second = validate(&clients, &[], &tasks);
        assert_eq!(first, second);

        let ids: Vec<_> = first.issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["dup-client:C1:1", "client-priority:0:C1", "client-unknown-tasks:0:C1", "skill-coverage"]
        );
    }
}

//! Row → canonical record coercion, one function per entity.
//!
//! Rows are expected to be keyed by canonical names already (see
//! [`super::headers::map_row`]). Missing columns coerce like empty cells.

use serde_json::{Map, Value};

use super::coerce;
use super::CanonicalRecord;
use crate::models::{Client, EntityKind, Task, Worker};

pub fn normalize_client(row: &Map<String, Value>) -> Client {
    Client {
        client_id: coerce::text(row.get("ClientID")),
        client_name: coerce::text(row.get("ClientName")),
        priority_level: coerce::number_or_zero(row.get("PriorityLevel")),
        requested_task_ids: coerce::string_list(row.get("RequestedTaskIDs")),
        group_tag: coerce::optional_text(row.get("GroupTag")),
        attributes: coerce::attributes(row.get("AttributesJSON")),
    }
}

pub fn normalize_worker(row: &Map<String, Value>) -> Worker {
    Worker {
        worker_id: coerce::text(row.get("WorkerID")),
        worker_name: coerce::text(row.get("WorkerName")),
        skills: coerce::string_list(row.get("Skills")),
        available_slots: coerce::phase_list(row.get("AvailableSlots")),
        max_load_per_phase: coerce::number_or_zero(row.get("MaxLoadPerPhase")),
        worker_group: coerce::optional_text(row.get("WorkerGroup")),
        qualification_level: coerce::qualification(row.get("QualificationLevel")),
    }
}

pub fn normalize_task(row: &Map<String, Value>) -> Task {
    Task {
        task_id: coerce::text(row.get("TaskID")),
        task_name: coerce::text(row.get("TaskName")),
        category: coerce::optional_text(row.get("Category")),
        duration: coerce::number_or_zero(row.get("Duration")),
        required_skills: coerce::string_list(row.get("RequiredSkills")),
        preferred_phases: coerce::phase_list(row.get("PreferredPhases")),
        max_concurrent: coerce::number_or_zero(row.get("MaxConcurrent")),
    }
}

impl CanonicalRecord for Client {
    const KIND: EntityKind = EntityKind::Clients;

    fn from_row(row: &Map<String, Value>) -> Self {
        normalize_client(row)
    }

    fn identifier(&self) -> &str {
        &self.client_id
    }
}

impl CanonicalRecord for Worker {
    const KIND: EntityKind = EntityKind::Workers;

    fn from_row(row: &Map<String, Value>) -> Self {
        normalize_worker(row)
    }

    fn identifier(&self) -> &str {
        &self.worker_id
    }
}

impl CanonicalRecord for Task {
    const KIND: EntityKind = EntityKind::Tasks;

    fn from_row(row: &Map<String, Value>) -> Self {
        normalize_task(row)
    }

    fn identifier(&self) -> &str {
        &self.task_id
    }
}

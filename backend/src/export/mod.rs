//! Cleaned export: one CSV per entity plus `rules.json`.
//!
//! Columns follow the canonical table order. List cells are written as JSON
//! arrays so that commas inside values survive, and integral numbers are
//! written without a fractional part. Exported files re-ingest to the same
//! records.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportResult;
use crate::models::{format_number, Client, PhaseNumber, QualificationLevel, Task, Worker};
use crate::normalize::{alias_table, CanonicalRecord};
use crate::workspace::ExportBundle;

pub const CLIENTS_FILE: &str = "clients.cleaned.csv";
pub const WORKERS_FILE: &str = "workers.cleaned.csv";
pub const TASKS_FILE: &str = "tasks.cleaned.csv";
pub const RULES_FILE: &str = "rules.json";

/// A record that can be written as one CSV line.
pub trait ExportRow: CanonicalRecord {
    /// Cells in canonical column order.
    fn cells(&self) -> Vec<String>;
}

fn text_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn phase_cell(phases: &[PhaseNumber]) -> String {
    let parts: Vec<String> = phases.iter().map(|p| format_number(*p)).collect();
    format!("[{}]", parts.join(","))
}

fn optional_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl ExportRow for Client {
    fn cells(&self) -> Vec<String> {
        vec![
            self.client_id.clone(),
            self.client_name.clone(),
            format_number(self.priority_level),
            text_list(&self.requested_task_ids),
            optional_cell(&self.group_tag),
            self.attributes.to_cell(),
        ]
    }
}

impl ExportRow for Worker {
    fn cells(&self) -> Vec<String> {
        let qualification = match &self.qualification_level {
            Some(QualificationLevel::Number(n)) => format_number(*n),
            Some(QualificationLevel::Text(t)) => t.clone(),
            None => String::new(),
        };
        vec![
            self.worker_id.clone(),
            self.worker_name.clone(),
            text_list(&self.skills),
            phase_cell(&self.available_slots),
            format_number(self.max_load_per_phase),
            optional_cell(&self.worker_group),
            qualification,
        ]
    }
}

impl ExportRow for Task {
    fn cells(&self) -> Vec<String> {
        vec![
            self.task_id.clone(),
            self.task_name.clone(),
            optional_cell(&self.category),
            format_number(self.duration),
            text_list(&self.required_skills),
            phase_cell(&self.preferred_phases),
            format_number(self.max_concurrent),
        ]
    }
}

fn write_records<T: ExportRow, W: std::io::Write>(out: W, records: &[T]) -> ExportResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(alias_table(T::KIND).canonical_fields())?;
    for record in records {
        writer.write_record(record.cells())?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV text for a collection.
pub fn to_csv_string<T: ExportRow>(records: &[T]) -> ExportResult<String> {
    let mut buffer = Vec::new();
    write_records(&mut buffer, records)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_csv<T: ExportRow>(path: &Path, records: &[T]) -> ExportResult<()> {
    let file = fs::File::create(path)?;
    write_records(file, records)
}

/// Pretty JSON, as written to `rules.json`.
pub fn to_pretty_json<T: Serialize>(value: &T) -> ExportResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write the three cleaned CSVs and `rules.json` into `dir`, creating it if needed.
pub fn write_bundle(dir: &Path, bundle: &ExportBundle) -> ExportResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let clients = dir.join(CLIENTS_FILE);
    write_csv(&clients, &bundle.clients)?;
    let workers = dir.join(WORKERS_FILE);
    write_csv(&workers, &bundle.workers)?;
    let tasks = dir.join(TASKS_FILE);
    write_csv(&tasks, &bundle.tasks)?;

    let rules = dir.join(RULES_FILE);
    fs::write(&rules, to_pretty_json(&bundle.rules_bundle)?)?;

    Ok(vec![clients, workers, tasks, rules])
}

//! Query → task filter conversion.
//!
//! Understood phrases (case-insensitive):
//!
//! - `duration <op> N` with `>`, `>=`, `=>`, `<`, `<=`, `=`, `==`
//! - `duration more than N`, `greater than N`, `over N`
//! - `duration less than N`, `under N`
//! - `phase N`: the task lists phase N among its preferred phases

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::{PhaseNumber, Task};

static DURATION_OP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)duration\s*(>=|=>|<=|==|>|<|=)\s*(\d+)").expect("duration operator pattern is valid")
});

static DURATION_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)duration\s*(more than|greater than|over|less than|under)\s*(\d+)")
        .expect("duration phrase pattern is valid")
});

static PHASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)phase\s*(\d+)").expect("phase pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
}

impl Comparison {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Self::Greater),
            ">=" | "=>" => Some(Self::GreaterOrEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessOrEqual),
            "=" | "==" => Some(Self::Equal),
            _ => None,
        }
    }

    fn from_words(words: &str) -> Option<Self> {
        match words.to_lowercase().as_str() {
            "more than" | "greater than" | "over" => Some(Self::Greater),
            "less than" | "under" => Some(Self::Less),
            _ => None,
        }
    }

    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Self::Greater => left > right,
            Self::GreaterOrEqual => left >= right,
            Self::Less => left < right,
            Self::LessOrEqual => left <= right,
            Self::Equal => left == right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationFilter {
    pub op: Comparison,
    pub value: f64,
}

/// Criteria extracted from a query. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<DurationFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseNumber>,
}

impl TaskFilter {
    /// No criteria: every task matches.
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.phase.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(filter) = &self.duration {
            if !filter.op.holds(task.duration, filter.value) {
                return false;
            }
        }
        if let Some(phase) = self.phase {
            if !task.preferred_phases.contains(&phase) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

pub fn parse_task_filter(query: &str) -> TaskFilter {
    let duration = DURATION_OP
        .captures(query)
        .and_then(|caps| Some((Comparison::from_symbol(&caps[1])?, caps[2].parse::<f64>().ok()?)))
        .or_else(|| {
            DURATION_WORDS
                .captures(query)
                .and_then(|caps| Some((Comparison::from_words(&caps[1])?, caps[2].parse::<f64>().ok()?)))
        })
        .map(|(op, value)| DurationFilter { op, value });

    let phase = PHASE.captures(query).and_then(|caps| caps[1].parse::<f64>().ok());

    TaskFilter { duration, phase }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, duration: f64, phases: &[f64]) -> Task {
        Task {
            task_id: id.into(),
            duration,
            preferred_phases: phases.to_vec(),
            ..Task::default()
        }
    }

    fn ids(filter: &TaskFilter, tasks: &[Task]) -> Vec<String> {
        filter.apply(tasks).iter().map(|t| t.task_id.clone()).collect()
    }

    fn sample() -> Vec<Task> {
        vec![task("T1", 1.0, &[1.0]), task("T2", 2.0, &[2.0, 3.0]), task("T3", 3.0, &[3.0])]
    }

    #[test]
    fn test_operators_are_symmetric() {
        let tasks = sample();
        assert_eq!(ids(&parse_task_filter("duration > 1"), &tasks), vec!["T2", "T3"]);
        assert_eq!(ids(&parse_task_filter("duration >= 2"), &tasks), vec!["T2", "T3"]);
        assert_eq!(ids(&parse_task_filter("duration => 3"), &tasks), vec!["T3"]);
        assert_eq!(ids(&parse_task_filter("duration < 3"), &tasks), vec!["T1", "T2"]);
        assert_eq!(ids(&parse_task_filter("Duration <= 1"), &tasks), vec!["T1"]);
        assert_eq!(ids(&parse_task_filter("duration == 2"), &tasks), vec!["T2"]);
        assert_eq!(ids(&parse_task_filter("duration=2"), &tasks), vec!["T2"]);
    }

    #[test]
    fn test_word_comparisons() {
        let tasks = sample();
        assert_eq!(ids(&parse_task_filter("duration more than 2"), &tasks), vec!["T3"]);
        assert_eq!(ids(&parse_task_filter("tasks with duration over 1"), &tasks), vec!["T2", "T3"]);
        assert_eq!(ids(&parse_task_filter("duration under 2"), &tasks), vec!["T1"]);
        assert_eq!(ids(&parse_task_filter("duration less than 3"), &tasks), vec!["T1", "T2"]);
    }

    #[test]
    fn test_phase_and_combination() {
        let tasks = sample();
        assert_eq!(ids(&parse_task_filter("phase 3"), &tasks), vec!["T2", "T3"]);
        assert_eq!(ids(&parse_task_filter("duration > 2 in phase 3"), &tasks), vec!["T3"]);
    }

    #[test]
    fn test_unrecognized_query_matches_all() {
        let filter = parse_task_filter("show me everything");
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&sample()).len(), 3);
    }
}

//! Plain-language helpers, matched locally with regular expressions.
//!
//! - [`parse_rules`] - "co-run T1 T2", "phase window T3 phases 1-3"
//! - [`parse_task_filter`] - "duration > 2 phase 3" over tasks

pub mod rules;
pub mod search;

pub use rules::parse_rules;
pub use search::{parse_task_filter, Comparison, DurationFilter, TaskFilter};

//! Prioritization weights exported alongside the rules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Named weight profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Profile {
    #[default]
    Custom,
    MaximizeFulfillment,
    FairDistribution,
    MinimizeWorkload,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| format!("unknown profile '{}'", s))
    }
}

/// One weighted criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    ClientPriority,
    RequestedTasksFulfillment,
    Fairness,
    WorkloadBalance,
    Duration,
    SkillMatch,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::ClientPriority,
        Criterion::RequestedTasksFulfillment,
        Criterion::Fairness,
        Criterion::WorkloadBalance,
        Criterion::Duration,
        Criterion::SkillMatch,
    ];
}

/// Weights in `[0, 1]`. Missing fields take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weights {
    pub client_priority_weight: f64,
    pub requested_tasks_fulfillment_weight: f64,
    pub fairness_weight: f64,
    pub workload_balance_weight: f64,
    pub duration_weight: f64,
    pub skill_match_weight: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self::new([0.3, 0.3, 0.2, 0.1, 0.05, 0.05])
    }
}

impl Weights {
    /// Build from values in [`Criterion::ALL`] order.
    pub const fn new(values: [f64; 6]) -> Self {
        Self {
            client_priority_weight: values[0],
            requested_tasks_fulfillment_weight: values[1],
            fairness_weight: values[2],
            workload_balance_weight: values[3],
            duration_weight: values[4],
            skill_match_weight: values[5],
        }
    }

    /// Preset table for a named profile. `Custom` has none.
    pub fn preset(profile: Profile) -> Option<Self> {
        match profile {
            Profile::Custom => None,
            Profile::MaximizeFulfillment => Some(Self::new([0.4, 0.4, 0.1, 0.05, 0.025, 0.025])),
            Profile::FairDistribution => Some(Self::new([0.2, 0.25, 0.3, 0.15, 0.05, 0.05])),
            Profile::MinimizeWorkload => Some(Self::new([0.2, 0.25, 0.15, 0.3, 0.05, 0.05])),
        }
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::ClientPriority => self.client_priority_weight,
            Criterion::RequestedTasksFulfillment => self.requested_tasks_fulfillment_weight,
            Criterion::Fairness => self.fairness_weight,
            Criterion::WorkloadBalance => self.workload_balance_weight,
            Criterion::Duration => self.duration_weight,
            Criterion::SkillMatch => self.skill_match_weight,
        }
    }

    /// Set one weight, clamped to `[0, 1]`. NaN becomes 0.
    pub fn set(&mut self, criterion: Criterion, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let slot = match criterion {
            Criterion::ClientPriority => &mut self.client_priority_weight,
            Criterion::RequestedTasksFulfillment => &mut self.requested_tasks_fulfillment_weight,
            Criterion::Fairness => &mut self.fairness_weight,
            Criterion::WorkloadBalance => &mut self.workload_balance_weight,
            Criterion::Duration => &mut self.duration_weight,
            Criterion::SkillMatch => &mut self.skill_match_weight,
        };
        *slot = value;
    }
}

/// Prioritization settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritiesConfig {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub weights: Weights,
    /// Ordered criteria names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Vec<String>>,
    /// Optional AHP pairwise comparison matrix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairwise_matrix: Option<Vec<Vec<f64>>>,
}

impl PrioritiesConfig {
    /// Manual weight edit; the profile is kept as is.
    pub fn set_weight(&mut self, criterion: Criterion, value: f64) {
        self.weights.set(criterion, value);
    }

    /// Switch to a preset profile. `Custom` only changes the label.
    pub fn apply_preset(&mut self, profile: Profile) {
        if let Some(weights) = Weights::preset(profile) {
            self.weights = weights;
        }
        self.profile = profile;
    }

    /// Spread weight evenly across criteria (two decimals) and mark as custom.
    pub fn equalize(&mut self) {
        let each = (100.0 / Criterion::ALL.len() as f64).round() / 100.0;
        for criterion in Criterion::ALL {
            self.weights.set(criterion, each);
        }
        self.profile = Profile::Custom;
    }
}

//! Scenario-level aggregation and target-intensity projection
//!
//! A scenario is an ordered list of up to ten workouts ridden back to back with
//! a fixed rest between them. Workouts whose data could not be loaded are
//! passed in as `None`: they add nothing to the sums and stay out of the
//! weighted-average denominators.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PlannerError, Result};
use crate::metrics::SECONDS_PER_HOUR;
use crate::models::{ScenarioCombinedMetrics, TargetProjection, WorkoutMetrics};
use crate::profile::{resolve_percent, StoredProfile};

/// Rest between consecutive workouts, in seconds
pub const DEFAULT_REST_SECONDS: f64 = 600.0;

/// Workouts in a full challenge
pub const MAX_WORKOUTS: usize = 10;

/// Ordered selection of workouts making up a scenario
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioPlan {
    /// Display name
    #[serde(default)]
    pub name: String,

    /// Workout identifiers in riding order
    pub workouts: Vec<String>,
}

impl ScenarioPlan {
    pub fn new(name: impl Into<String>, workouts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            workouts,
        }
    }

    /// Check the plan fits in the challenge
    pub fn validate(&self, max_workouts: usize) -> Result<()> {
        if self.workouts.len() > max_workouts {
            return Err(PlannerError::Validation(format!(
                "Plan '{}' has {} workouts, at most {} allowed",
                self.name,
                self.workouts.len(),
                max_workouts
            )));
        }

        if let Some(blank) = self.workouts.iter().position(|id| id.trim().is_empty()) {
            return Err(PlannerError::Validation(format!(
                "Plan '{}' has an empty workout id at position {}",
                self.name,
                blank + 1
            )));
        }

        Ok(())
    }

    /// Read a plan from a JSON file: `{ "name": "...", "workouts": ["id", ...] }`.
    /// A nameless plan is named after the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut plan: ScenarioPlan = serde_json::from_str(&content)?;
        if plan.name.trim().is_empty() {
            plan.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("scenario")
                .to_string();
        }
        Ok(plan)
    }
}

/// `Some(value)` unless the value is NaN. Infinity passes through.
fn not_nan(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Round half toward positive infinity; NaN and infinities pass through
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Combines per-workout metrics into scenario totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioAggregator {
    rest_between_workouts: f64,
}

impl Default for ScenarioAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_REST_SECONDS)
    }
}

impl ScenarioAggregator {
    pub fn new(rest_between_workouts: f64) -> Self {
        Self {
            rest_between_workouts,
        }
    }

    /// Scenario totals.
    ///
    /// Rest is counted between every pair of consecutive slots, including
    /// slots whose data is unavailable. IF and NP are duration-weighted means
    /// over the available workouts (0 when there is no ride time).
    pub fn combine(&self, workouts: &[Option<WorkoutMetrics>]) -> ScenarioCombinedMetrics {
        let mut total_duration = 0.0;
        let mut total_tss = 0.0;
        let mut weighted_if = 0.0;
        let mut weighted_np = 0.0;

        for metrics in workouts.iter().flatten() {
            total_duration += metrics.duration;
            total_tss += metrics.training_stress_score;
            weighted_if += metrics.intensity_factor * metrics.duration;
            weighted_np += metrics.normalized_power * metrics.duration;
        }

        let rest_blocks = workouts.len().saturating_sub(1) as f64;

        let (average_if, total_np) = if total_duration == 0.0 {
            (0.0, 0.0)
        } else {
            (weighted_if / total_duration, weighted_np / total_duration)
        };

        ScenarioCombinedMetrics {
            total_duration,
            total_elapsed_duration: total_duration + rest_blocks * self.rest_between_workouts,
            total_tss,
            average_if,
            total_np,
        }
    }

    /// Project totals onto the profile's target intensity
    pub fn project(
        combined: &ScenarioCombinedMetrics,
        profile: Option<&StoredProfile>,
    ) -> TargetProjection {
        Self::project_at(combined, resolve_percent(profile))
    }

    /// Project totals onto an already-resolved target intensity percentage.
    ///
    /// `averageIF`, `totalNP` and `totalDuration` are NaN-guarded to 0
    /// independently, so one bad field does not spoil the others. Only NaN is
    /// guarded: an infinite IF yields an infinite TSS.
    pub fn project_at(combined: &ScenarioCombinedMetrics, target_percent: f64) -> TargetProjection {
        let factor = target_percent / 100.0;

        let target_if = not_nan(combined.average_if).unwrap_or(0.0) * factor;
        let target_np = not_nan(combined.total_np).unwrap_or(0.0) * factor;
        let duration_hours = not_nan(combined.total_duration).unwrap_or(0.0) / SECONDS_PER_HOUR;

        let total_target_tss =
            not_nan(round_half_up(target_if.powi(2) * duration_hours * 100.0)).unwrap_or(0.0);
        let average_target_if = not_nan(round_half_up(target_if * 100.0) / 100.0).unwrap_or(0.0);
        let total_target_np = not_nan(round_half_up(target_np)).unwrap_or(0.0);

        TargetProjection {
            target_intensity_percent: target_percent,
            target_if,
            target_np,
            duration_hours,
            total_target_tss,
            average_target_if,
            total_target_np,
        }
    }
}

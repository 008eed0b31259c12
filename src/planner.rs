//! Scenario planning: telemetry -> source selection -> metrics -> totals
//!
//! Per-workout work is independent and pure, so it runs on the rayon pool;
//! results keep plan order.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{ErrorSeverity, LibraryError, PlannerError, Result};
use crate::library::WorkoutLibrary;
use crate::metrics::MetricsEngine;
use crate::models::{ScenarioCombinedMetrics, TargetProjection, WorkoutMetrics};
use crate::profile::EffectiveProfile;
use crate::scenario::{ScenarioAggregator, ScenarioPlan, MAX_WORKOUTS};
use crate::source::{SourceKind, SourceSelector};

/// Outcome for one slot of a plan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutReport {
    /// 1-based position in the plan
    pub position: usize,
    pub workout_id: String,
    pub source: Option<SourceKind>,
    pub used_fallback: bool,
    /// `None` when the workout's data was unavailable or unusable
    pub metrics: Option<WorkoutMetrics>,
    /// Why metrics are missing
    pub note: Option<String>,
}

/// Full planning result for a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub name: String,
    pub profile: EffectiveProfile,
    pub workouts: Vec<WorkoutReport>,
    pub combined: ScenarioCombinedMetrics,
    pub projection: TargetProjection,
}

impl ScenarioReport {
    pub fn available_workouts(&self) -> usize {
        self.workouts.iter().filter(|w| w.metrics.is_some()).count()
    }
}

/// Runs a scenario plan against a workout library and a resolved profile
#[derive(Debug)]
pub struct ScenarioPlanner<'a> {
    library: &'a WorkoutLibrary,
    profile: EffectiveProfile,
    aggregator: ScenarioAggregator,
    max_workouts: usize,
}

impl<'a> ScenarioPlanner<'a> {
    pub fn new(library: &'a WorkoutLibrary, profile: EffectiveProfile) -> Self {
        Self {
            library,
            profile,
            aggregator: ScenarioAggregator::default(),
            max_workouts: MAX_WORKOUTS,
        }
    }

    pub fn with_aggregator(mut self, aggregator: ScenarioAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_max_workouts(mut self, max_workouts: usize) -> Self {
        self.max_workouts = max_workouts;
        self
    }

    /// Evaluate every workout in the plan and aggregate.
    ///
    /// Only an invalid plan is an error; unavailable workouts are reported
    /// per slot and excluded from the averages.
    pub fn plan(&self, plan: &ScenarioPlan) -> Result<ScenarioReport> {
        plan.validate(self.max_workouts)?;

        info!(
            scenario = %plan.name,
            workouts = plan.workouts.len(),
            target_intensity = self.profile.target_intensity,
            "Planning scenario"
        );

        let workouts: Vec<WorkoutReport> = plan
            .workouts
            .par_iter()
            .enumerate()
            .map(|(index, workout_id)| self.evaluate_workout(index + 1, workout_id))
            .collect();

        let metrics: Vec<Option<WorkoutMetrics>> = workouts.iter().map(|w| w.metrics).collect();
        let combined = self.aggregator.combine(&metrics);
        let projection = ScenarioAggregator::project_at(&combined, self.profile.target_intensity);

        let report = ScenarioReport {
            name: plan.name.clone(),
            profile: self.profile,
            workouts,
            combined,
            projection,
        };

        info!(
            scenario = %report.name,
            available = report.available_workouts(),
            total_tss = report.combined.total_tss,
            target_tss = report.projection.total_target_tss,
            "Scenario planned"
        );

        Ok(report)
    }

    fn evaluate_workout(&self, position: usize, workout_id: &str) -> WorkoutReport {
        let raw = match self.library.load_raw(workout_id) {
            Ok(raw) => raw,
            Err(e) => {
                match e.severity() {
                    ErrorSeverity::Warning => {
                        warn!(workout_id, error = %e, "Workout telemetry unavailable")
                    }
                    ErrorSeverity::Error => {
                        error!(workout_id, error = %e, "Failed to load workout telemetry")
                    }
                }
                return WorkoutReport {
                    position,
                    workout_id: workout_id.to_string(),
                    source: None,
                    used_fallback: false,
                    metrics: None,
                    note: Some(e.user_message()),
                };
            }
        };

        let selection = SourceSelector::select_best_source(&raw);
        let metrics = MetricsEngine::try_compute_metrics(
            workout_id,
            selection.data.as_ref(),
            Some(&self.profile.power),
        );

        let note = match (&selection.data, &metrics) {
            (None, _) => Some(
                PlannerError::from(LibraryError::MissingData {
                    workout_id: workout_id.to_string(),
                })
                .user_message(),
            ),
            (Some(_), None) => Some(format!(
                "Workout data for {} could not be processed",
                workout_id
            )),
            _ => None,
        };

        WorkoutReport {
            position,
            workout_id: workout_id.to_string(),
            source: selection.kind,
            used_fallback: selection.used_fallback,
            metrics,
            note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiderPowerProfile;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_workout(dir: &std::path::Path, id: &str, indoor: &[f64], outdoor: Option<&[f64]>) {
        let trace = |values: &[f64]| {
            let time: Vec<f64> = (0..values.len()).map(|i| i as f64 * 600.0).collect();
            json!({ "time": time, "value": values, "type": vec!["FTP"; values.len()] })
        };
        let raw = json!({
            "data": {
                "workoutGraphTriggers": {
                    "indoor": trace(indoor),
                    "outdoor": outdoor.map(trace),
                }
            }
        });
        fs::write(dir.join(format!("{}.json", id)), raw.to_string()).unwrap();
    }

    fn profile(target_intensity: f64) -> EffectiveProfile {
        EffectiveProfile {
            power: RiderPowerProfile::new(1000.0, 450.0, 330.0, 250.0),
            target_intensity,
        }
    }

    #[test]
    fn test_plan_aggregates_in_order() {
        let dir = tempdir().unwrap();
        // One hour at FTP, sampled every 10 minutes
        write_workout(dir.path(), "threshold", &[1.0; 7], None);
        write_workout(dir.path(), "flat-indoor", &[0.0; 4], Some(&[1.0; 4]));

        let library = WorkoutLibrary::new(dir.path());
        let planner = ScenarioPlanner::new(&library, profile(80.0));
        let plan = ScenarioPlan::new(
            "test",
            vec!["threshold".into(), "flat-indoor".into(), "missing".into()],
        );

        let report = planner.plan(&plan).unwrap();

        assert_eq!(report.workouts.len(), 3);
        assert_eq!(report.workouts[0].workout_id, "threshold");
        assert_eq!(report.workouts[0].source, Some(SourceKind::Indoor));
        assert!(report.workouts[1].used_fallback);
        assert_eq!(report.workouts[1].source, Some(SourceKind::Outdoor));
        assert!(report.workouts[2].metrics.is_none());
        assert!(report.workouts[2].note.is_some());
        assert_eq!(report.available_workouts(), 2);

        assert_eq!(report.combined.total_duration, 3600.0 + 1800.0);
        assert_eq!(report.combined.total_elapsed_duration, 5400.0 + 2.0 * 600.0);
        assert!((report.combined.average_if - 1.0).abs() < 1e-9);
        assert_eq!(report.projection.average_target_if, 0.8);
        assert_eq!(report.projection.total_target_np, 200.0);
    }

    #[test]
    fn test_plan_rejects_too_many_workouts() {
        let dir = tempdir().unwrap();
        let library = WorkoutLibrary::new(dir.path());
        let planner = ScenarioPlanner::new(&library, profile(70.0)).with_max_workouts(2);
        let plan = ScenarioPlan::new("long", vec!["a".into(), "b".into(), "c".into()]);

        assert!(matches!(planner.plan(&plan), Err(PlannerError::Validation(_))));
    }

    #[test]
    fn test_malformed_workout_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let raw = json!({
            "data": {
                "workoutGraphTriggers": {
                    "indoor": { "time": [0, 60], "value": [1.0], "type": ["FTP"] }
                }
            }
        });
        fs::write(dir.path().join("lopsided.json"), raw.to_string()).unwrap();

        let library = WorkoutLibrary::new(dir.path());
        let report = ScenarioPlanner::new(&library, profile(70.0))
            .plan(&ScenarioPlan::new("one", vec!["lopsided".into()]))
            .unwrap();

        assert!(report.workouts[0].metrics.is_none());
        assert_eq!(report.combined, ScenarioCombinedMetrics::default());
        assert_eq!(report.projection.total_target_tss, 0.0);
    }
}

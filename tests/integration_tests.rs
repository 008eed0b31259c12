use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use sufferplan::export::{self, ExportFormat};
use sufferplan::profile::DEFAULT_POWER_PROFILE;
use sufferplan::{
    AppConfig, MetricsEngine, RiderPowerProfile, ScenarioAggregator, ScenarioPlan, ScenarioPlanner,
    SourceKind, SourceSelector, StoredProfile, WorkoutMetrics,
};

/// Integration tests that run the complete planning workflow

fn trace(relative_power: &[f64], zone: &str, step_seconds: f64) -> Value {
    let time: Vec<f64> = (0..relative_power.len()).map(|i| i as f64 * step_seconds).collect();
    json!({
        "time": time,
        "value": relative_power,
        "type": vec![zone; relative_power.len()],
    })
}

fn write_workout(dir: &Path, id: &str, indoor: Value, outdoor: Value) {
    let raw = json!({
        "data": { "workoutGraphTriggers": { "indoor": indoor, "outdoor": outdoor } }
    });
    fs::write(dir.join(format!("{}.json", id)), raw.to_string()).unwrap();
}

/// One hour at FTP and a 30 minute sweet spot ride whose indoor trace is empty
fn seed_library(dir: &Path) {
    write_workout(dir, "steady", trace(&[1.0; 61], "FTP", 60.0), Value::Null);
    write_workout(
        dir,
        "sweetspot",
        trace(&[0.0; 31], "FTP", 60.0),
        trace(&[0.9; 31], "FTP", 60.0),
    );
}

fn config_for(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.library.directory = dir.to_path_buf();
    config
}

#[test]
fn test_plan_with_default_profile() {
    let dir = tempdir().unwrap();
    seed_library(dir.path());
    let config = config_for(dir.path());
    let library = config.workout_library();

    let plan = ScenarioPlan::new(
        "weekend",
        vec!["steady".to_string(), "sweetspot".to_string(), "ghost".to_string()],
    );
    let report = ScenarioPlanner::new(&library, config.effective_profile())
        .with_aggregator(config.aggregator())
        .plan(&plan)
        .unwrap();

    let steady = report.workouts[0].metrics.unwrap();
    assert_eq!(steady.normalized_power, 250.0);
    assert!((steady.intensity_factor - 1.0).abs() < 1e-12);
    assert!((steady.training_stress_score - 100.0).abs() < 1e-9);

    let sweetspot = &report.workouts[1];
    assert!(sweetspot.used_fallback);
    assert_eq!(sweetspot.source, Some(SourceKind::Outdoor));
    let sweetspot = sweetspot.metrics.unwrap();
    assert_eq!(sweetspot.normalized_power, 225.0);
    assert!((sweetspot.training_stress_score - 40.5).abs() < 1e-9);

    assert!(report.workouts[2].metrics.is_none());
    assert_eq!(
        report.workouts[2].note.as_deref(),
        Some("Workout data not available for ghost")
    );

    // Three slots ridden back to back: two rests
    assert_eq!(report.combined.total_duration, 5400.0);
    assert_eq!(report.combined.total_elapsed_duration, 5400.0 + 1200.0);
    assert!((report.combined.total_tss - 140.5).abs() < 1e-9);
    assert!((report.combined.average_if - 5220.0 / 5400.0).abs() < 1e-12);
    assert!((report.combined.total_np - 1_305_000.0 / 5400.0).abs() < 1e-9);

    assert_eq!(report.projection.target_intensity_percent, 70.0);
    assert_eq!(report.projection.total_target_tss, 69.0);
    assert_eq!(report.projection.average_target_if, 0.68);
    assert_eq!(report.projection.total_target_np, 169.0);
}

#[test]
fn test_stored_target_intensity_drives_projection() {
    let dir = tempdir().unwrap();
    seed_library(dir.path());
    let mut config = config_for(dir.path());
    config.set_profile(StoredProfile::flat(DEFAULT_POWER_PROFILE, Some(80.0)));

    let library = config.workout_library();
    let report = ScenarioPlanner::new(&library, config.effective_profile())
        .plan(&ScenarioPlan::new("two", vec!["steady".into(), "sweetspot".into()]))
        .unwrap();

    assert_eq!(report.combined.total_elapsed_duration, 6000.0);
    assert_eq!(report.projection.total_target_tss, 90.0);
    assert_eq!(report.projection.average_target_if, 0.77);
    assert_eq!(report.projection.total_target_np, 193.0);
}

#[test]
fn test_json_report_uses_wire_names() {
    let dir = tempdir().unwrap();
    seed_library(dir.path());
    let config = config_for(dir.path());
    let library = config.workout_library();

    let report = ScenarioPlanner::new(&library, config.effective_profile())
        .plan(&ScenarioPlan::new("json", vec!["steady".into()]))
        .unwrap();

    let output = dir.path().join("report.json");
    export::export_report(&report, ExportFormat::Json, Some(output.as_path())).unwrap();
    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();

    assert_eq!(written["combined"]["totalNP"], json!(250.0));
    assert_eq!(written["combined"]["totalElapsedDuration"], json!(3600.0));
    assert_eq!(written["projection"]["totalTargetNP"], json!(175.0));
    assert_eq!(written["workouts"][0]["usedFallback"], json!(false));
    assert_eq!(written["workouts"][0]["source"], json!("indoor"));
}

#[test]
fn test_plan_file_round_trip_through_config_file() {
    let dir = tempdir().unwrap();
    seed_library(dir.path());

    let config_path = dir.path().join("config.toml");
    let mut config = config_for(dir.path());
    config.planner.rest_between_workouts_seconds = 300.0;
    config.save_to_file(&config_path).unwrap();

    let plan_path = dir.path().join("plan.json");
    fs::write(&plan_path, r#"{ "name": "short rest", "workouts": ["steady", "steady"] }"#).unwrap();

    let config = AppConfig::load_or_default(&config_path).unwrap();
    let plan = ScenarioPlan::load(&plan_path).unwrap();
    let library = config.workout_library();
    let report = ScenarioPlanner::new(&library, config.effective_profile())
        .with_aggregator(config.aggregator())
        .plan(&plan)
        .unwrap();

    assert_eq!(report.name, "short rest");
    assert_eq!(report.combined.total_elapsed_duration, 7200.0 + 300.0);
}

#[test]
fn test_mixed_zone_workout_uses_each_zone_power() {
    let profile = RiderPowerProfile::new(1000.0, 450.0, 330.0, 250.0);
    let raw = json!({
        "data": {
            "workoutGraphTriggers": {
                "indoor": {
                    "time": [0, 600, 1200],
                    "value": [1.0, 1.0, 1.0],
                    "type": ["MAP", "FTP", "MAP"]
                }
            }
        }
    });

    let selection = SourceSelector::select_best_source(&raw);
    let metrics =
        MetricsEngine::try_compute_metrics("mixed", selection.data.as_ref(), Some(&profile))
            .unwrap();

    // Ten minutes at MAP then ten at FTP; the last sample sits on the end time
    assert_eq!(metrics.duration, 1200.0);
    assert!(metrics.normalized_power > 250.0 && metrics.normalized_power < 330.0);
    assert!(metrics.intensity_factor > 1.0);
}

#[test]
fn test_aggregator_direct_use() {
    let day = |duration: f64, np: f64, intensity_factor: f64| {
        Some(WorkoutMetrics {
            duration,
            normalized_power: np,
            intensity_factor,
            training_stress_score: MetricsEngine::compute_training_stress_score(
                intensity_factor,
                duration,
            ),
        })
    };

    let aggregator = ScenarioAggregator::default();
    let combined = aggregator.combine(&[day(3600.0, 200.0, 0.8), None, day(3600.0, 200.0, 0.8)]);

    assert_eq!(combined.total_elapsed_duration, 7200.0 + 1200.0);
    assert!((combined.total_tss - 128.0).abs() < 1e-9);
    assert!((combined.average_if - 0.8).abs() < 1e-12);

    let projection = ScenarioAggregator::project(
        &combined,
        Some(&StoredProfile::flat(DEFAULT_POWER_PROFILE, Some(100.0))),
    );
    assert_eq!(projection.total_target_tss, 128.0);
    assert_eq!(projection.total_target_np, 200.0);
}

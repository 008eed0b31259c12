use std::io::Write;

use crate::error::Result;
use crate::planner::ScenarioReport;

const HEADER: [&str; 9] = [
    "position",
    "workout_id",
    "source",
    "used_fallback",
    "duration_s",
    "normalized_power",
    "intensity_factor",
    "tss",
    "note",
];

fn number(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Write one row per workout, then a `TOTAL` row for the combined metrics and a
/// `TARGET` row for the projection
pub fn write_report<W: Write>(report: &ScenarioReport, writer: W) -> Result<()> {
    let mut csv = ::csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for workout in &report.workouts {
        let source = workout
            .source
            .map(|kind| format!("{:?}", kind).to_lowercase())
            .unwrap_or_default();
        let (duration, np, intensity_factor, tss) = match &workout.metrics {
            Some(m) => (
                number(m.duration, 0),
                number(m.normalized_power, 1),
                number(m.intensity_factor, 3),
                number(m.training_stress_score, 1),
            ),
            None => Default::default(),
        };

        csv.write_record([
            workout.position.to_string(),
            workout.workout_id.clone(),
            source,
            workout.used_fallback.to_string(),
            duration,
            np,
            intensity_factor,
            tss,
            workout.note.clone().unwrap_or_default(),
        ])?;
    }

    let combined = &report.combined;
    csv.write_record([
        "TOTAL".to_string(),
        report.name.clone(),
        String::new(),
        String::new(),
        number(combined.total_elapsed_duration, 0),
        number(combined.total_np, 1),
        number(combined.average_if, 3),
        number(combined.total_tss, 1),
        format!("ride time {}s", number(combined.total_duration, 0)),
    ])?;

    let projection = &report.projection;
    csv.write_record([
        "TARGET".to_string(),
        report.name.clone(),
        String::new(),
        String::new(),
        number(combined.total_duration, 0),
        number(projection.total_target_np, 0),
        number(projection.average_target_if, 2),
        number(projection.total_target_tss, 0),
        format!("at {}%", projection.target_intensity_percent),
    ])?;

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScenarioCombinedMetrics, TargetProjection, WorkoutMetrics};
    use crate::planner::WorkoutReport;
    use crate::profile::EffectiveProfile;
    use crate::source::SourceKind;

    fn sample_report() -> ScenarioReport {
        ScenarioReport {
            name: "weekend".to_string(),
            profile: EffectiveProfile::default(),
            workouts: vec![
                WorkoutReport {
                    position: 1,
                    workout_id: "threshold".to_string(),
                    source: Some(SourceKind::Outdoor),
                    used_fallback: true,
                    metrics: Some(WorkoutMetrics {
                        duration: 3600.0,
                        normalized_power: 250.0,
                        intensity_factor: 1.0,
                        training_stress_score: 100.0,
                    }),
                    note: None,
                },
                WorkoutReport {
                    position: 2,
                    workout_id: "missing".to_string(),
                    source: None,
                    used_fallback: false,
                    metrics: None,
                    note: Some("Workout data not available for missing".to_string()),
                },
            ],
            combined: ScenarioCombinedMetrics {
                total_duration: 3600.0,
                total_elapsed_duration: 4200.0,
                total_tss: 100.0,
                average_if: 1.0,
                total_np: 250.0,
            },
            projection: TargetProjection {
                target_intensity_percent: 70.0,
                total_target_tss: 49.0,
                average_target_if: 0.7,
                total_target_np: 175.0,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_csv_rows() {
        let mut buffer = Vec::new();
        write_report(&sample_report(), &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("position,workout_id"));
        assert_eq!(lines[1], "1,threshold,outdoor,true,3600,250.0,1.000,100.0,");
        assert!(lines[2].starts_with("2,missing,,false,,,,,"));
        assert_eq!(lines[3], "TOTAL,weekend,,,4200,250.0,1.000,100.0,ride time 3600s");
        assert_eq!(lines[4], "TARGET,weekend,,,3600,175,0.70,49,at 70%");
    }
}

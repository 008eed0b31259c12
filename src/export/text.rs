use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::format_duration;
use crate::planner::ScenarioReport;

#[derive(Tabled)]
struct WorkoutRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Workout")]
    workout: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "NP")]
    normalized_power: String,
    #[tabled(rename = "IF")]
    intensity_factor: String,
    #[tabled(rename = "TSS")]
    tss: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Planned")]
    planned: String,
    #[tabled(rename = "Target")]
    target: String,
}

/// Render the workout table followed by the totals/target summary
pub fn render_report(report: &ScenarioReport) -> String {
    let rows: Vec<WorkoutRow> = report
        .workouts
        .iter()
        .map(|w| {
            let source = match (w.source, w.used_fallback) {
                (Some(kind), true) => format!("{:?} (fallback)", kind).to_lowercase(),
                (Some(kind), false) => format!("{:?}", kind).to_lowercase(),
                (None, _) => "-".to_string(),
            };

            match &w.metrics {
                Some(m) => WorkoutRow {
                    position: w.position,
                    workout: w.workout_id.clone(),
                    source,
                    duration: format_duration(m.duration),
                    normalized_power: format!("{:.0}W", m.normalized_power),
                    intensity_factor: format!("{:.2}", m.intensity_factor),
                    tss: format!("{:.0}", m.training_stress_score),
                },
                None => WorkoutRow {
                    position: w.position,
                    workout: w.workout_id.clone(),
                    source,
                    duration: "-".to_string(),
                    normalized_power: "-".to_string(),
                    intensity_factor: "-".to_string(),
                    tss: w.note.clone().unwrap_or_else(|| "unavailable".to_string()),
                },
            }
        })
        .collect();

    let combined = &report.combined;
    let projection = &report.projection;
    let summary = vec![
        SummaryRow {
            metric: "Ride time",
            planned: format_duration(combined.total_duration),
            target: format_duration(combined.total_duration),
        },
        SummaryRow {
            metric: "Elapsed (with rest)",
            planned: format_duration(combined.total_elapsed_duration),
            target: format_duration(combined.total_elapsed_duration),
        },
        SummaryRow {
            metric: "NP",
            planned: format!("{:.0}W", combined.total_np),
            target: format!("{}W", projection.total_target_np),
        },
        SummaryRow {
            metric: "IF",
            planned: format!("{:.2}", combined.average_if),
            target: format!("{:.2}", projection.average_target_if),
        },
        SummaryRow {
            metric: "TSS",
            planned: format!("{:.0}", combined.total_tss),
            target: format!("{}", projection.total_target_tss),
        },
    ];

    let mut workouts_table = Table::new(rows);
    workouts_table.with(Style::rounded());
    let mut summary_table = Table::new(summary);
    summary_table.with(Style::rounded());

    format!(
        "{}\n{} at {}% target intensity\n{}",
        workouts_table, report.name, projection.target_intensity_percent, summary_table
    )
}

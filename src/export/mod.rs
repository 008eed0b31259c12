use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{PlannerError, Result};
use crate::planner::ScenarioReport;

pub mod csv;
pub mod json;
pub mod text;

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(ExportFormat::Table),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(PlannerError::Validation(format!("Unsupported format: {}", s))),
        }
    }
}

/// Write a scenario report in the given format
pub fn write_report<W: Write>(
    report: &ScenarioReport,
    format: ExportFormat,
    writer: &mut W,
) -> Result<()> {
    match format {
        ExportFormat::Table => {
            writer.write_all(text::render_report(report).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        ExportFormat::Json => json::write_json(report, writer)?,
        ExportFormat::Csv => csv::write_report(report, writer)?,
    }
    Ok(())
}

/// Write a scenario report to a file, or stdout when no path is given
pub fn export_report(
    report: &ScenarioReport,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            write_report(report, format, &mut file)?;
            tracing::info!(path = %path.display(), ?format, "Report exported");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_report(report, format, &mut handle)?;
        }
    }
    Ok(())
}

/// `H:MM:SS`, or `--` for a non-finite or negative duration
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--".to_string();
    }
    let total = seconds.round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use sufferplan::export::{self, format_duration, ExportFormat};
use sufferplan::logging::init_logging;
use sufferplan::profile::{format_percent, validate_target_intensity};
use sufferplan::{
    library, AppConfig, LibraryError, MetricsEngine, PlannerError, ScenarioPlan, ScenarioPlanner,
    SourceSelector,
};

/// sufferplan - Training load planning for structured cycling workouts
///
/// Computes Normalized Power, Intensity Factor and Training Stress Score per
/// workout and projects combined totals for a multi-workout scenario at the
/// rider's target intensity.
#[derive(Parser)]
#[command(name = "sufferplan")]
#[command(author = "sufferplan Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Training load planning CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a single workout telemetry file
    Workout {
        /// Telemetry JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Plan a multi-workout scenario
    Plan {
        /// Plan JSON file ({ "name": ..., "workouts": [...] })
        #[arg(short, long)]
        file: PathBuf,

        /// Output format (table, json, csv)
        #[arg(short = 'F', long, default_value = "table")]
        format: ExportFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the stored target intensity (percent)
        #[arg(short, long)]
        target_intensity: Option<f64>,
    },

    /// List workouts available in the library
    Workouts,

    /// View or update the rider profile
    Profile {
        /// Show the effective profile
        #[arg(short, long)]
        show: bool,

        /// Set FTP (watts)
        #[arg(long)]
        set_ftp: Option<f64>,

        /// Set MAP (watts)
        #[arg(long)]
        set_map: Option<f64>,

        /// Set AC (watts)
        #[arg(long)]
        set_ac: Option<f64>,

        /// Set NM (watts)
        #[arg(long)]
        set_nm: Option<f64>,

        /// Set the target intensity (percent, 30-100)
        #[arg(long)]
        set_target_intensity: Option<f64>,
    },

    /// Show configuration
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Print the configuration file path
        #[arg(short, long)]
        path: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Workout { file } => run_workout(&config, file),
        Commands::Plan {
            file,
            format,
            output,
            target_intensity,
        } => run_plan(&config, file, format, output, target_intensity),
        Commands::Workouts => {
            let library = config.workout_library();
            let ids = library.list_workouts().with_context(|| {
                format!("Failed to list workouts in {}", library.directory().display())
            })?;
            println!(
                "{}",
                format!("{} workouts in {}", ids.len(), library.directory().display()).cyan().bold()
            );
            for id in ids {
                println!("  {}", id);
            }
            Ok(())
        }
        Commands::Profile {
            show,
            set_ftp,
            set_map,
            set_ac,
            set_nm,
            set_target_intensity,
        } => {
            let updates = ProfileUpdates {
                ftp: set_ftp,
                map: set_map,
                ac: set_ac,
                nm: set_nm,
                target_intensity: set_target_intensity,
            };
            run_profile(&mut config, &config_path, show, updates)
        }
        Commands::Config { list, path } => {
            if path || !list {
                println!("{}", config_path.display());
            }
            if list {
                let content =
                    toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
                println!("{}", content);
            }
            Ok(())
        }
    }
}

fn run_workout(config: &AppConfig, file: PathBuf) -> Result<()> {
    let raw = library::read_telemetry(&file)
        .with_context(|| format!("Failed to read telemetry from {}", file.display()))?;
    let profile = config.effective_profile();
    let workout_id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("workout")
        .to_string();

    let selection = SourceSelector::select_best_source(&raw);
    let Some(data) = selection.data.as_ref() else {
        bail!(PlannerError::from(LibraryError::MissingData { workout_id }).user_message());
    };
    let Some(metrics) =
        MetricsEngine::try_compute_metrics(&workout_id, Some(data), Some(&profile.power))
    else {
        bail!("Workout data for {} could not be processed", workout_id);
    };

    let source = match selection.kind {
        Some(kind) => format!("{:?}", kind).to_lowercase(),
        None => "-".to_string(),
    };

    println!("{}", format!("Workout {}", workout_id).green().bold());
    if selection.used_fallback {
        println!("  Source:   {} {}", source, "(indoor data was empty)".yellow());
    } else {
        println!("  Source:   {}", source);
    }
    println!("  Duration: {}", format_duration(metrics.duration));
    println!("  NP:       {:.0}W", metrics.normalized_power);
    println!("  IF:       {:.2}", metrics.intensity_factor);
    println!("  TSS:      {:.0}", metrics.training_stress_score);

    Ok(())
}

fn run_plan(
    config: &AppConfig,
    file: PathBuf,
    format: ExportFormat,
    output: Option<PathBuf>,
    target_intensity: Option<f64>,
) -> Result<()> {
    let plan = ScenarioPlan::load(&file)
        .with_context(|| format!("Failed to read plan from {}", file.display()))?;

    let mut profile = config.effective_profile();
    if let Some(percent) = target_intensity {
        profile.target_intensity = validate_target_intensity(percent)?;
    }

    let library = config.workout_library();
    let planner = ScenarioPlanner::new(&library, profile)
        .with_aggregator(config.aggregator())
        .with_max_workouts(config.planner.max_workouts);
    let report = planner.plan(&plan)?;

    export::export_report(&report, format, output.as_deref())?;

    if let Some(path) = output {
        println!("{} {}", "✓ Report written to".green(), path.display());
    }
    let missing = report.workouts.len() - report.available_workouts();
    if missing > 0 {
        let warning = format!(
            "⚠ {} workout(s) had no usable data and were left out of the averages",
            missing
        );
        eprintln!("{}", warning.yellow());
    }

    Ok(())
}

struct ProfileUpdates {
    ftp: Option<f64>,
    map: Option<f64>,
    ac: Option<f64>,
    nm: Option<f64>,
    target_intensity: Option<f64>,
}

impl ProfileUpdates {
    fn is_empty(&self) -> bool {
        self.ftp.is_none()
            && self.map.is_none()
            && self.ac.is_none()
            && self.nm.is_none()
            && self.target_intensity.is_none()
    }
}

fn run_profile(
    config: &mut AppConfig,
    config_path: &Path,
    show: bool,
    updates: ProfileUpdates,
) -> Result<()> {
    if !updates.is_empty() {
        let mut stored = config.profile.clone().unwrap_or_default();
        {
            let fields = stored.power_fields_mut();
            for (label, update, slot) in [
                ("FTP", updates.ftp, &mut fields.ftp),
                ("MAP", updates.map, &mut fields.map),
                ("AC", updates.ac, &mut fields.ac),
                ("NM", updates.nm, &mut fields.nm),
            ] {
                if let Some(watts) = update {
                    if !(watts.is_finite() && watts > 0.0) {
                        bail!(PlannerError::Validation(format!(
                            "{} must be a positive power value, got {}",
                            label, watts
                        )));
                    }
                    *slot = Some(watts);
                }
            }
        }
        if let Some(percent) = updates.target_intensity {
            stored.set_target_intensity(Some(validate_target_intensity(percent)?));
        }

        config.set_profile(stored);
        config.save_to_file(config_path)?;
        println!("{}", "✓ Profile updated".green());
    }

    if show || updates.is_empty() {
        print_profile(config);
    }

    let warnings = config.effective_profile().power.ordering_warnings();
    for warning in warnings {
        eprintln!("{} {}", "⚠".yellow(), warning.yellow());
    }

    Ok(())
}

fn print_profile(config: &AppConfig) {
    let stored = config.profile.as_ref();
    let profile = config.effective_profile();
    let source = if stored.is_some() { "stored" } else { "defaults" };

    println!("{}", format!("Rider profile ({})", source).cyan().bold());
    println!("  NM:  {:.0}W", profile.power.nm);
    println!("  AC:  {:.0}W", profile.power.ac);
    println!("  MAP: {:.0}W", profile.power.map);
    println!("  FTP: {:.0}W", profile.power.ftp);
    println!("  Target intensity: {}", format_percent(stored));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_arguments() {
        let cli = Cli::try_parse_from([
            "sufferplan", "plan", "-f", "plan.json", "-F", "csv", "-t", "85",
        ])
        .unwrap();

        match cli.command {
            Commands::Plan {
                file,
                format,
                output,
                target_intensity,
            } => {
                assert_eq!(file, PathBuf::from("plan.json"));
                assert_eq!(format, ExportFormat::Csv);
                assert!(output.is_none());
                assert_eq!(target_intensity, Some(85.0));
            }
            _ => panic!("expected the plan command"),
        }
    }

    #[test]
    fn test_workout_errors_tell_missing_from_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{ "data": {} }"#).unwrap();
        let err = run_workout(&config, empty).unwrap_err();
        assert_eq!(err.to_string(), "Workout data not available for empty");

        let lopsided = dir.path().join("lopsided.json");
        let raw = r#"{ "data": { "workoutGraphTriggers": {
            "indoor": { "time": [0, 60], "value": [1.0], "type": ["FTP"] }
        } } }"#;
        std::fs::write(&lopsided, raw).unwrap();
        let err = run_workout(&config, lopsided).unwrap_err();
        assert_eq!(err.to_string(), "Workout data for lopsided could not be processed");
    }
}

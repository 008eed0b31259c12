use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PlannerError;
use crate::library::WorkoutLibrary;
use crate::logging::LogConfig;
use crate::profile::{resolve_effective_profile, EffectiveProfile, StoredProfile};
use crate::scenario::{ScenarioAggregator, DEFAULT_REST_SECONDS, MAX_WORKOUTS};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Scenario planning settings
    #[serde(default)]
    pub planner: PlannerSettings,

    /// Workout telemetry location
    #[serde(default)]
    pub library: LibrarySettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,

    /// Stored rider profile; defaults apply when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<StoredProfile>,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Scenario planning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Rest between consecutive workouts in seconds
    pub rest_between_workouts_seconds: f64,

    /// Maximum workouts in one plan
    pub max_workouts: usize,
}

/// Workout library settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory holding `<workout_id>.json` telemetry files
    pub directory: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            planner: PlannerSettings::default(),
            library: LibrarySettings::default(),
            logging: LogConfig::default(),
            profile: None,
        }
    }
}

impl Default for PlannerSettings {
    fn default() -> Self {
        PlannerSettings {
            rest_between_workouts_seconds: DEFAULT_REST_SECONDS,
            max_workouts: MAX_WORKOUTS,
        }
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        LibrarySettings {
            directory: PathBuf::from("./workouts"),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml_str(&content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject planner settings the aggregator cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        let rest = self.planner.rest_between_workouts_seconds;
        if !rest.is_finite() || rest < 0.0 {
            return Err(PlannerError::Configuration(format!(
                "planner.rest_between_workouts_seconds must be a non-negative number, got {}",
                rest
            )));
        }
        if self.planner.max_workouts == 0 {
            return Err(PlannerError::Configuration(
                "planner.max_workouts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sufferplan")
            .join("config.toml")
    }

    /// Load configuration, using defaults when the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Profile the calculations run against
    pub fn effective_profile(&self) -> EffectiveProfile {
        resolve_effective_profile(self.profile.as_ref())
    }

    /// Replace the stored profile, normalized to the flat shape
    pub fn set_profile(&mut self, profile: StoredProfile) {
        self.profile = Some(profile.normalized());
        self.metadata.updated_at = Utc::now();
    }

    pub fn aggregator(&self) -> ScenarioAggregator {
        ScenarioAggregator::new(self.planner.rest_between_workouts_seconds)
    }

    pub fn workout_library(&self) -> WorkoutLibrary {
        WorkoutLibrary::new(&self.library.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiderPowerProfile;
    use crate::profile::{PowerFields, DEFAULT_POWER_PROFILE};
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(deserialized.planner, PlannerSettings::default());
        assert!(deserialized.profile.is_none());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.set_profile(StoredProfile::flat(
            RiderPowerProfile::new(1100.0, 480.0, 340.0, 270.0),
            Some(85.0),
        ));
        original.planner.rest_between_workouts_seconds = 300.0;

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.profile, original.profile);
        assert_eq!(loaded.planner.rest_between_workouts_seconds, 300.0);
        assert_eq!(loaded.effective_profile().target_intensity, 85.0);
        assert_eq!(loaded.effective_profile().power.ftp, 270.0);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(temp_dir.path().join("absent.toml")).unwrap();

        assert!(config.profile.is_none());
        assert_eq!(config.effective_profile().power, DEFAULT_POWER_PROFILE);
        assert_eq!(config.effective_profile().target_intensity, 70.0);
    }

    #[test]
    fn test_load_or_default_rejects_broken_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "planner = [").unwrap();

        assert!(AppConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_validate_planner_settings() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.planner.rest_between_workouts_seconds = -60.0;
        assert!(matches!(config.validate(), Err(PlannerError::Configuration(_))));

        config.planner.rest_between_workouts_seconds = 0.0;
        config.planner.max_workouts = 0;
        assert!(matches!(config.validate(), Err(PlannerError::Configuration(_))));
    }

    #[test]
    fn test_from_toml_str_reports_toml_errors() {
        assert!(matches!(
            AppConfig::from_toml_str("[metadata"),
            Err(PlannerError::Toml(_))
        ));
    }

    #[test]
    fn test_nested_profile_in_toml() {
        let content = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-01-01T00:00:00Z"
            updated_at = "2024-01-01T00:00:00Z"

            [profile.powerProfile]
            nm = 950.0
            ac = 420.0
            map = 310.0
            ftp = 240.0
            targetIntensity = 75.0
        "#;

        let mut config: AppConfig = toml::from_str(content).unwrap();
        assert!(matches!(config.profile, Some(StoredProfile::Nested(_))));
        assert_eq!(config.effective_profile().target_intensity, 75.0);
        assert_eq!(config.planner.max_workouts, 10);

        // Saving rewrites the profile in the flat shape
        let stored = config.profile.clone().unwrap();
        config.set_profile(stored);
        assert_eq!(
            config.profile,
            Some(StoredProfile::Flat(PowerFields {
                nm: Some(950.0),
                ac: Some(420.0),
                map: Some(310.0),
                ftp: Some(240.0),
                target_intensity: Some(75.0),
            }))
        );
    }
}

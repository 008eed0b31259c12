//! Unified error hierarchy for sufferplan
//!
//! The numeric core never fails on numeric input; these errors cover the
//! boundaries around it: malformed workout structure, the workout library,
//! configuration, and plan validation.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all sufferplan operations
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Workout library errors
    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Plan or profile validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Workout library errors
#[derive(Debug, Error)]
pub enum LibraryError {
    /// No telemetry file for the workout
    #[error("Workout not found: {workout_id} ({path})")]
    WorkoutNotFound { workout_id: String, path: PathBuf },

    /// Telemetry file exists but could not be parsed
    #[error("Unreadable telemetry for {workout_id}: {reason}")]
    Unreadable { workout_id: String, reason: String },

    /// Neither indoor nor outdoor data present
    #[error("No workout data available for {workout_id}")]
    MissingData { workout_id: String },
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Parallel arrays disagree or time runs backwards
    #[error("Malformed workout data: {reason}")]
    MalformedWorkout { reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },
}

/// Result type alias for sufferplan operations
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlannerError::Library(LibraryError::WorkoutNotFound { .. }) => ErrorSeverity::Warning,
            PlannerError::Library(LibraryError::MissingData { .. }) => ErrorSeverity::Warning,
            PlannerError::Validation(_) => ErrorSeverity::Warning,
            PlannerError::Calculation(_) => ErrorSeverity::Warning,
            PlannerError::Configuration(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Library(LibraryError::WorkoutNotFound { workout_id, .. })
            | PlannerError::Library(LibraryError::MissingData { workout_id }) => {
                format!("Workout data not available for {}", workout_id)
            }
            PlannerError::Library(LibraryError::Unreadable { workout_id, .. }) => {
                format!("Workout data for {} could not be read", workout_id)
            }
            PlannerError::Configuration(_) | PlannerError::Toml(_) => {
                "Unable to load configuration. Please check your config file.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the operation
    Error,
    /// Anomaly that was absorbed with a substitute value
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = PlannerError::Library(LibraryError::MissingData {
            workout_id: "the-omnium".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = PlannerError::Configuration("bad".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_user_messages() {
        let err = PlannerError::Library(LibraryError::WorkoutNotFound {
            workout_id: "nine-hammers".to_string(),
            path: PathBuf::from("library/nine-hammers.json"),
        });
        assert_eq!(err.user_message(), "Workout data not available for nine-hammers");
    }

    #[test]
    fn test_calculation_error_converts() {
        let err: PlannerError = CalculationError::MalformedWorkout {
            reason: "lengths".to_string(),
        }
        .into();
        assert!(err.to_string().contains("Malformed workout data"));
    }
}

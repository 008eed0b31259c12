//! Workout telemetry library
//!
//! Raw telemetry lives on disk as one JSON file per workout, named
//! `<workout_id>.json`, in the `{ data: { workoutGraphTriggers: { indoor, outdoor } } }`
//! shape consumed by [`crate::source::SourceSelector`].

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LibraryError, PlannerError, Result};

/// Directory of workout telemetry files
#[derive(Debug, Clone)]
pub struct WorkoutLibrary {
    directory: PathBuf,
}

impl WorkoutLibrary {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File backing a workout id
    pub fn path_for(&self, workout_id: &str) -> Result<PathBuf> {
        let valid = !workout_id.is_empty()
            && workout_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !workout_id.starts_with('.');

        if !valid {
            return Err(PlannerError::Validation(format!(
                "Invalid workout id: {:?}",
                workout_id
            )));
        }

        Ok(self.directory.join(format!("{}.json", workout_id)))
    }

    /// Load the raw telemetry payload for a workout
    pub fn load_raw(&self, workout_id: &str) -> Result<Value> {
        let path = self.path_for(workout_id)?;
        if !path.is_file() {
            return Err(LibraryError::WorkoutNotFound {
                workout_id: workout_id.to_string(),
                path,
            }
            .into());
        }

        debug!(workout_id, path = %path.display(), "Loading workout telemetry");
        read_telemetry(&path).map_err(|e| match e {
            PlannerError::Json(json) => LibraryError::Unreadable {
                workout_id: workout_id.to_string(),
                reason: json.to_string(),
            }
            .into(),
            other => other,
        })
    }

    /// Workout ids available in the library, sorted
    pub fn list_workouts(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Read a telemetry JSON file from an arbitrary path
pub fn read_telemetry(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

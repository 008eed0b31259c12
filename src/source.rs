//! Indoor/outdoor telemetry source selection
//!
//! Raw telemetry carries two recordings of the same workout. Some indoor
//! recordings are all-zero power traces, so outdoor data is preferred when the
//! indoor trace is empty or flat, and indoor placeholder data is still better
//! than nothing.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::WorkoutData;

/// Which recording a selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Indoor,
    Outdoor,
}

/// Result of picking a telemetry source
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelection {
    /// Selected workout data, `None` when neither recording is usable
    pub data: Option<WorkoutData>,

    /// True only when outdoor data replaced a missing or all-zero indoor trace
    pub used_fallback: bool,

    /// Where `data` came from
    pub kind: Option<SourceKind>,
}

/// The two candidate recordings, already extracted from the raw payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutSources {
    pub indoor: Option<WorkoutData>,
    pub outdoor: Option<WorkoutData>,
}

impl WorkoutSources {
    /// Extract `data.workoutGraphTriggers.{indoor,outdoor}` from a raw payload.
    ///
    /// Missing, null, or malformed entries become `None`; this never fails.
    pub fn from_raw(raw: &Value) -> Self {
        let triggers = raw
            .get("data")
            .and_then(|data| data.get("workoutGraphTriggers"));

        let Some(triggers) = triggers else {
            return Self::default();
        };

        Self {
            indoor: parse_recording(triggers, "indoor"),
            outdoor: parse_recording(triggers, "outdoor"),
        }
    }

    /// Apply the selection policy
    pub fn select(self) -> SourceSelection {
        match self {
            WorkoutSources {
                indoor: Some(indoor),
                ..
            } if !indoor.value.is_empty() && !indoor.all_values_zero() => SourceSelection {
                data: Some(indoor),
                used_fallback: false,
                kind: Some(SourceKind::Indoor),
            },
            WorkoutSources {
                outdoor: Some(outdoor),
                ..
            } => SourceSelection {
                data: Some(outdoor),
                used_fallback: true,
                kind: Some(SourceKind::Outdoor),
            },
            WorkoutSources {
                indoor: Some(indoor),
                outdoor: None,
            } => SourceSelection {
                data: Some(indoor),
                used_fallback: false,
                kind: Some(SourceKind::Indoor),
            },
            WorkoutSources {
                indoor: None,
                outdoor: None,
            } => SourceSelection::default(),
        }
    }
}

fn parse_recording(triggers: &Value, key: &str) -> Option<WorkoutData> {
    let entry = triggers.get(key)?;
    if entry.is_null() {
        return None;
    }

    match serde_json::from_value::<WorkoutData>(entry.clone()) {
        Ok(data) => Some(data),
        Err(e) => {
            debug!(recording = key, error = %e, "Ignoring malformed recording");
            None
        }
    }
}

/// Telemetry source selection
pub struct SourceSelector;

impl SourceSelector {
    /// Pick the recording to compute metrics from.
    ///
    /// 1. Indoor with at least one non-zero value.
    /// 2. Otherwise outdoor, whatever its contents (`used_fallback = true`).
    /// 3. Otherwise indoor even if empty or all-zero, else nothing.
    pub fn select_best_source(raw: &Value) -> SourceSelection {
        let selection = WorkoutSources::from_raw(raw).select();

        if selection.used_fallback {
            warn!("Indoor trace empty or all zero, using outdoor data");
        } else if selection.data.is_none() {
            debug!("No indoor or outdoor recording in telemetry");
        }

        selection
    }
}

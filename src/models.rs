use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::CalculationError;

/// Physiological zone a workout sample's intensity is expressed against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZoneType {
    /// Neuromuscular power, peak 5-15 seconds
    Nm,
    /// Anaerobic capacity, roughly 1-2 minutes
    Ac,
    /// Maximum aerobic power, roughly 3-8 minutes
    Map,
    /// Functional threshold power, roughly 1 hour
    Ftp,
    /// Any label outside the four-zone model; treated as FTP-relative
    Other(String),
}

impl ZoneType {
    /// Parse a zone label, case-insensitively
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "NM" => ZoneType::Nm,
            "AC" => ZoneType::Ac,
            "MAP" => ZoneType::Map,
            "FTP" => ZoneType::Ftp,
            _ => ZoneType::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ZoneType::Nm => "NM",
            ZoneType::Ac => "AC",
            ZoneType::Map => "MAP",
            ZoneType::Ftp => "FTP",
            ZoneType::Other(label) => label,
        }
    }
}

impl From<String> for ZoneType {
    fn from(label: String) -> Self {
        ZoneType::parse(&label)
    }
}

impl From<ZoneType> for String {
    fn from(zone: ZoneType) -> Self {
        zone.as_str().to_string()
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a workout time series
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSample {
    /// Seconds from workout start
    pub time: f64,

    /// Zone-relative intensity multiplier (or watts when no profile applies)
    pub value: f64,

    /// Zone the intensity is relative to
    pub zone_type: ZoneType,
}

/// Time-series workout profile stored as parallel arrays
///
/// This is the wire shape of the `indoor`/`outdoor` entries in raw telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutData {
    /// Sample timestamps in seconds, non-decreasing from 0
    #[serde(default, deserialize_with = "nullable_numbers")]
    pub time: Vec<f64>,

    /// Zone-relative intensity per sample
    #[serde(default, deserialize_with = "nullable_numbers")]
    pub value: Vec<f64>,

    /// Zone label per sample
    #[serde(default, rename = "type", deserialize_with = "nullable_zones")]
    pub zone_type: Vec<ZoneType>,
}

/// Recorded traces carry `null` for dropped samples; keep the slot as NaN
fn nullable_numbers<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn nullable_zones<'de, D>(deserializer: D) -> Result<Vec<ZoneType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<String>> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|label| ZoneType::from(label.unwrap_or_default()))
        .collect())
}

impl WorkoutData {
    /// Build parallel arrays from a list of samples
    pub fn from_samples(samples: impl IntoIterator<Item = WorkoutSample>) -> Self {
        let mut data = WorkoutData::default();
        for sample in samples {
            data.time.push(sample.time);
            data.value.push(sample.value);
            data.zone_type.push(sample.zone_type);
        }
        data
    }

    /// Number of usable samples (a sample needs both a time and a value)
    pub fn len(&self) -> usize {
        self.time.len().min(self.value.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Workout duration in seconds: the last sample's time, or 0 when empty
    pub fn duration(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.time[self.len() - 1]
    }

    /// Iterate samples in time order. A missing zone label reads as an
    /// unrecognized zone.
    pub fn samples(&self) -> impl Iterator<Item = WorkoutSample> + '_ {
        (0..self.len()).map(move |i| WorkoutSample {
            time: self.time[i],
            value: self.value[i],
            zone_type: self
                .zone_type
                .get(i)
                .cloned()
                .unwrap_or_else(|| ZoneType::Other(String::new())),
        })
    }

    /// True when every intensity value is zero. Vacuously true for an empty trace.
    pub fn all_values_zero(&self) -> bool {
        self.value.iter().all(|v| *v == 0.0)
    }

    /// Check the structural invariants: equal-length arrays, finite and
    /// non-decreasing time
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.time.len() != self.value.len() || self.time.len() != self.zone_type.len() {
            return Err(CalculationError::MalformedWorkout {
                reason: format!(
                    "array lengths differ: time={}, value={}, type={}",
                    self.time.len(),
                    self.value.len(),
                    self.zone_type.len()
                ),
            });
        }

        if let Some(index) = self.time.iter().position(|t| !t.is_finite()) {
            return Err(CalculationError::MalformedWorkout {
                reason: format!("non-finite time at sample {}: {}", index, self.time[index]),
            });
        }

        if let Some(index) = self.time.windows(2).position(|pair| pair[1] < pair[0]) {
            return Err(CalculationError::MalformedWorkout {
                reason: format!(
                    "time decreases at sample {}: {} -> {}",
                    index + 1,
                    self.time[index],
                    self.time[index + 1]
                ),
            });
        }

        Ok(())
    }
}

/// Four-zone rider power profile in watts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderPowerProfile {
    /// Neuromuscular power
    pub nm: f64,
    /// Anaerobic capacity power
    pub ac: f64,
    /// Maximum aerobic power
    pub map: f64,
    /// Functional threshold power
    pub ftp: f64,
}

impl RiderPowerProfile {
    pub fn new(nm: f64, ac: f64, map: f64, ftp: f64) -> Self {
        Self { nm, ac, map, ftp }
    }

    /// Watts for a zone. Unrecognized zones resolve to FTP.
    pub fn zone_power(&self, zone: &ZoneType) -> f64 {
        match zone {
            ZoneType::Nm => self.nm,
            ZoneType::Ac => self.ac,
            ZoneType::Map => self.map,
            ZoneType::Ftp | ZoneType::Other(_) => self.ftp,
        }
    }

    /// Advisory check of `NM >= AC >= MAP >= FTP` and positive values.
    ///
    /// Returns a human-readable warning per violation; an empty list means the
    /// profile is consistent.
    pub fn ordering_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let zones = [
            ("NM", self.nm),
            ("AC", self.ac),
            ("MAP", self.map),
            ("FTP", self.ftp),
        ];
        for (label, watts) in zones {
            if !(watts.is_finite() && watts > 0.0) {
                warnings.push(format!("{} should be a positive power value, got {}", label, watts));
            }
        }

        for ((upper, upper_watts), (lower, lower_watts)) in [
            (("NM", self.nm), ("AC", self.ac)),
            (("AC", self.ac), ("MAP", self.map)),
            (("MAP", self.map), ("FTP", self.ftp)),
        ] {
            if upper_watts < lower_watts {
                warnings.push(format!(
                    "{} ({}W) is lower than {} ({}W)",
                    upper, upper_watts, lower, lower_watts
                ));
            }
        }

        warnings
    }
}

/// Derived training metrics for one workout
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutMetrics {
    /// Seconds, equal to the last sample's time
    pub duration: f64,

    /// Normalized Power in watts
    pub normalized_power: f64,

    /// NP relative to FTP
    pub intensity_factor: f64,

    /// Training Stress Score points
    pub training_stress_score: f64,
}

/// Totals over the workouts of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCombinedMetrics {
    /// Sum of workout durations in seconds
    pub total_duration: f64,

    /// Total duration plus the rest blocks between consecutive workouts
    pub total_elapsed_duration: f64,

    /// Sum of workout TSS
    #[serde(rename = "totalTSS")]
    pub total_tss: f64,

    /// Duration-weighted mean IF
    #[serde(rename = "averageIF")]
    pub average_if: f64,

    /// Duration-weighted mean NP (a mean, not a sum)
    #[serde(rename = "totalNP")]
    pub total_np: f64,
}

/// Scenario totals scaled to the rider's target intensity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetProjection {
    /// Resolved target intensity percentage the projection uses
    pub target_intensity_percent: f64,

    /// Unrounded projected IF
    #[serde(rename = "targetIF")]
    pub target_if: f64,

    /// Unrounded projected NP
    #[serde(rename = "targetNP")]
    pub target_np: f64,

    /// Ride time in hours (rest excluded)
    pub duration_hours: f64,

    /// Projected TSS, rounded to a whole number
    #[serde(rename = "totalTargetTSS")]
    pub total_target_tss: f64,

    /// Projected IF, rounded to two decimals
    #[serde(rename = "averageTargetIF")]
    pub average_target_if: f64,

    /// Projected NP, rounded to whole watts
    #[serde(rename = "totalTargetNP")]
    pub total_target_np: f64,
}

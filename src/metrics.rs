use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::models::{RiderPowerProfile, WorkoutData, WorkoutMetrics, ZoneType};

/// Rolling window for Normalized Power, in seconds
pub const NP_WINDOW_SECONDS: usize = 30;

/// Upper bound on the resampled grid (one week of riding)
const MAX_RESAMPLED_SECONDS: usize = 7 * 24 * 3600;

pub(crate) const SECONDS_PER_HOUR: f64 = 3600.0;

/// Trailing mean over the last `window_size` values
#[derive(Debug)]
struct RollingAverage {
    buffer: VecDeque<f64>,
    window_size: usize,
}

impl RollingAverage {
    fn new(window_size: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Add a value and return the mean of the current window.
    ///
    /// The window is summed afresh each time so a non-finite value only poisons
    /// the windows it is actually part of.
    fn add(&mut self, value: f64) -> f64 {
        self.buffer.push_back(value);
        if self.buffer.len() > self.window_size {
            self.buffer.pop_front();
        }
        self.buffer.iter().sum::<f64>() / self.buffer.len() as f64
    }
}

/// NP / IF / TSS calculation engine
///
/// All functions are pure: results depend only on the workout and profile
/// passed in, so callers may invoke them concurrently.
pub struct MetricsEngine;

impl MetricsEngine {
    /// Convert a zone-relative intensity to watts.
    ///
    /// With a profile the intensity multiplies that zone's power (unrecognized
    /// zones use FTP). Without one the intensity is assumed to be watts already.
    pub fn get_power_value(
        zone: &ZoneType,
        intensity: f64,
        profile: Option<&RiderPowerProfile>,
    ) -> f64 {
        match profile {
            Some(profile) => intensity * profile.zone_power(zone),
            None => intensity,
        }
    }

    /// Calculate Normalized Power with a 30-second rolling average.
    ///
    /// The watts series is resampled onto a 1-second grid by holding each
    /// sample until the next one, so every sample is weighted by the time it
    /// covers. Each grid second gets the trailing 30-second mean; NP is the
    /// fourth root of the mean fourth power of those values. Non-finite
    /// intermediates contribute 0.
    pub fn compute_normalized_power(
        workout: &WorkoutData,
        profile: Option<&RiderPowerProfile>,
    ) -> f64 {
        if workout.is_empty() {
            return 0.0;
        }

        let grid = Self::resample_watts(workout, profile);
        if grid.is_empty() {
            return 0.0;
        }

        let mut rolling = RollingAverage::new(NP_WINDOW_SECONDS);
        let sum_fourth_powers: f64 = grid
            .iter()
            .map(|&watts| {
                let fourth = rolling.add(watts).powi(4);
                if fourth.is_finite() {
                    fourth
                } else {
                    0.0
                }
            })
            .sum();

        let avg_fourth_power = sum_fourth_powers / grid.len() as f64;

        // Fourth root (sqrt of sqrt)
        let normalized_power = avg_fourth_power.sqrt().sqrt();
        if normalized_power.is_finite() {
            normalized_power
        } else {
            0.0
        }
    }

    /// Watts per second of workout time, held from each sample to the next
    fn resample_watts(workout: &WorkoutData, profile: Option<&RiderPowerProfile>) -> Vec<f64> {
        let points: Vec<(f64, f64)> = workout
            .samples()
            .filter(|sample| sample.time.is_finite())
            .map(|sample| {
                let watts = Self::get_power_value(&sample.zone_type, sample.value, profile);
                (sample.time, watts)
            })
            .collect();

        let Some(&(last_time, _)) = points.last() else {
            return Vec::new();
        };

        let seconds = if last_time > 0.0 {
            (last_time.ceil() as usize).min(MAX_RESAMPLED_SECONDS)
        } else {
            0
        }
        .max(1);

        let mut grid = Vec::with_capacity(seconds);
        let mut current = 0;
        for second in 0..seconds {
            let t = second as f64;
            while current + 1 < points.len() && points[current + 1].0 <= t {
                current += 1;
            }
            grid.push(points[current].1);
        }

        grid
    }

    /// IF = NP / FTP, or 0 without a usable FTP
    pub fn compute_intensity_factor(
        normalized_power: f64,
        profile: Option<&RiderPowerProfile>,
    ) -> f64 {
        match profile {
            Some(profile) if profile.ftp != 0.0 && !profile.ftp.is_nan() => {
                normalized_power / profile.ftp
            }
            _ => 0.0,
        }
    }

    /// TSS = IF² × 100 × duration_hours
    pub fn compute_training_stress_score(intensity_factor: f64, duration_seconds: f64) -> f64 {
        intensity_factor.powi(2) * 100.0 * (duration_seconds / SECONDS_PER_HOUR)
    }

    /// Calculate duration, NP, IF and TSS for one workout.
    ///
    /// Without a profile IF and TSS are 0; NP is still computed from the raw
    /// values, which are then taken as watts.
    pub fn compute_all_metrics(
        workout: &WorkoutData,
        profile: Option<&RiderPowerProfile>,
    ) -> WorkoutMetrics {
        let duration = workout.duration();
        let normalized_power = Self::compute_normalized_power(workout, profile);

        let (intensity_factor, training_stress_score) = match profile {
            Some(_) => {
                let intensity_factor = Self::compute_intensity_factor(normalized_power, profile);
                let tss = Self::compute_training_stress_score(intensity_factor, duration);
                (intensity_factor, tss)
            }
            None => (0.0, 0.0),
        };

        debug!(
            samples = workout.len(),
            duration,
            normalized_power,
            intensity_factor,
            training_stress_score,
            "Computed workout metrics"
        );

        WorkoutMetrics {
            duration,
            normalized_power,
            intensity_factor,
            training_stress_score,
        }
    }

    /// Compute metrics for possibly-missing or malformed data.
    ///
    /// Missing data and structural problems (array length mismatches, time
    /// running backwards) yield `None` with a logged warning instead of an
    /// error, so one bad workout never sinks a whole scenario.
    pub fn try_compute_metrics(
        workout_id: &str,
        workout: Option<&WorkoutData>,
        profile: Option<&RiderPowerProfile>,
    ) -> Option<WorkoutMetrics> {
        let Some(workout) = workout else {
            warn!(workout_id, "Workout data not available, skipping metrics");
            return None;
        };

        if let Err(e) = workout.validate() {
            warn!(workout_id, error = %e, "Failed to calculate workout metrics");
            return None;
        }

        Some(Self::compute_all_metrics(workout, profile))
    }
}

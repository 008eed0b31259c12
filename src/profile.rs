//! Rider profile normalization and target intensity resolution
//!
//! Profiles are stored in one of two historical shapes: a flat record carrying
//! the zone powers and `targetIntensity` directly, or an older record that
//! nests them under `powerProfile`. Both are parsed once into
//! [`StoredProfile`] and then resolved into an [`EffectiveProfile`], so the
//! rest of the crate only sees validated values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::CalculationError;
use crate::models::RiderPowerProfile;

/// Target intensity used when none is stored or the stored value is unusable
pub const DEFAULT_TARGET_INTENSITY: f64 = 70.0;

/// Lowest target intensity the profile setup accepts
pub const MIN_TARGET_INTENSITY: f64 = 30.0;

/// Highest target intensity the profile setup accepts
pub const MAX_TARGET_INTENSITY: f64 = 100.0;

/// Power profile used when no rider profile has been set up
pub const DEFAULT_POWER_PROFILE: RiderPowerProfile = RiderPowerProfile {
    nm: 1000.0,
    ac: 450.0,
    map: 330.0,
    ftp: 250.0,
};

/// Zone powers and target intensity as they appear in a stored record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_intensity: Option<f64>,
}

/// Older record shape with the power profile nested one level down
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedProfile {
    pub power_profile: PowerFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_intensity: Option<f64>,
}

/// A rider profile in either stored shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredProfile {
    /// `{ powerProfile: { nm, ac, map, ftp, targetIntensity? }, targetIntensity? }`
    Nested(NestedProfile),
    /// `{ nm, ac, map, ftp, targetIntensity? }`
    Flat(PowerFields),
}

impl Default for StoredProfile {
    fn default() -> Self {
        StoredProfile::Flat(PowerFields::default())
    }
}

impl StoredProfile {
    /// Parse a loosely-typed profile record. Anything that is not an object in
    /// one of the two shapes yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Build a flat profile from zone powers and an optional target intensity
    pub fn flat(power: RiderPowerProfile, target_intensity: Option<f64>) -> Self {
        StoredProfile::Flat(PowerFields {
            nm: Some(power.nm),
            ac: Some(power.ac),
            map: Some(power.map),
            ftp: Some(power.ftp),
            target_intensity,
        })
    }

    pub fn power_fields(&self) -> &PowerFields {
        match self {
            StoredProfile::Nested(nested) => &nested.power_profile,
            StoredProfile::Flat(fields) => fields,
        }
    }

    pub fn power_fields_mut(&mut self) -> &mut PowerFields {
        match self {
            StoredProfile::Nested(nested) => &mut nested.power_profile,
            StoredProfile::Flat(fields) => fields,
        }
    }

    /// `targetIntensity` on the record itself
    pub fn direct_target_intensity(&self) -> Option<f64> {
        match self {
            StoredProfile::Nested(nested) => nested.target_intensity,
            StoredProfile::Flat(fields) => fields.target_intensity,
        }
    }

    /// `powerProfile.targetIntensity`, only present in the nested shape
    pub fn nested_target_intensity(&self) -> Option<f64> {
        match self {
            StoredProfile::Nested(nested) => nested.power_profile.target_intensity,
            StoredProfile::Flat(_) => None,
        }
    }

    /// Set the target intensity where it takes precedence (the direct field)
    pub fn set_target_intensity(&mut self, percent: Option<f64>) {
        match self {
            StoredProfile::Nested(nested) => nested.target_intensity = percent,
            StoredProfile::Flat(fields) => fields.target_intensity = percent,
        }
    }

    /// Rewrite into the flat shape, keeping the resolved target intensity
    pub fn normalized(&self) -> Self {
        let mut fields = self.power_fields().clone();
        fields.target_intensity = valid_percent(self.direct_target_intensity())
            .or_else(|| valid_percent(self.nested_target_intensity()));
        StoredProfile::Flat(fields)
    }
}

fn valid_percent(percent: Option<f64>) -> Option<f64> {
    percent.filter(|p| p.is_finite() && *p > 0.0)
}

fn valid_power(watts: Option<f64>) -> Option<f64> {
    watts.filter(|w| w.is_finite() && *w > 0.0)
}

/// Target intensity percentage for a profile.
///
/// The direct `targetIntensity` wins when it is finite and positive, then the
/// nested `powerProfile.targetIntensity` under the same rule, then
/// [`DEFAULT_TARGET_INTENSITY`]. Zero means "unset", never 0%.
pub fn resolve_percent(profile: Option<&StoredProfile>) -> f64 {
    profile
        .and_then(|p| {
            valid_percent(p.direct_target_intensity())
                .or_else(|| valid_percent(p.nested_target_intensity()))
        })
        .unwrap_or(DEFAULT_TARGET_INTENSITY)
}

/// Target intensity as a multiplier, e.g. `0.7`
pub fn resolve_factor(profile: Option<&StoredProfile>) -> f64 {
    resolve_percent(profile) / 100.0
}

/// Target intensity for display, e.g. `"70%"`
pub fn format_percent(profile: Option<&StoredProfile>) -> String {
    format!("{}%", resolve_percent(profile))
}

/// Check a target intensity entered during profile setup
pub fn validate_target_intensity(percent: f64) -> Result<f64, CalculationError> {
    if percent.is_finite() && (MIN_TARGET_INTENSITY..=MAX_TARGET_INTENSITY).contains(&percent) {
        Ok(percent)
    } else {
        Err(CalculationError::InvalidParameter {
            calculation: "target intensity".to_string(),
            parameter: "targetIntensity".to_string(),
            value: percent.to_string(),
        })
    }
}

/// Fully-resolved profile handed to the calculation core
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveProfile {
    pub power: RiderPowerProfile,
    pub target_intensity: f64,
}

impl EffectiveProfile {
    pub fn target_factor(&self) -> f64 {
        self.target_intensity / 100.0
    }
}

impl Default for EffectiveProfile {
    fn default() -> Self {
        Self {
            power: DEFAULT_POWER_PROFILE,
            target_intensity: DEFAULT_TARGET_INTENSITY,
        }
    }
}

/// Resolve the profile the calculations run against.
///
/// With no stored profile the defaults apply. Zone powers that are missing or
/// not positive fall back individually to [`DEFAULT_POWER_PROFILE`].
/// Ordering violations (`NM >= AC >= MAP >= FTP`) are logged, not rejected.
pub fn resolve_effective_profile(stored: Option<&StoredProfile>) -> EffectiveProfile {
    let Some(stored) = stored else {
        return EffectiveProfile::default();
    };

    let fields = stored.power_fields();
    let mut defaulted = Vec::new();
    let mut pick = |label: &'static str, value: Option<f64>, default: f64| {
        valid_power(value).unwrap_or_else(|| {
            defaulted.push(label);
            default
        })
    };

    let power = RiderPowerProfile {
        nm: pick("NM", fields.nm, DEFAULT_POWER_PROFILE.nm),
        ac: pick("AC", fields.ac, DEFAULT_POWER_PROFILE.ac),
        map: pick("MAP", fields.map, DEFAULT_POWER_PROFILE.map),
        ftp: pick("FTP", fields.ftp, DEFAULT_POWER_PROFILE.ftp),
    };

    if !defaulted.is_empty() {
        warn!(zones = ?defaulted, "Profile is missing zone powers, using defaults");
    }
    for warning in power.ordering_warnings() {
        warn!("Power profile: {}", warning);
    }

    EffectiveProfile {
        power,
        target_intensity: resolve_percent(Some(stored)),
    }
}

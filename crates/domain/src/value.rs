//! Setting values — a numeric value bound to one setting and its domain.

use serde::Serialize;

use crate::setting::{SettingCategory, SettingKind, SettingSpec};

/// The current value of one setting.
///
/// Stored as a step index into the setting's domain, so the value is always
/// on the grid and always inside `[min, max]`. There is no way to build an
/// out-of-range value: every constructor clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SettingValue {
    setting: SettingKind,
    position: i32,
}

impl SettingValue {
    /// Value nearest to `value`, rounded to the setting's step and clamped.
    #[must_use]
    pub fn new(setting: SettingKind, value: f64) -> Self {
        Self {
            setting,
            position: setting.spec().position_for(value),
        }
    }

    /// Value for a raw knob position: `min + raw * step`, clamped.
    #[must_use]
    pub fn from_raw(setting: SettingKind, raw: i32) -> Self {
        Self {
            setting,
            position: setting.spec().clamp_position(raw),
        }
    }

    /// The setting's starting value.
    #[must_use]
    pub fn initial(setting: SettingKind) -> Self {
        Self::new(setting, setting.default_value())
    }

    #[must_use]
    pub fn setting(&self) -> SettingKind {
        self.setting
    }

    #[must_use]
    pub fn spec(&self) -> SettingSpec {
        self.setting.spec()
    }

    /// Step index of the value, in motor position units.
    #[must_use]
    pub fn position(&self) -> i32 {
        self.position
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.spec().value_at(self.position)
    }

    /// Whether `other` differs from `self` by more than the setting's epsilon.
    #[must_use]
    pub fn differs_from(&self, other: &Self) -> bool {
        self.setting != other.setting || (self.value() - other.value()).abs() > self.spec().epsilon()
    }

    /// Display label, e.g. `20.5°C` or `Speed 2`.
    #[must_use]
    pub fn label(&self) -> String {
        self.setting.label(self.value())
    }

    /// JSON number for state payloads: integers for discrete settings,
    /// floats for continuous ones.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self.spec().category {
            SettingCategory::Discrete => serde_json::Value::from(i64::from(self.position)),
            SettingCategory::Continuous => serde_json::Value::from(self.value()),
        }
    }
}

//! Settings — the cyclable sub-modes an app exposes on the knob.
//!
//! Each [`SettingKind`] has exactly one canonical [`SettingSpec`]: its value
//! domain, its resolution and the haptic category it belongs to. Apps never
//! carry their own copy of these numbers, so two apps exposing the same kind
//! of setting always feel the same under the finger.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Endstop strength applied to every profile.
pub const ENDSTOP_STRENGTH: f32 = 1.0;

/// Haptic category of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingCategory {
    /// A quantity discretised at a fixed resolution (temperature, brightness).
    Continuous,
    /// A small set of choices, one detent per choice (fan speed, on/off).
    Discrete,
}

impl SettingCategory {
    /// Torque of each detent, from 0 (none) to 1.
    #[must_use]
    pub const fn detent_strength(self) -> f32 {
        match self {
            Self::Continuous => 0.6,
            Self::Discrete => 0.8,
        }
    }

    /// Fraction of a step width at which a detent snaps over.
    #[must_use]
    pub const fn snap_point(self) -> f32 {
        match self {
            Self::Continuous => 0.55,
            Self::Discrete => 0.6,
        }
    }
}

/// Value domain and feel of one setting kind.
///
/// Values live on the grid `min + position * step` for
/// `position` in `0..=max_position()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub category: SettingCategory,
    /// Angular width of one detent, in degrees.
    pub step_angle_degrees: f32,
}

impl SettingSpec {
    /// Highest step index of the domain.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn max_position(&self) -> i32 {
        ((self.max - self.min) / self.step).round() as i32
    }

    /// Clamp a raw step index into `0..=max_position()`.
    #[must_use]
    pub fn clamp_position(&self, raw: i32) -> i32 {
        raw.clamp(0, self.max_position())
    }

    /// Value at a step index. The index is clamped first.
    #[must_use]
    pub fn value_at(&self, position: i32) -> f64 {
        self.min + f64::from(self.clamp_position(position)) * self.step
    }

    /// Step index nearest to `value`, clamped to the domain.
    ///
    /// Halfway values round away from zero. `NaN` maps to the minimum.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn position_for(&self, value: f64) -> i32 {
        if value.is_nan() {
            return 0;
        }
        let steps = ((value - self.min) / self.step).round();
        // `as` saturates, so infinities land on the endstops after clamping.
        self.clamp_position(steps as i32)
    }

    /// Smallest difference between two values that counts as a change.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        match self.category {
            SettingCategory::Continuous => self.step * 0.2,
            SettingCategory::Discrete => 0.0,
        }
    }
}

/// Every setting kind any app can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Temperature,
    SeatHeat,
    FanSpeed,
    Position,
    Brightness,
    ColorTemperature,
    Power,
}

impl SettingKind {
    /// The canonical domain and feel of this setting.
    #[must_use]
    pub const fn spec(self) -> SettingSpec {
        match self {
            Self::Temperature => SettingSpec {
                min: 16.0,
                max: 25.0,
                step: 0.5,
                category: SettingCategory::Continuous,
                step_angle_degrees: 9.0,
            },
            Self::SeatHeat => SettingSpec {
                min: 0.0,
                max: 3.0,
                step: 1.0,
                category: SettingCategory::Discrete,
                step_angle_degrees: 45.0,
            },
            Self::FanSpeed => SettingSpec {
                min: 0.0,
                max: 2.0,
                step: 1.0,
                category: SettingCategory::Discrete,
                step_angle_degrees: 45.0,
            },
            Self::Position | Self::Brightness => SettingSpec {
                min: 0.0,
                max: 100.0,
                step: 5.0,
                category: SettingCategory::Continuous,
                step_angle_degrees: 9.0,
            },
            Self::ColorTemperature => SettingSpec {
                min: 2700.0,
                max: 6500.0,
                step: 100.0,
                category: SettingCategory::Continuous,
                step_angle_degrees: 6.0,
            },
            Self::Power => SettingSpec {
                min: 0.0,
                max: 1.0,
                step: 1.0,
                category: SettingCategory::Discrete,
                step_angle_degrees: 60.0,
            },
        }
    }

    /// Key used for this setting in serialized state payloads.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::SeatHeat => "seat_heat",
            Self::FanSpeed => "fan_speed",
            Self::Position => "position",
            Self::Brightness => "brightness",
            Self::ColorTemperature => "color_temp",
            Self::Power => "on",
        }
    }

    /// Value a freshly created app starts with.
    #[must_use]
    pub const fn default_value(self) -> f64 {
        match self {
            Self::Temperature => 20.0,
            Self::FanSpeed => 2.0,
            Self::ColorTemperature => 4000.0,
            Self::SeatHeat | Self::Position | Self::Brightness | Self::Power => 0.0,
        }
    }

    /// Human-readable label for a value of this setting.
    #[must_use]
    pub fn label(self, value: f64) -> String {
        match self {
            Self::Temperature => format!("{value:.1}\u{b0}C"),
            Self::SeatHeat => format!("Level {value:.0}"),
            Self::FanSpeed => format!("Speed {value:.0}"),
            Self::Position | Self::Brightness => format!("{value:.0}%"),
            Self::ColorTemperature => format!("{value:.0}K"),
            Self::Power if value > 0.0 => "On".to_string(),
            Self::Power => "Off".to_string(),
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

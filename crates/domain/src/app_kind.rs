//! App kinds — the closed set of mini-applications the knob can host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::setting::SettingKind;

/// Kind of app, identified in configuration by its slug.
///
/// New kinds are added here, together with their setting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    Climate,
    Blinds,
    LightDimmer,
    LightSwitch,
}

impl AppKind {
    pub const ALL: [Self; 4] = [
        Self::Climate,
        Self::Blinds,
        Self::LightDimmer,
        Self::LightSwitch,
    ];

    /// Configuration slug, e.g. `light_dimmer`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Climate => "climate",
            Self::Blinds => "blinds",
            Self::LightDimmer => "light_dimmer",
            Self::LightSwitch => "light_switch",
        }
    }

    /// Settings in navigation order. Never empty.
    #[must_use]
    pub const fn settings(self) -> &'static [SettingKind] {
        match self {
            Self::Climate => &[
                SettingKind::Temperature,
                SettingKind::SeatHeat,
                SettingKind::FanSpeed,
            ],
            Self::Blinds => &[SettingKind::Position],
            Self::LightDimmer => &[SettingKind::Brightness, SettingKind::ColorTemperature],
            Self::LightSwitch => &[SettingKind::Power],
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AppKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| ConfigError::UnknownAppKind(s.to_string()))
    }
}

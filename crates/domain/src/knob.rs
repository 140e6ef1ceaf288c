//! Knob state — what the knob hardware reports.

use serde::{Deserialize, Serialize};

use crate::id::AppId;
use crate::profile::MotorProfile;
use crate::setting::SettingKind;

/// A position report from the knob.
///
/// `current_position` is tracked by the hardware in motor steps of the
/// profile it was running; reset semantics belong to the hardware.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnobState {
    pub current_position: i32,
    /// Fractional offset from `current_position`, in steps.
    #[serde(default)]
    pub sub_position_unit: f32,
    /// Id of the profile the knob was running when it took the reading.
    ///
    /// Reports tagged with another app's id are stale and get ignored.
    #[serde(default)]
    pub config_id: Option<AppId>,
    /// Setting of the profile the knob was running.
    ///
    /// Steps of one setting mean nothing to another, so reports tagged with
    /// a different setting are stale too.
    #[serde(default)]
    pub setting: Option<SettingKind>,
}

impl KnobState {
    /// An untagged report at `position`.
    #[must_use]
    pub fn at(position: i32) -> Self {
        Self {
            current_position: position,
            ..Self::default()
        }
    }

    /// Tag the report with the profile it was measured under.
    #[must_use]
    pub fn for_profile(mut self, profile: &MotorProfile) -> Self {
        self.config_id = Some(profile.id.clone());
        self.setting = profile.setting;
        self
    }

    /// Whether this report may be applied to `setting` of the app `id`.
    #[must_use]
    pub fn applies_to(&self, id: &AppId, setting: SettingKind) -> bool {
        self.config_id.as_ref().is_none_or(|config| config == id)
            && self.setting.is_none_or(|measured| measured == setting)
    }
}

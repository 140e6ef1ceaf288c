//! Motor profile — the haptic configuration pushed to the knob's motor.
//!
//! Profiles are never edited in place. [`derive_profile`] builds a fresh
//! value from a setting value, an owner id and a nonce; apps keep only the
//! profile of their active setting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::AppId;
use crate::setting::{ENDSTOP_STRENGTH, SettingKind};
use crate::value::SettingValue;

/// Sequence number of a profile push.
///
/// Nonces wrap on overflow. Ordering uses serial-number arithmetic, so a
/// nonce that just wrapped past `u32::MAX` is still newer than the one
/// before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(u32);

impl Nonce {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The nonce that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Whether `self` was issued after `other`.
    #[must_use]
    pub const fn is_newer_than(self, other: Self) -> bool {
        let diff = self.0.wrapping_sub(other.0);
        diff != 0 && diff < (1 << 31)
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Haptic configuration for the active setting of one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorProfile {
    /// App that derived the profile.
    pub id: AppId,
    /// Setting the profile was derived for; `None` on the neutral profile.
    #[serde(default)]
    pub setting: Option<SettingKind>,
    /// Current value, in motor steps.
    pub position: i32,
    pub min_position: i32,
    pub max_position: i32,
    /// Angular width of one step, in radians.
    pub step_angle: f32,
    pub detent_strength: f32,
    pub endstop_strength: f32,
    /// Fraction of a step width at which a detent snaps.
    pub snap_point: f32,
    pub snap_point_bias: f32,
    pub nonce: Nonce,
}

impl MotorProfile {
    /// A valid profile with no detents, used when no app is active.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            id: AppId::default(),
            setting: None,
            position: 0,
            min_position: 0,
            max_position: 0,
            step_angle: 10f32.to_radians(),
            detent_strength: 0.0,
            endstop_strength: ENDSTOP_STRENGTH,
            snap_point: 0.5,
            snap_point_bias: 0.0,
            nonce: Nonce::ZERO,
        }
    }

    /// Whether `self` should replace `current` on the motor.
    ///
    /// A profile from another app always replaces; one from the same app
    /// replaces only if its nonce is newer.
    #[must_use]
    pub fn supersedes(&self, current: &Self) -> bool {
        self.id != current.id || self.nonce.is_newer_than(current.nonce)
    }
}

impl Default for MotorProfile {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Build the profile for `value` owned by `id`.
///
/// Pure: the same inputs always give the same profile. Callers hand in a
/// nonce one past the last one they issued so that re-deriving an identical
/// profile is still distinguishable from a stale one.
#[must_use]
pub fn derive_profile(id: &AppId, value: &SettingValue, nonce: Nonce) -> MotorProfile {
    let spec = value.spec();
    MotorProfile {
        id: id.clone(),
        setting: Some(value.setting()),
        position: value.position(),
        min_position: 0,
        max_position: spec.max_position(),
        step_angle: spec.step_angle_degrees.to_radians(),
        detent_strength: spec.category.detent_strength(),
        endstop_strength: ENDSTOP_STRENGTH,
        snap_point: spec.category.snap_point(),
        snap_point_bias: 0.0,
        nonce,
    }
}

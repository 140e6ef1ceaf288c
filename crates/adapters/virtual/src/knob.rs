//! Virtual knob — a turnable knob running one motor profile at a time.

use std::sync::{Mutex, MutexGuard, PoisonError};

use knobhub_domain::knob::KnobState;
use knobhub_domain::profile::MotorProfile;

/// A simulated knob.
///
/// Starts on the neutral profile. Adopting a profile moves the knob to the
/// profile's position; turning it moves in whole steps and stops at the
/// profile's endstops.
#[derive(Debug, Default)]
pub struct VirtualKnob {
    profile: Mutex<MotorProfile>,
}

impl VirtualKnob {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt `profile` unless it is stale for the running one.
    ///
    /// Returns whether the profile was adopted.
    pub fn apply_profile(&self, profile: &MotorProfile) -> bool {
        let mut current = self.lock();
        if !profile.supersedes(&current) {
            tracing::debug!(
                app_id = %profile.id,
                nonce = %profile.nonce,
                "virtual knob ignoring stale profile"
            );
            return false;
        }
        *current = profile.clone();
        true
    }

    /// Turn by `steps` (positive is clockwise) and report where the knob
    /// ended up.
    pub fn rotate(&self, steps: i32) -> KnobState {
        let mut profile = self.lock();
        profile.position = profile
            .position
            .saturating_add(steps)
            .clamp(profile.min_position, profile.max_position.max(profile.min_position));
        Self::report(&profile)
    }

    /// Report the current position without turning.
    #[must_use]
    pub fn state(&self) -> KnobState {
        Self::report(&self.lock())
    }

    /// The profile the knob is running.
    #[must_use]
    pub fn profile(&self) -> MotorProfile {
        self.lock().clone()
    }

    fn report(profile: &MotorProfile) -> KnobState {
        KnobState::at(profile.position).for_profile(profile)
    }

    fn lock(&self) -> MutexGuard<'_, MotorProfile> {
        self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

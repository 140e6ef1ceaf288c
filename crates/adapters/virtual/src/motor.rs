//! Recording motor — a [`MotorNotifier`] that keeps every push.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use knobhub_app::ports::MotorNotifier;
use knobhub_domain::profile::MotorProfile;

use crate::knob::VirtualKnob;

/// Records pushed profiles in arrival order.
///
/// When attached to a [`VirtualKnob`], each push is also handed to the
/// knob, which applies its own staleness check.
#[derive(Debug, Default)]
pub struct RecordingMotor {
    pushes: Mutex<Vec<MotorProfile>>,
    knob: Option<Arc<VirtualKnob>>,
}

impl RecordingMotor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A motor driving `knob`.
    #[must_use]
    pub fn driving(knob: Arc<VirtualKnob>) -> Self {
        Self {
            pushes: Mutex::new(Vec::new()),
            knob: Some(knob),
        }
    }

    /// Every profile pushed so far.
    #[must_use]
    pub fn pushes(&self) -> Vec<MotorProfile> {
        self.lock().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<MotorProfile> {
        self.lock().last().cloned()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Number of pushes derived by the app `id`.
    #[must_use]
    pub fn count_for(&self, id: &str) -> usize {
        self.lock().iter().filter(|p| p.id.as_str() == id).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MotorProfile>> {
        self.pushes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MotorNotifier for RecordingMotor {
    fn request_update(&self, profile: MotorProfile) {
        if let Some(knob) = &self.knob {
            knob.apply_profile(&profile);
        }
        self.lock().push(profile);
    }
}

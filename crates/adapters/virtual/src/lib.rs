//! # knobhub-adapter-virtual
//!
//! Virtual knob hardware for testing and demonstration without a device.
//!
//! ## Provided parts
//!
//! | Part | Role | Behaviour |
//! |------|------|-----------|
//! | [`VirtualKnob`] | knob + motor firmware | Holds the running profile, turns in whole steps between its endstops, reports tagged [`KnobState`](knobhub_domain::knob::KnobState)s |
//! | [`RecordingMotor`] | `MotorNotifier` | Remembers every pushed profile in order and forwards it to an optional knob |
//!
//! ## Dependency rule
//!
//! Depends on `knobhub-app` (port traits) and `knobhub-domain` only.

mod knob;
mod motor;

pub use knob::VirtualKnob;
pub use motor::RecordingMotor;

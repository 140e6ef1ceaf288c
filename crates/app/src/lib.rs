//! # knobhub-app
//!
//! Application layer — the app runtime, the registry/switcher and the
//! **port definitions** (traits) adapters implement.
//!
//! ## Responsibilities
//! - Define **port traits** for the outside world (driven/outbound ports):
//!   - `MotorNotifier` — hand a new motor profile to the haptic motor
//!   - `StatePublisher` — forward entity state updates to the home system
//! - Run each configured app: map knob positions onto setting values,
//!   cycle settings, derive motor profiles, keep screen data
//! - Own all apps in the `AppRegistry`, switch the active one and push
//!   profiles exactly once per change
//! - Provide **in-process infrastructure** (watch/broadcast buses) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `knobhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod app;
pub mod motor_bus;
pub mod ports;
pub mod registry;
pub mod report_bus;
pub mod screen;

//! # knobhub-domain
//!
//! Pure domain model for the knobhub smart knob.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Settings** (cyclable sub-modes) and their canonical value domains
//! - Define **Setting values** (always clamped onto the setting's step grid)
//! - Define **Setting cycles** (ordered, wrapping navigation)
//! - Define **Motor profiles** and the pure deriver that builds them
//! - Define **App kinds** (climate, blinds, dimmer, switch) and their cycles
//! - Define **Entity state updates** and **app slots** (configuration entries)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod app_kind;
pub mod cycle;
pub mod knob;
pub mod profile;
pub mod setting;
pub mod slot;
pub mod state_update;
pub mod value;

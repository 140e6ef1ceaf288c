//! App runtime — one live app: its setting cycle, values, motor profile and
//! screen, all behind the app's own lock.
//!
//! Every app kind runs through this one engine; the kind only decides which
//! settings are in the cycle. Operations never push to the motor themselves.
//! They hand the freshly derived profile back, and the
//! [`AppRegistry`](crate::registry::AppRegistry) pushes it after the app lock
//! is released, exactly once per change.

use std::sync::{Mutex, MutexGuard, PoisonError};

use knobhub_domain::app_kind::AppKind;
use knobhub_domain::cycle::SettingCycle;
use knobhub_domain::error::{ConfigError, PayloadError};
use knobhub_domain::id::{AppId, EntityId};
use knobhub_domain::knob::KnobState;
use knobhub_domain::profile::{MotorProfile, Nonce, derive_profile};
use knobhub_domain::setting::SettingKind;
use knobhub_domain::slot::AppSlot;
use knobhub_domain::state_update::EntityStateUpdate;
use knobhub_domain::value::SettingValue;

use crate::screen::{Frame, Screen};

/// Result of feeding a knob report to an app.
#[derive(Debug, Clone, PartialEq)]
pub enum KnobOutcome {
    /// The report was measured under another app's profile.
    Ignored,
    /// The report maps onto the value already stored.
    Unchanged(SettingValue),
    /// The value moved: it is stored, the profile re-derived and a report
    /// produced. The caller must push `profile`.
    Changed {
        value: SettingValue,
        update: EntityStateUpdate,
        profile: MotorProfile,
    },
}

impl KnobOutcome {
    #[must_use]
    pub fn did_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// The value stored after the report, if the report was applied.
    #[must_use]
    pub fn value(&self) -> Option<SettingValue> {
        match self {
            Self::Ignored => None,
            Self::Unchanged(value) | Self::Changed { value, .. } => Some(*value),
        }
    }
}

/// Result of cycling to the next setting. The caller must push `profile`.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    pub setting: SettingKind,
    pub profile: MotorProfile,
}

/// Result of applying an external state payload.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRestore {
    /// Whether any value moved.
    pub changed: bool,
    /// Re-derived profile, present when the active setting's value moved.
    pub profile: Option<MotorProfile>,
}

struct AppState {
    cycle: SettingCycle,
    /// One value per setting, in cycle order.
    values: Vec<SettingValue>,
    /// Profile of the active setting.
    profile: MotorProfile,
    screen: Screen,
}

impl AppState {
    fn active_value(&self) -> SettingValue {
        self.values[self.cycle.index()]
    }

    fn rederive(&mut self, id: &AppId) -> MotorProfile {
        let nonce = self.profile.nonce.next();
        self.profile = derive_profile(id, &self.active_value(), nonce);
        self.profile.clone()
    }
}

/// A live app.
pub struct App {
    id: AppId,
    entity_id: EntityId,
    kind: AppKind,
    friendly_name: String,
    position: u8,
    state: Mutex<AppState>,
}

impl App {
    /// Create a builder for an app of `kind`.
    #[must_use]
    pub fn builder(kind: AppKind) -> AppBuilder {
        AppBuilder {
            kind,
            id: None,
            entity_id: None,
            friendly_name: None,
            position: 0,
        }
    }

    /// Build an app from a configuration slot.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the slot names an unknown kind or has an
    /// empty app id.
    pub fn from_slot(slot: &AppSlot) -> Result<Self, ConfigError> {
        let kind = slot.validate()?;
        Self::builder(kind)
            .id(slot.app_id.clone())
            .entity_id(slot.entity_id.clone())
            .friendly_name(slot.friendly_name.clone())
            .position(slot.position)
            .build()
    }

    #[must_use]
    pub fn id(&self) -> &AppId {
        &self.id
    }

    #[must_use]
    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    #[must_use]
    pub fn kind(&self) -> AppKind {
        self.kind
    }

    #[must_use]
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Menu position from the configuration slot.
    #[must_use]
    pub fn position(&self) -> u8 {
        self.position
    }

    /// The active setting.
    #[must_use]
    pub fn current_setting(&self) -> SettingKind {
        self.lock().cycle.current()
    }

    /// The stored value of `setting`, if this app exposes it.
    #[must_use]
    pub fn value(&self, setting: SettingKind) -> Option<SettingValue> {
        let state = self.lock();
        state.cycle.index_of(setting).map(|index| state.values[index])
    }

    /// Map a raw knob position onto the active setting.
    ///
    /// On a change, in order: the value is stored, the profile re-derived
    /// with a fresh nonce and a state report produced. Pushing the returned
    /// profile is up to the caller.
    pub fn apply_raw_position(&self, knob: &KnobState) -> KnobOutcome {
        let mut state = self.lock();
        if !knob.applies_to(&self.id, state.cycle.current()) {
            drop(state);
            tracing::debug!(
                app_id = %self.id,
                config_id = ?knob.config_id,
                setting = ?knob.setting,
                "ignoring knob report measured under another profile"
            );
            return KnobOutcome::Ignored;
        }

        let index = state.cycle.index();
        let previous = state.values[index];
        let value = SettingValue::from_raw(previous.setting(), knob.current_position);
        if !value.differs_from(&previous) {
            return KnobOutcome::Unchanged(previous);
        }

        state.values[index] = value;
        let profile = state.rederive(&self.id);
        state.screen.update(index, &value);
        let update = self.snapshot(&state, true);
        drop(state);

        tracing::debug!(
            app_id = %self.id,
            setting = %value.setting(),
            value = value.value(),
            nonce = %profile.nonce,
            "setting value changed"
        );
        KnobOutcome::Changed {
            value,
            update,
            profile,
        }
    }

    /// Activate the next setting in the cycle and re-derive the profile.
    ///
    /// With a single setting this re-derives the same setting's profile.
    pub fn navigation_next(&self) -> Navigation {
        let mut state = self.lock();
        let setting = state.cycle.advance();
        let index = state.cycle.index();
        state.screen.show(index);
        let profile = state.rederive(&self.id);
        drop(state);

        tracing::debug!(app_id = %self.id, %setting, nonce = %profile.nonce, "setting activated");
        Navigation { setting, profile }
    }

    /// Re-derive the current profile with a fresh nonce, e.g. when the app
    /// becomes active and the motor must take on its feel again.
    pub fn reassert_profile(&self) -> MotorProfile {
        self.lock().rederive(&self.id)
    }

    /// The profile of the active setting, as last derived.
    #[must_use]
    pub fn motor_profile(&self) -> MotorProfile {
        self.lock().profile.clone()
    }

    /// Nonce of the last derived profile.
    #[must_use]
    pub fn last_nonce(&self) -> Nonce {
        self.lock().profile.nonce
    }

    /// Make sure the next profile nonce follows `last`.
    ///
    /// Used when this app replaces another under the same id, so nonces
    /// stay increasing for that id.
    pub fn resume_after(&self, last: Nonce) {
        let mut state = self.lock();
        if !state.profile.nonce.is_newer_than(last) {
            let value = state.active_value();
            state.profile = derive_profile(&self.id, &value, last.next());
        }
    }

    /// Snapshot of the current values, flagged as not changed.
    #[must_use]
    pub fn current_report(&self) -> EntityStateUpdate {
        let state = self.lock();
        self.snapshot(&state, false)
    }

    /// Snapshot of what this app shows.
    #[must_use]
    pub fn render(&self) -> Frame {
        let state = self.lock();
        Frame {
            app_id: Some(self.id.clone()),
            friendly_name: self.friendly_name.clone(),
            setting: Some(state.cycle.current()),
            value: Some(state.active_value()),
            gauge: state.screen.visible().cloned(),
            profile: state.profile.clone(),
        }
    }

    /// Apply an external state payload using the schema of
    /// [`current_report`](Self::current_report).
    ///
    /// Unknown keys are ignored; known keys are rounded and clamped. The
    /// payload is checked in full before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] if the payload is not an object or a known
    /// key does not hold a number.
    pub fn apply_entity_state(
        &self,
        payload: &serde_json::Value,
    ) -> Result<StateRestore, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        let mut incoming = Vec::new();
        for setting in self.kind.settings() {
            if let Some(field) = object.get(setting.key()) {
                let number = field.as_f64().ok_or_else(|| PayloadError::NotANumber {
                    key: setting.key().to_string(),
                })?;
                incoming.push(SettingValue::new(*setting, number));
            }
        }

        let mut state = self.lock();
        let mut changed = false;
        let mut active_changed = false;
        for value in incoming {
            let Some(index) = state.cycle.index_of(value.setting()) else {
                continue;
            };
            if !value.differs_from(&state.values[index]) {
                continue;
            }
            state.values[index] = value;
            state.screen.update(index, &value);
            changed = true;
            active_changed |= index == state.cycle.index();
        }
        let profile = active_changed.then(|| state.rederive(&self.id));
        drop(state);

        if changed {
            tracing::debug!(app_id = %self.id, "applied external state");
        }
        Ok(StateRestore { changed, profile })
    }

    fn snapshot(&self, state: &AppState, changed: bool) -> EntityStateUpdate {
        EntityStateUpdate::from_values(
            self.id.clone(),
            self.entity_id.clone(),
            self.kind,
            &state.values,
            state.cycle.index(),
            changed,
        )
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("friendly_name", &self.friendly_name)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Step-by-step builder for [`App`].
#[derive(Debug)]
pub struct AppBuilder {
    kind: AppKind,
    id: Option<AppId>,
    entity_id: Option<EntityId>,
    friendly_name: Option<String>,
    position: u8,
}

impl AppBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<AppId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<EntityId>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    #[must_use]
    pub fn position(mut self, position: u8) -> Self {
        self.position = position;
        self
    }

    /// Consume the builder and start the app on its first setting.
    ///
    /// The friendly name falls back to the app id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyAppId`] if `id` is missing or empty.
    pub fn build(self) -> Result<App, ConfigError> {
        let id = self.id.unwrap_or_default();
        if id.is_empty() {
            return Err(ConfigError::EmptyAppId);
        }
        let cycle = SettingCycle::new(self.kind.settings())
            .ok_or_else(|| ConfigError::UnknownAppKind(self.kind.slug().to_string()))?;
        let values: Vec<SettingValue> = cycle
            .settings()
            .iter()
            .map(|setting| SettingValue::initial(*setting))
            .collect();
        let profile = derive_profile(&id, &values[cycle.index()], Nonce::ZERO.next());
        let screen = Screen::new(&values, cycle.index());
        let friendly_name = self
            .friendly_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());

        Ok(App {
            entity_id: self.entity_id.unwrap_or_default(),
            kind: self.kind,
            friendly_name,
            position: self.position,
            state: Mutex::new(AppState {
                cycle,
                values,
                profile,
                screen,
            }),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn climate() -> App {
        App::builder(AppKind::Climate)
            .id("climate-1")
            .entity_id("climate.car")
            .friendly_name("Car")
            .build()
            .unwrap()
    }

    fn apply(app: &App, position: i32) -> KnobOutcome {
        app.apply_raw_position(&KnobState::at(position))
    }

    #[test]
    fn should_start_on_first_setting_with_default_values() {
        let app = climate();
        assert_eq!(app.current_setting(), SettingKind::Temperature);
        assert_eq!(app.value(SettingKind::Temperature).unwrap().position(), 8);
        assert_eq!(app.value(SettingKind::FanSpeed).unwrap().position(), 2);
        assert_eq!(app.motor_profile().position, 8);
        assert_eq!(app.last_nonce(), Nonce::new(1));
    }

    #[test]
    fn should_reject_missing_id() {
        let result = App::builder(AppKind::Blinds).build();
        assert!(matches!(result, Err(ConfigError::EmptyAppId)));
    }

    #[test]
    fn should_fall_back_to_id_for_friendly_name() {
        let app = App::builder(AppKind::Blinds).id("blinds-1").build().unwrap();
        assert_eq!(app.friendly_name(), "blinds-1");
    }

    #[test]
    fn should_build_from_slot() {
        let slot = AppSlot {
            position: 4,
            app_slug: "light_dimmer".to_string(),
            app_id: AppId::new("dimmer"),
            friendly_name: "Desk lamp".to_string(),
            entity_id: EntityId::new("light.desk"),
        };
        let app = App::from_slot(&slot).unwrap();
        assert_eq!(app.kind(), AppKind::LightDimmer);
        assert_eq!(app.position(), 4);
        assert_eq!(app.current_setting(), SettingKind::Brightness);
    }

    #[test]
    fn should_store_value_rederive_and_report_when_position_changes() {
        let app = climate();
        let outcome = apply(&app, 9);

        let KnobOutcome::Changed {
            value,
            update,
            profile,
        } = outcome
        else {
            panic!("expected a change");
        };
        assert!((value.value() - 20.5).abs() < f64::EPSILON);
        assert_eq!(profile.position, 9);
        assert_eq!(profile.nonce, Nonce::new(2));
        assert!(update.changed);
        assert_eq!(update.state_json().unwrap()["temperature"], 20.5);
        assert_eq!(app.motor_profile(), profile);
    }

    #[test]
    fn should_report_unchanged_when_same_position_applied_twice() {
        let app = climate();
        assert!(apply(&app, 12).did_change());
        let nonce = app.last_nonce();

        let second = apply(&app, 12);
        assert!(!second.did_change());
        assert_eq!(second.value().unwrap().position(), 12);
        assert_eq!(app.last_nonce(), nonce);
    }

    #[test]
    fn should_treat_clamped_duplicates_as_unchanged() {
        let app = climate();
        assert!(apply(&app, 500).did_change());
        assert!(!apply(&app, 900).did_change());
        assert_eq!(app.value(SettingKind::Temperature).unwrap().position(), 18);
    }

    #[test]
    fn should_clamp_fan_speed_and_report_each_change() {
        let app = climate();
        app.navigation_next();
        app.navigation_next();
        assert_eq!(app.current_setting(), SettingKind::FanSpeed);

        let low = apply(&app, -5);
        let KnobOutcome::Changed { update, .. } = &low else {
            panic!("expected a change");
        };
        assert!(update.changed);
        assert_eq!(low.value().unwrap().position(), 0);

        let high = apply(&app, 99);
        let KnobOutcome::Changed { update, .. } = &high else {
            panic!("expected a change");
        };
        assert!(update.changed);
        assert_eq!(high.value().unwrap().position(), 2);
        assert_eq!(update.state_json().unwrap()["fan_speed"], 2);
    }

    #[test]
    fn should_ignore_report_tagged_with_other_app() {
        let app = climate();
        let blinds = App::builder(AppKind::Blinds).id("blinds").build().unwrap();
        let knob = KnobState::at(3).for_profile(&blinds.motor_profile());
        assert_eq!(app.apply_raw_position(&knob), KnobOutcome::Ignored);
        assert_eq!(app.value(SettingKind::Temperature).unwrap().position(), 8);
    }

    #[test]
    fn should_ignore_report_measured_before_navigation() {
        let app = climate();
        let stale = KnobState::at(12).for_profile(&app.motor_profile());
        app.navigation_next();

        assert_eq!(app.apply_raw_position(&stale), KnobOutcome::Ignored);
        assert_eq!(app.value(SettingKind::SeatHeat).unwrap().position(), 0);
        assert_eq!(app.value(SettingKind::Temperature).unwrap().position(), 8);
    }

    #[test]
    fn should_apply_report_measured_under_current_profile() {
        let app = climate();
        app.navigation_next();
        let knob = KnobState::at(2).for_profile(&app.motor_profile());

        assert!(app.apply_raw_position(&knob).did_change());
        assert_eq!(app.value(SettingKind::SeatHeat).unwrap().position(), 2);
    }

    #[test]
    fn should_derive_profile_for_new_setting_on_navigation() {
        let app = climate();
        let nav = app.navigation_next();
        assert_eq!(nav.setting, SettingKind::SeatHeat);
        assert_eq!(nav.profile.max_position, 3);
        assert_eq!(nav.profile.position, 0);
        assert_eq!(nav.profile.nonce, Nonce::new(2));
    }

    #[test]
    fn should_return_to_origin_after_full_cycle() {
        let app = climate();
        for _ in 0..AppKind::Climate.settings().len() {
            app.navigation_next();
        }
        assert_eq!(app.current_setting(), SettingKind::Temperature);
        assert_eq!(app.motor_profile().max_position, 18);
    }

    #[test]
    fn should_rederive_same_setting_when_cycle_has_one_entry() {
        let app = App::builder(AppKind::LightSwitch).id("hall").build().unwrap();
        let before = app.motor_profile();
        let nav = app.navigation_next();
        assert_eq!(nav.setting, SettingKind::Power);
        assert!(nav.profile.nonce.is_newer_than(before.nonce));
    }

    #[test]
    fn should_increase_nonce_on_every_derivation() {
        let app = climate();
        let mut last = app.last_nonce();
        for step in 0..10 {
            let profile = if step % 3 == 0 {
                app.navigation_next().profile
            } else {
                app.reassert_profile()
            };
            assert!(profile.nonce.is_newer_than(last));
            last = profile.nonce;
        }
    }

    #[test]
    fn should_resume_nonce_after_replaced_app() {
        let app = climate();
        app.resume_after(Nonce::new(40));
        assert_eq!(app.last_nonce(), Nonce::new(41));

        app.resume_after(Nonce::new(3));
        assert_eq!(app.last_nonce(), Nonce::new(41));
    }

    #[test]
    fn should_report_current_state_as_unchanged() {
        let app = climate();
        let report = app.current_report();
        assert!(!report.changed);
        assert_eq!(
            report.state_json().unwrap(),
            serde_json::json!({
                "temperature": 20.0,
                "seat_heat": 0,
                "fan_speed": 2,
                "current_setting": 0
            })
        );
    }

    #[test]
    fn should_render_visible_gauge_of_active_setting() {
        let app = climate();
        app.navigation_next();
        let frame = app.render();
        assert_eq!(frame.setting, Some(SettingKind::SeatHeat));
        assert_eq!(frame.gauge.unwrap().label, "Level 0");
        assert_eq!(frame.profile.max_position, 3);
        assert_eq!(frame.friendly_name, "Car");
    }

    #[test]
    fn should_apply_external_state_with_rounding() {
        let app = climate();
        let restore = app
            .apply_entity_state(&serde_json::json!({"temperature": 20.3, "seat_heat": 7}))
            .unwrap();

        assert!(restore.changed);
        let profile = restore.profile.unwrap();
        assert_eq!(profile.position, 9);
        assert_eq!(app.value(SettingKind::SeatHeat).unwrap().position(), 3);
    }

    #[test]
    fn should_not_rederive_when_only_inactive_setting_changes() {
        let app = climate();
        let nonce = app.last_nonce();
        let restore = app
            .apply_entity_state(&serde_json::json!({"fan_speed": 0, "unknown": "x"}))
            .unwrap();
        assert!(restore.changed);
        assert!(restore.profile.is_none());
        assert_eq!(app.last_nonce(), nonce);
    }

    #[test]
    fn should_reject_non_numeric_state_without_applying_anything() {
        let app = climate();
        let result =
            app.apply_entity_state(&serde_json::json!({"seat_heat": 2, "fan_speed": "max"}));
        assert_eq!(
            result,
            Err(PayloadError::NotANumber {
                key: "fan_speed".to_string()
            })
        );
        assert_eq!(app.value(SettingKind::SeatHeat).unwrap().position(), 0);
    }

    #[test]
    fn should_reject_non_object_state() {
        let app = climate();
        let result = app.apply_entity_state(&serde_json::json!([1, 2]));
        assert_eq!(result, Err(PayloadError::NotAnObject));
    }
}

//! App registry — owns every loaded app, tracks the active one and forwards
//! knob, navigation and render calls to it.
//!
//! ## Locking
//!
//! The app map and the active id sit behind one registry mutex, held only
//! for the lookup or mutation itself. Each [`App`] has its own mutex, so
//! rendering one app never waits on another app's knob update. The only
//! nesting is registry lock → app lock, never the reverse.
//!
//! Profiles are pushed to the [`MotorNotifier`] outside any app lock, under
//! the registry lock, and only while the app that derived them is still the
//! active one. A slow knob update cannot put a stale app's feel back on the
//! motor.
//!
//! ## Nonces
//!
//! The registry remembers the last nonce pushed or issued for every id it
//! has seen, including ids no longer loaded. A push whose nonce is not newer
//! than that record is dropped, so the notifier sees strictly increasing
//! nonces per id even when two callers race on one app. An app that comes
//! back under a known id, after [`AppRegistry::clear`] or a reload, resumes
//! after the recorded nonce.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use knobhub_domain::app_kind::AppKind;
use knobhub_domain::error::{KnobError, NotFoundError};
use knobhub_domain::id::AppId;
use knobhub_domain::knob::KnobState;
use knobhub_domain::profile::{MotorProfile, Nonce};
use knobhub_domain::setting::SettingKind;
use knobhub_domain::slot::AppSlot;
use knobhub_domain::state_update::EntityStateUpdate;

use crate::app::{App, KnobOutcome};
use crate::ports::MotorNotifier;
use crate::screen::Frame;

/// One line of the app menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub position: u8,
    pub app_id: AppId,
    pub friendly_name: String,
    pub kind: AppKind,
}

#[derive(Default)]
struct Inner {
    /// Sole owner of the apps. Callers only borrow a handle for the length
    /// of one call.
    apps: HashMap<AppId, Arc<App>>,
    active_id: Option<AppId>,
    /// Last nonce per id. Outlives the apps themselves.
    nonces: HashMap<AppId, Nonce>,
}

impl Inner {
    fn active(&self) -> Option<Arc<App>> {
        self.active_id
            .as_ref()
            .and_then(|id| self.apps.get(id))
            .cloned()
    }

    fn is_active(&self, app: &Arc<App>) -> bool {
        self.active_id.as_ref() == Some(app.id())
            && self
                .apps
                .get(app.id())
                .is_some_and(|current| Arc::ptr_eq(current, app))
    }

    /// Record `nonce` for `id`. Returns `false` if it is not newer than the
    /// one already recorded.
    fn record(&mut self, id: &AppId, nonce: Nonce) -> bool {
        match self.nonces.get_mut(id) {
            Some(last) if !nonce.is_newer_than(*last) => false,
            Some(last) => {
                *last = nonce;
                true
            }
            None => {
                self.nonces.insert(id.clone(), nonce);
                true
            }
        }
    }

    /// Record the last nonce of every loaded app before they get dropped.
    fn retire_all(&mut self) {
        let issued: Vec<(AppId, Nonce)> = self
            .apps
            .iter()
            .map(|(id, app)| (id.clone(), app.last_nonce()))
            .collect();
        for (id, nonce) in issued {
            self.record(&id, nonce);
        }
    }

    /// Make `app` continue the nonce sequence of its id.
    fn resume(&self, app: &App) {
        if let Some(previous) = self.apps.get(app.id()) {
            app.resume_after(previous.last_nonce());
        }
        if let Some(last) = self.nonces.get(app.id()) {
            app.resume_after(*last);
        }
    }
}

/// Owner and switcher of all loaded apps.
pub struct AppRegistry<N> {
    notifier: Option<N>,
    inner: Mutex<Inner>,
}

impl<N: MotorNotifier> AppRegistry<N> {
    /// Create an empty registry pushing profiles to `notifier`.
    pub fn new(notifier: N) -> Self {
        Self {
            notifier: Some(notifier),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create an empty registry with no motor attached.
    ///
    /// Every push is logged and dropped.
    #[must_use]
    pub fn without_notifier() -> Self {
        Self {
            notifier: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Insert `app` under its id, replacing any app already there.
    ///
    /// The active id is left alone. A replacement continues the nonce
    /// sequence of the app it replaces; if that app was active, the new
    /// one's profile is pushed straight away.
    pub fn add(&self, app: App) {
        let mut inner = self.lock();
        let id = app.id().clone();
        inner.resume(&app);
        let app = Arc::new(app);
        if let Some(previous) = inner.apps.insert(id.clone(), Arc::clone(&app)) {
            tracing::debug!(app_id = %id, "replacing app");
            inner.record(&id, previous.last_nonce());
        }

        if inner.active_id.as_ref() == Some(&id) {
            self.notify(&mut inner, app.reassert_profile());
        }
    }

    /// Make `id` the active app and push its profile.
    ///
    /// Unknown ids are ignored and leave the active app unchanged. Returns
    /// whether the switch happened.
    pub fn set_active(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let Some(app) = inner.apps.get(id).cloned() else {
            tracing::warn!(app_id = id, "cannot activate unknown app");
            return false;
        };
        inner.active_id = Some(app.id().clone());
        self.notify(&mut inner, app.reassert_profile());
        tracing::info!(app_id = id, "app activated");
        true
    }

    /// Feed a knob report to the active app.
    ///
    /// Returns the app's state update when the value changed; `None` when
    /// no app is active or the report changed nothing.
    pub fn update(&self, knob: &KnobState) -> Option<EntityStateUpdate> {
        let Some(app) = self.active() else {
            tracing::debug!("knob report while no app is active");
            return None;
        };
        match app.apply_raw_position(knob) {
            KnobOutcome::Changed {
                update, profile, ..
            } => {
                self.push_if_active(&app, profile);
                Some(update)
            }
            KnobOutcome::Unchanged(_) | KnobOutcome::Ignored => None,
        }
    }

    /// Cycle the active app to its next setting and push the new profile.
    ///
    /// Returns the newly active setting, or `None` when no app is active.
    pub fn navigation_next(&self) -> Option<SettingKind> {
        let Some(app) = self.active() else {
            tracing::debug!("navigation while no app is active");
            return None;
        };
        let navigation = app.navigation_next();
        self.push_if_active(&app, navigation.profile);
        Some(navigation.setting)
    }

    /// Snapshot of the active app's screen; an empty frame when no app is
    /// active.
    #[must_use]
    pub fn render_active(&self) -> Frame {
        self.active().map_or_else(Frame::empty, |app| app.render())
    }

    /// Profile of the active app; the neutral profile when no app is active.
    #[must_use]
    pub fn active_motor_config(&self) -> MotorProfile {
        self.active()
            .map_or_else(MotorProfile::neutral, |app| app.motor_profile())
    }

    /// Current state of the active app, flagged as unchanged.
    #[must_use]
    pub fn active_report(&self) -> Option<EntityStateUpdate> {
        self.active().map(|app| app.current_report())
    }

    #[must_use]
    pub fn active_id(&self) -> Option<AppId> {
        self.lock().active_id.clone()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lock().apps.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().apps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().apps.is_empty()
    }

    /// Loaded apps ordered by menu position, then id.
    #[must_use]
    pub fn menu(&self) -> Vec<MenuEntry> {
        let mut entries: Vec<MenuEntry> = self
            .lock()
            .apps
            .values()
            .map(|app| MenuEntry {
                position: app.position(),
                app_id: app.id().clone(),
                friendly_name: app.friendly_name().to_string(),
                kind: app.kind(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.app_id.cmp(&b.app_id))
        });
        entries
    }

    /// Replace every app with the ones described by `slots`.
    ///
    /// Invalid slots are logged and skipped. When two slots share an id
    /// the later one wins. If the active app's id survives, its new
    /// instance stays active and its profile is pushed; otherwise no app is
    /// active afterwards. Returns the number of apps loaded.
    pub fn reload(&self, slots: &[AppSlot]) -> usize {
        let mut apps: HashMap<AppId, App> = HashMap::new();
        for slot in slots {
            match App::from_slot(slot) {
                Ok(app) => {
                    if apps.contains_key(app.id()) {
                        tracing::warn!(app_id = %app.id(), "duplicate app id, later slot wins");
                    }
                    apps.insert(app.id().clone(), app);
                }
                Err(err) => {
                    tracing::warn!(
                        position = slot.position,
                        app_id = %slot.app_id,
                        error = %err,
                        "skipping app slot"
                    );
                }
            }
        }
        let loaded = apps.len();

        let mut inner = self.lock();
        for app in apps.values() {
            inner.resume(app);
        }
        inner.retire_all();
        inner.apps = apps
            .into_iter()
            .map(|(id, app)| (id, Arc::new(app)))
            .collect();

        if let Some(active_id) = inner.active_id.clone() {
            if let Some(app) = inner.apps.get(&active_id).cloned() {
                self.notify(&mut inner, app.reassert_profile());
            } else {
                tracing::info!(app_id = %active_id, "active app removed by reload");
                inner.active_id = None;
            }
        }
        drop(inner);

        tracing::info!(count = loaded, "apps reloaded");
        loaded
    }

    /// Drop every app. No app is active afterwards.
    ///
    /// Nonce records survive, so an app added again later still supersedes
    /// whatever the motor holds for its id.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.retire_all();
        inner.apps.clear();
        inner.active_id = None;
        drop(inner);
        tracing::info!("apps cleared");
    }

    /// Apply an external state payload to the app `app_id`.
    ///
    /// If the app is active and its active setting moved, the re-derived
    /// profile is pushed once. Returns whether any value moved.
    ///
    /// # Errors
    ///
    /// Returns [`KnobError::NotFound`] for an unknown app and
    /// [`KnobError::Payload`] for a payload that does not fit the app's
    /// schema.
    pub fn apply_entity_state(
        &self,
        app_id: &str,
        payload: &serde_json::Value,
    ) -> Result<bool, KnobError> {
        let app = self
            .lock()
            .apps
            .get(app_id)
            .cloned()
            .ok_or_else(|| NotFoundError {
                entity: "App",
                id: app_id.to_string(),
            })?;
        let restore = app.apply_entity_state(payload)?;
        if let Some(profile) = restore.profile {
            self.push_if_active(&app, profile);
        }
        Ok(restore.changed)
    }

    fn active(&self) -> Option<Arc<App>> {
        self.lock().active()
    }

    fn push_if_active(&self, app: &Arc<App>, profile: MotorProfile) {
        let mut inner = self.lock();
        if !inner.is_active(app) {
            tracing::debug!(
                app_id = %profile.id,
                nonce = %profile.nonce,
                "app no longer active, not pushing its profile"
            );
            return;
        }
        self.notify(&mut inner, profile);
    }

    fn notify(&self, inner: &mut Inner, profile: MotorProfile) {
        if !inner.record(&profile.id, profile.nonce) {
            tracing::debug!(
                app_id = %profile.id,
                nonce = %profile.nonce,
                "newer profile already pushed, dropping this one"
            );
            return;
        }
        match &self.notifier {
            Some(notifier) => {
                tracing::trace!(app_id = %profile.id, nonce = %profile.nonce, "pushing motor profile");
                notifier.request_update(profile);
            }
            None => {
                tracing::error!(app_id = %profile.id, "motor notifier missing, profile dropped");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

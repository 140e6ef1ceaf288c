//! Daemon state shared by the control, render and motor tasks.

use std::sync::Arc;

use knobhub_adapter_virtual::VirtualKnob;
use knobhub_app::motor_bus::WatchMotorNotifier;
use knobhub_app::ports::StatePublisher;
use knobhub_app::registry::AppRegistry;
use knobhub_app::report_bus::InProcessReportBus;
use knobhub_domain::error::KnobError;
use knobhub_domain::slot::AppSlot;

use crate::commands::Command;
use crate::config::{Config, ConfigError};

/// Registry wired to an in-process motor notifier, a report bus and a
/// virtual knob.
pub struct Daemon {
    pub registry: AppRegistry<Arc<WatchMotorNotifier>>,
    pub notifier: Arc<WatchMotorNotifier>,
    pub knob: Arc<VirtualKnob>,
    pub reports: InProcessReportBus,
}

/// Errors from executing a control command.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("configuration error")]
    Config(#[from] ConfigError),
    #[error("knob error")]
    Knob(#[from] KnobError),
    #[error("unknown app `{0}`")]
    UnknownApp(String),
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    #[must_use]
    pub fn new() -> Self {
        let notifier = Arc::new(WatchMotorNotifier::new());
        Self {
            registry: AppRegistry::new(Arc::clone(&notifier)),
            notifier,
            knob: Arc::new(VirtualKnob::new()),
            reports: InProcessReportBus::new(64),
        }
    }

    /// Replace the loaded apps with `slots`.
    pub fn load(&self, slots: &[AppSlot]) -> usize {
        self.registry.reload(slots)
    }

    /// Activate `initial`, or the first app in the menu when `None`.
    ///
    /// Returns whether an app became active.
    pub fn activate_initial(&self, initial: Option<&str>) -> bool {
        let id = match initial {
            Some(id) => id.to_string(),
            None => match self.registry.menu().first() {
                Some(entry) => entry.app_id.to_string(),
                None => {
                    tracing::warn!("no apps loaded, nothing to activate");
                    return false;
                }
            },
        };
        self.registry.set_active(&id)
    }

    /// Execute one control command.
    ///
    /// # Errors
    ///
    /// Returns an error if a reload cannot read the configuration, `open`
    /// names an unknown app or a state update cannot be published.
    pub async fn execute(&self, command: Command) -> Result<(), DaemonError> {
        match command {
            Command::Rotate(steps) => {
                // the knob follows whatever the motor holds right now
                self.knob.apply_profile(&self.notifier.latest());
                let state = self.knob.rotate(steps);
                if let Some(update) = self.registry.update(&state) {
                    tracing::info!(app_id = %update.app_id, state = %update.state, "state changed");
                    self.reports.publish(update).await?;
                }
            }
            Command::Next => match self.registry.navigation_next() {
                Some(setting) => tracing::info!(%setting, "setting selected"),
                None => tracing::warn!("no active app"),
            },
            Command::Open(id) => {
                if !self.registry.set_active(&id) {
                    return Err(DaemonError::UnknownApp(id));
                }
            }
            Command::Reload => {
                let config = Config::load()?;
                self.load(&config.app_slots());
            }
            Command::Menu => {
                let active = self.registry.active_id();
                for entry in self.registry.menu() {
                    tracing::info!(
                        position = entry.position,
                        app_id = %entry.app_id,
                        name = %entry.friendly_name,
                        kind = %entry.kind,
                        active = active.as_ref() == Some(&entry.app_id),
                        "menu entry"
                    );
                }
            }
        }
        Ok(())
    }
}

//! In-process motor notifier backed by a tokio watch channel.

use tokio::sync::watch;

use knobhub_domain::profile::MotorProfile;

use crate::ports::MotorNotifier;

/// Coalescing [`MotorNotifier`]: only the latest profile is kept.
///
/// A push that is not newer than the held profile of the same app
/// (see [`MotorProfile::supersedes`]) is dropped. Pushing never blocks and
/// succeeds with or without a listening motor task.
pub struct WatchMotorNotifier {
    sender: watch::Sender<MotorProfile>,
}

impl Default for WatchMotorNotifier {
    fn default() -> Self {
        let (sender, _) = watch::channel(MotorProfile::neutral());
        Self { sender }
    }
}

impl WatchMotorNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to profile changes.
    ///
    /// The receiver starts out holding the current profile.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MotorProfile> {
        self.sender.subscribe()
    }

    /// The most recently accepted profile.
    #[must_use]
    pub fn latest(&self) -> MotorProfile {
        self.sender.borrow().clone()
    }
}

impl MotorNotifier for WatchMotorNotifier {
    fn request_update(&self, profile: MotorProfile) {
        self.sender.send_if_modified(|current| {
            if !profile.supersedes(current) {
                tracing::debug!(
                    app_id = %profile.id,
                    nonce = %profile.nonce,
                    held = %current.nonce,
                    "dropping stale motor profile"
                );
                return false;
            }
            *current = profile;
            true
        });
    }
}

//! Motor notifier port — where derived motor profiles are pushed.

use std::sync::Arc;

use knobhub_domain::profile::MotorProfile;

/// Sink for motor profiles, implemented by whatever drives the haptic motor.
///
/// Pushes are fire-and-forget. Implementations must not block: they are
/// expected to coalesce or drop stale profiles using
/// [`MotorProfile::nonce`], never to apply backpressure to the caller.
pub trait MotorNotifier: Send + Sync {
    /// Request that the motor adopt `profile`.
    fn request_update(&self, profile: MotorProfile);
}

impl<T: MotorNotifier + ?Sized> MotorNotifier for Arc<T> {
    fn request_update(&self, profile: MotorProfile) {
        (**self).request_update(profile);
    }
}

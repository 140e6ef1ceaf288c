//! State report port — publishes entity state updates to the outside world.

use std::future::Future;
use std::sync::Arc;

use knobhub_domain::error::KnobError;
use knobhub_domain::state_update::EntityStateUpdate;

/// Publishes entity state updates to interested subscribers
/// (home-automation bridges, loggers, …).
pub trait StatePublisher {
    /// Publish an update to all current subscribers.
    fn publish(
        &self,
        update: EntityStateUpdate,
    ) -> impl Future<Output = Result<(), KnobError>> + Send;
}

impl<T: StatePublisher + Send + Sync> StatePublisher for Arc<T> {
    fn publish(
        &self,
        update: EntityStateUpdate,
    ) -> impl Future<Output = Result<(), KnobError>> + Send {
        (**self).publish(update)
    }
}

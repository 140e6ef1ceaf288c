//! Report bus — fans entity state updates out to in-process listeners.
//!
//! The daemon's report task logs what goes through here; a home-automation
//! bridge would subscribe the same way.

use std::future::Future;

use tokio::sync::broadcast;

use knobhub_domain::error::KnobError;
use knobhub_domain::state_update::EntityStateUpdate;

use crate::ports::StatePublisher;

/// [`StatePublisher`] that hands every update to all current listeners.
///
/// Listeners that fall more than `capacity` updates behind lose the oldest
/// ones. An update published while nobody listens is gone.
pub struct InProcessReportBus {
    sender: broadcast::Sender<EntityStateUpdate>,
}

impl InProcessReportBus {
    /// Bus keeping up to `capacity` unread updates per listener.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Start listening. Only updates published from now on are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EntityStateUpdate> {
        self.sender.subscribe()
    }

    /// Number of listeners right now.
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl StatePublisher for InProcessReportBus {
    fn publish(
        &self,
        update: EntityStateUpdate,
    ) -> impl Future<Output = Result<(), KnobError>> + Send {
        if self.sender.send(update).is_err() {
            tracing::trace!("state update published with no listeners");
        }
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knobhub_domain::app_kind::AppKind;
    use knobhub_domain::id::{AppId, EntityId};
    use knobhub_domain::setting::SettingKind;
    use knobhub_domain::value::SettingValue;

    fn blinds_update(position: i32) -> EntityStateUpdate {
        EntityStateUpdate::from_values(
            AppId::new("blinds"),
            EntityId::new("cover.office"),
            AppKind::Blinds,
            &[SettingValue::from_raw(SettingKind::Position, position)],
            0,
            true,
        )
    }

    #[tokio::test]
    async fn should_deliver_update_to_subscriber() {
        let bus = InProcessReportBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(blinds_update(4)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received, blinds_update(4));
    }

    #[tokio::test]
    async fn should_deliver_update_to_multiple_subscribers() {
        let bus = InProcessReportBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(blinds_update(2)).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().app_id.as_str(), "blinds");
        assert_eq!(rx2.recv().await.unwrap().app_id.as_str(), "blinds");
    }

    #[test]
    fn should_count_listeners() {
        let bus = InProcessReportBus::new(4);
        assert_eq!(bus.listeners(), 0);
        let _rx = bus.subscribe();
        assert_eq!(bus.listeners(), 1);
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessReportBus::new(16);
        assert!(bus.publish(blinds_update(1)).await.is_ok());
    }

    #[tokio::test]
    async fn should_not_deliver_updates_published_before_subscription() {
        let bus = InProcessReportBus::new(16);
        bus.publish(blinds_update(1)).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(blinds_update(7)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), blinds_update(7));
    }
}

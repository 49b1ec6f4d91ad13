use async_trait::async_trait;
use ridepool_core::booking::Notification;
use ridepool_core::repository::{BookingRepository, NotificationEmitter};
use ridepool_shared::NotificationEvent;
use std::sync::Arc;
use tracing::{error, info};

/// Delivers notifications by writing them to the user's inbox.
#[derive(Clone)]
pub struct StoreNotifier {
    repo: Arc<dyn BookingRepository>,
}

impl StoreNotifier {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl NotificationEmitter for StoreNotifier {
    async fn emit(&self, event: NotificationEvent) {
        let notification = Notification::from(event);

        match self.repo.create_notification(&notification).await {
            Ok(()) => {
                info!(
                    "Sent {} notification {} to user {}",
                    notification.kind, notification.id, notification.user_id
                );
            }
            Err(e) => {
                error!(
                    "Failed to store {} notification for user {}: {}",
                    notification.kind, notification.user_id, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use ridepool_shared::NotificationKind;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_emit_lands_in_inbox() {
        let store = Arc::new(MemoryStore::new());
        let notifier = StoreNotifier::new(store.clone());
        let user = Uuid::new_v4();
        let ride = Uuid::new_v4();

        notifier
            .emit(NotificationEvent::new(user, NotificationKind::RideCancelled, "Ride cancelled", "No confirmed riders", Some(ride)))
            .await;

        let inbox = store.list_notifications(user).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::RideCancelled);
        assert_eq!(inbox[0].related_id, Some(ride));
        assert!(!inbox[0].is_read);
    }
}

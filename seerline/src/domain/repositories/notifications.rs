use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::notifications::{NewNotificationEntity, NotificationEntity};

#[automock]
#[async_trait]
pub trait NotificationRepository {
    async fn insert(
        &self,
        new_notification_entity: NewNotificationEntity,
    ) -> Result<NotificationEntity>;

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationEntity>>;

    /// Flips the read flag; returns false when the row does not belong to
    /// the caller.
    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<bool>;
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::notifications::NotificationEntity;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationModel {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub metadata: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEntity> for NotificationModel {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            notification_type: entity.notification_type,
            title: entity.title,
            body: entity.body,
            metadata: entity.metadata,
            is_read: entity.is_read,
            created_at: entity.created_at,
        }
    }
}

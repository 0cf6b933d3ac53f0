use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::domain::entities::notifications::{NewNotificationEntity, NotificationEntity};
use crate::domain::repositories::notifications::NotificationRepository;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::notifications;

pub struct NotificationPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl NotificationPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationPostgres {
    async fn insert(
        &self,
        new_notification_entity: NewNotificationEntity,
    ) -> Result<NotificationEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let notification = insert_into(notifications::table)
            .values(&new_notification_entity)
            .get_result::<NotificationEntity>(&mut conn)?;

        Ok(notification)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();

        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }

        let rows = query
            .order(notifications::created_at.desc())
            .load::<NotificationEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::user_id.eq(user_id)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)?;

        Ok(updated > 0)
    }
}

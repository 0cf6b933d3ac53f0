use std::sync::Arc;

use seerline::domain::error::{with_db_retry, CoreError, CoreResult};
use seerline::domain::repositories::notifications::NotificationRepository;
use seerline::domain::value_objects::notifications::NotificationModel;
use uuid::Uuid;

use crate::usecases::Subject;

/// Read side of the durable inbox; late-joining pub/sub subscribers
/// rehydrate through these.
pub struct NotificationUseCase<N>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    notification_repo: Arc<N>,
}

impl<N> NotificationUseCase<N>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    pub fn new(notification_repo: Arc<N>) -> Self {
        Self { notification_repo }
    }

    pub async fn list(
        &self,
        subject: Subject,
        unread_only: bool,
    ) -> CoreResult<Vec<NotificationModel>> {
        let rows = with_db_retry("notifications: list inbox", || {
            self.notification_repo
                .list_for_user(subject.user_id, unread_only)
        })
        .await?;

        Ok(rows.into_iter().map(NotificationModel::from).collect())
    }

    pub async fn mark_read(&self, subject: Subject, notification_id: Uuid) -> CoreResult<()> {
        let marked = with_db_retry("notifications: mark read", || {
            self.notification_repo
                .mark_read(notification_id, subject.user_id)
        })
        .await?;

        if !marked {
            return Err(CoreError::NotFound("notification"));
        }

        Ok(())
    }
}

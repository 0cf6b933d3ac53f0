use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use seerline::domain::entities::notifications::NewNotificationEntity;
use seerline::domain::error::with_db_retry;
use seerline::domain::repositories::{
    notifications::NotificationRepository, sessions::SessionRepository,
};
use seerline::realtime::channels::notifications_channel;
use seerline::realtime::event_bus::EventPublisher;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// End-of-life sweep for requests the reader never answered. Pending rows
/// older than the timeout are cancelled with reason `timeout` and the
/// requesting client is told.
pub struct SessionSweepUseCase {
    session_repo: Arc<dyn SessionRepository + Send + Sync>,
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
    event_bus: Arc<dyn EventPublisher>,
    timeout_minutes: i64,
}

impl SessionSweepUseCase {
    pub fn new(
        session_repo: Arc<dyn SessionRepository + Send + Sync>,
        notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
        event_bus: Arc<dyn EventPublisher>,
        timeout_minutes: i64,
    ) -> Self {
        Self {
            session_repo,
            notification_repo,
            event_bus,
            timeout_minutes,
        }
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::minutes(self.timeout_minutes);
        let cancelled = with_db_retry("sweep: cancel stale pending sessions", || {
            self.session_repo.sweep_stale_pending(cutoff)
        })
        .await?;

        for session in &cancelled {
            info!(
                session_id = %session.id,
                client_id = %session.client_id,
                "sweep: pending session timed out"
            );

            let row = NewNotificationEntity {
                id: Uuid::new_v4(),
                user_id: session.client_id,
                notification_type: "session_timeout".to_string(),
                title: "Reading request expired".to_string(),
                body: "The reader did not answer in time; you were not charged".to_string(),
                metadata: json!({ "session_id": session.id }),
                is_read: false,
                created_at: now,
            };
            if let Err(err) = with_db_retry("sweep: insert notification", || {
                self.notification_repo.insert(row.clone())
            })
            .await
            {
                warn!(session_id = %session.id, "sweep: notification insert failed: {err}");
            }

            if let Err(err) = self
                .event_bus
                .publish(
                    &notifications_channel(session.client_id),
                    "notification",
                    json!({ "type": "session_timeout", "session_id": session.id }),
                )
                .await
            {
                warn!(session_id = %session.id, "sweep: notification publish failed: {err}");
            }
        }

        Ok(cancelled.len())
    }
}

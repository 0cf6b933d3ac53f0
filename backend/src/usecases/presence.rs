use std::sync::Arc;

use chrono::Utc;
use seerline::domain::error::{with_db_retry, CoreError, CoreResult};
use seerline::domain::repositories::{
    reader_profiles::ReaderProfileRepository, sessions::SessionRepository,
};
use seerline::domain::value_objects::enums::reader_statuses::ReaderStatus;
use seerline::domain::value_objects::enums::roles::Role;
use seerline::domain::value_objects::presence::{OnlineReaderModel, StatusUpdateModel};
use seerline::realtime::channels::READERS_STATUS_CHANNEL;
use seerline::realtime::event_bus::EventPublisher;
use tracing::{info, warn};

use crate::usecases::Subject;

/// Reader presence transitions. The session-status flag is the durable
/// fact; presence is the fast availability index, so self-transitions are
/// checked against both the transition table and any live session row.
pub struct PresenceUseCase<R, S, E>
where
    R: ReaderProfileRepository + Send + Sync + 'static,
    S: SessionRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    reader_repo: Arc<R>,
    session_repo: Arc<S>,
    event_bus: Arc<E>,
}

impl<R, S, E> PresenceUseCase<R, S, E>
where
    R: ReaderProfileRepository + Send + Sync + 'static,
    S: SessionRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    pub fn new(reader_repo: Arc<R>, session_repo: Arc<S>, event_bus: Arc<E>) -> Self {
        Self {
            reader_repo,
            session_repo,
            event_bus,
        }
    }

    pub async fn set_status(
        &self,
        subject: Subject,
        requested: ReaderStatus,
    ) -> CoreResult<ReaderStatus> {
        if subject.role != Role::Reader {
            return Err(CoreError::NotAuthorized);
        }

        let profile = with_db_retry("presence: load reader profile", || {
            self.reader_repo.find_by_user_id(subject.user_id)
        })
        .await?
        .ok_or(CoreError::NotFound("reader profile"))?;

        let current = ReaderStatus::from_str(&profile.status)
            .ok_or_else(|| CoreError::Internal(anyhow::anyhow!("corrupt presence value")))?;

        if current == requested {
            return Ok(current);
        }

        let allowed = if current == ReaderStatus::InSession && requested == ReaderStatus::Online {
            // Forced-online override: only valid when no session row is
            // actually active, i.e. presence went stale.
            with_db_retry("presence: check active session", || {
                self.session_repo.find_active_by_reader(subject.user_id)
            })
            .await?
            .is_none()
        } else {
            current.can_self_transition_to(requested)
        };

        if !allowed {
            return Err(CoreError::InvalidTransition(format!(
                "cannot move from {} to {}",
                current, requested
            )));
        }

        let flipped = with_db_retry("presence: write status", || {
            self.reader_repo
                .set_status_if(subject.user_id, vec![current], requested)
        })
        .await?;

        if !flipped {
            // Someone else moved the status between read and write.
            return Err(CoreError::InvalidTransition(format!(
                "presence changed concurrently, no longer {}",
                current
            )));
        }

        info!(reader_id = %subject.user_id, from = %current, to = %requested, "presence: transition");

        let update = StatusUpdateModel {
            reader_id: subject.user_id,
            status: requested,
            timestamp: Utc::now(),
        };
        if let Err(err) = self
            .event_bus
            .publish(
                READERS_STATUS_CHANNEL,
                "status-update",
                serde_json::to_value(&update).unwrap_or_default(),
            )
            .await
        {
            warn!(reader_id = %subject.user_id, "presence: status publish failed: {err}");
        }

        Ok(requested)
    }

    pub async fn list_online(&self) -> CoreResult<Vec<OnlineReaderModel>> {
        with_db_retry("presence: list online readers", || {
            self.reader_repo.list_online()
        })
        .await
    }
}

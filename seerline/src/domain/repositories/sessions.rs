use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::messages::{MessageEntity, NewMessageEntity};
use crate::domain::entities::sessions::{NewSessionEntity, SessionEntity};
use crate::domain::value_objects::sessions::AcceptOutcome;

#[automock]
#[async_trait]
pub trait SessionRepository {
    async fn create(&self, new_session_entity: NewSessionEntity) -> Result<SessionEntity>;

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<SessionEntity>>;

    async fn find_active_by_reader(&self, reader_id: Uuid) -> Result<Option<SessionEntity>>;

    /// The locked pending -> active transition. Re-reads the session and
    /// the reader's presence under row locks so that two accepts for the
    /// same reader cannot interleave; the loser's row is cancelled with
    /// reason `reader_already_in_session`.
    async fn accept_pending(
        &self,
        session_id: Uuid,
        reader_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AcceptOutcome>;

    /// Cancels a pending row under lock. Returns None when the row is no
    /// longer pending (the transition already happened elsewhere).
    async fn cancel_pending(
        &self,
        session_id: Uuid,
        reason: String,
    ) -> Result<Option<SessionEntity>>;

    /// Cancels every pending row created before `cutoff` with reason
    /// `timeout` and returns the cancelled rows.
    async fn sweep_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionEntity>>;

    async fn append_message(&self, new_message_entity: NewMessageEntity)
        -> Result<MessageEntity>;
}

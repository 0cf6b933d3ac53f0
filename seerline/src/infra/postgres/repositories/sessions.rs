use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*, update};
use uuid::Uuid;

use crate::domain::entities::messages::{MessageEntity, NewMessageEntity};
use crate::domain::entities::sessions::{NewSessionEntity, SessionEntity};
use crate::domain::repositories::sessions::SessionRepository;
use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;
use crate::domain::value_objects::enums::session_statuses::SessionStatus;
use crate::domain::value_objects::sessions::AcceptOutcome;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{messages, reader_profiles, sessions};

pub const LOST_RACE_REASON: &str = "reader_already_in_session";

pub struct SessionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SessionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SessionRepository for SessionPostgres {
    async fn create(&self, new_session_entity: NewSessionEntity) -> Result<SessionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let session = insert_into(sessions::table)
            .values(&new_session_entity)
            .get_result::<SessionEntity>(&mut conn)?;

        Ok(session)
    }

    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let session = sessions::table
            .find(session_id)
            .first::<SessionEntity>(&mut conn)
            .optional()?;

        Ok(session)
    }

    async fn find_active_by_reader(&self, reader_id: Uuid) -> Result<Option<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let session = sessions::table
            .filter(sessions::reader_id.eq(reader_id))
            .filter(sessions::status.eq(SessionStatus::Active.to_string()))
            .first::<SessionEntity>(&mut conn)
            .optional()?;

        Ok(session)
    }

    async fn accept_pending(
        &self,
        session_id: Uuid,
        reader_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AcceptOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let session = sessions::table
                .find(session_id)
                .for_update()
                .first::<SessionEntity>(conn)
                .optional()?;

            let Some(session) = session else {
                return Ok(AcceptOutcome::NotFound);
            };

            match SessionStatus::from_str(&session.status) {
                Some(SessionStatus::Active) if session.reader_id == reader_id => {
                    return Ok(AcceptOutcome::AlreadyActive(session));
                }
                Some(SessionStatus::Pending) => {}
                _ => return Ok(AcceptOutcome::NotPending(session)),
            }

            // Presence is the coarse mutex across sessions for one reader:
            // whoever locks the profile row first wins the accept.
            let presence = reader_profiles::table
                .find(session.reader_id)
                .select(reader_profiles::status)
                .for_update()
                .first::<String>(conn)?;

            if ReaderStatus::from_str(&presence) != Some(ReaderStatus::Online) {
                let cancelled =
                    update(sessions::table.filter(sessions::id.eq(session.id)))
                        .set((
                            sessions::status.eq(SessionStatus::Cancelled.to_string()),
                            sessions::notes.eq(Some(LOST_RACE_REASON.to_string())),
                            sessions::updated_at.eq(now),
                        ))
                        .get_result::<SessionEntity>(conn)?;

                return Ok(AcceptOutcome::LostRace(cancelled));
            }

            update(reader_profiles::table.filter(reader_profiles::user_id.eq(session.reader_id)))
                .set((
                    reader_profiles::status.eq(ReaderStatus::InSession.to_string()),
                    reader_profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

            let accepted = update(sessions::table.filter(sessions::id.eq(session.id)))
                .set((
                    sessions::status.eq(SessionStatus::Active.to_string()),
                    sessions::start_time.eq(Some(now)),
                    sessions::updated_at.eq(now),
                ))
                .get_result::<SessionEntity>(conn)?;

            Ok(AcceptOutcome::Accepted(accepted))
        })?;

        Ok(outcome)
    }

    async fn cancel_pending(
        &self,
        session_id: Uuid,
        reason: String,
    ) -> Result<Option<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let cancelled = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let session = sessions::table
                .find(session_id)
                .for_update()
                .first::<SessionEntity>(conn)
                .optional()?;

            let Some(session) = session else {
                return Ok(None);
            };

            if SessionStatus::from_str(&session.status) != Some(SessionStatus::Pending) {
                return Ok(None);
            }

            let cancelled = update(sessions::table.filter(sessions::id.eq(session.id)))
                .set((
                    sessions::status.eq(SessionStatus::Cancelled.to_string()),
                    sessions::notes.eq(Some(reason)),
                    sessions::updated_at.eq(now),
                ))
                .get_result::<SessionEntity>(conn)?;

            Ok(Some(cancelled))
        })?;

        Ok(cancelled)
    }

    async fn sweep_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<SessionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let cancelled = update(
            sessions::table
                .filter(sessions::status.eq(SessionStatus::Pending.to_string()))
                .filter(sessions::created_at.lt(cutoff)),
        )
        .set((
            sessions::status.eq(SessionStatus::Cancelled.to_string()),
            sessions::notes.eq(Some("timeout".to_string())),
            sessions::updated_at.eq(now),
        ))
        .get_results::<SessionEntity>(&mut conn)?;

        Ok(cancelled)
    }

    async fn append_message(
        &self,
        new_message_entity: NewMessageEntity,
    ) -> Result<MessageEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let message = insert_into(messages::table)
            .values(&new_message_entity)
            .get_result::<MessageEntity>(&mut conn)?;

        Ok(message)
    }
}

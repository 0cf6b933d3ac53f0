use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use seerline::domain::entities::messages::NewMessageEntity;
use seerline::domain::entities::notifications::NewNotificationEntity;
use seerline::domain::entities::sessions::{NewSessionEntity, SessionEntity};
use seerline::domain::error::{with_db_retry, CoreError, CoreResult};
use seerline::domain::repositories::{
    ledger::LedgerRepository, notifications::NotificationRepository,
    reader_profiles::ReaderProfileRepository, sessions::SessionRepository,
};
use seerline::domain::value_objects::enums::reader_statuses::ReaderStatus;
use seerline::domain::value_objects::enums::roles::Role;
use seerline::domain::value_objects::enums::session_statuses::SessionStatus;
use seerline::domain::value_objects::enums::session_types::SessionType;
use seerline::domain::value_objects::ledger::{SettleSessionCommand, SettlementOutcome};
use seerline::domain::value_objects::money::{SessionCharge, RESERVE_MINUTES};
use seerline::domain::value_objects::presence::StatusUpdateModel;
use seerline::domain::value_objects::sessions::{
    AcceptOutcome, MessageModel, RequestSessionModel, SessionDetailModel, SessionModel,
    SessionSummaryModel, SessionWithTokenModel,
};
use seerline::realtime::channels::{
    allocate_rtc_channel, notifications_channel, session_channel, READERS_STATUS_CHANNEL,
};
use seerline::realtime::event_bus::EventPublisher;
use seerline::realtime::tokens::{RtcRole, TokenBroker};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::usecases::Subject;

/// The session state machine. One instance serves every session; the
/// per-session serialisation lives in the row locks the repositories
/// take, not in memory.
pub struct SessionUseCase<S, R, L, N, E>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    session_repo: Arc<S>,
    reader_repo: Arc<R>,
    ledger_repo: Arc<L>,
    notification_repo: Arc<N>,
    event_bus: Arc<E>,
    token_broker: Arc<TokenBroker>,
    platform_fee_rate: Decimal,
}

impl<S, R, L, N, E> SessionUseCase<S, R, L, N, E>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_repo: Arc<S>,
        reader_repo: Arc<R>,
        ledger_repo: Arc<L>,
        notification_repo: Arc<N>,
        event_bus: Arc<E>,
        token_broker: Arc<TokenBroker>,
        platform_fee_rate: Decimal,
    ) -> Self {
        Self {
            session_repo,
            reader_repo,
            ledger_repo,
            notification_repo,
            event_bus,
            token_broker,
            platform_fee_rate,
        }
    }

    pub async fn request(
        &self,
        subject: Subject,
        model: RequestSessionModel,
    ) -> CoreResult<SessionModel> {
        if subject.role != Role::Client {
            return Err(CoreError::NotAuthorized);
        }

        let reader = with_db_retry("sessions: load reader profile", || {
            self.reader_repo.find_by_user_id(model.reader_id)
        })
        .await?
        .ok_or(CoreError::ReaderUnavailable)?;

        if ReaderStatus::from_str(&reader.status) != Some(ReaderStatus::Online) {
            return Err(CoreError::ReaderUnavailable);
        }

        let rate_per_min = match model.session_type {
            SessionType::Chat => reader.chat_rate,
            SessionType::Voice => reader.voice_rate,
            SessionType::Video => reader.video_rate,
        };

        let balance = with_db_retry("sessions: read balance", || {
            self.ledger_repo.balance_of(subject.user_id)
        })
        .await?
        .ok_or(CoreError::NotFound("client profile"))?;

        if balance < rate_per_min * Decimal::from(RESERVE_MINUTES) {
            return Err(CoreError::InsufficientBalance);
        }

        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let new_session = NewSessionEntity {
            id: session_id,
            client_id: subject.user_id,
            reader_id: model.reader_id,
            session_type: model.session_type.to_string(),
            status: SessionStatus::Pending.to_string(),
            rate_per_min,
            rtc_channel: allocate_rtc_channel(session_id),
            pubsub_channel: session_channel(session_id),
            metadata: json!({}),
            created_at: now,
            updated_at: now,
        };
        let session = with_db_retry("sessions: create session", || {
            self.session_repo.create(new_session.clone())
        })
        .await?;

        info!(
            session_id = %session.id,
            client_id = %subject.user_id,
            reader_id = %model.reader_id,
            session_type = %model.session_type,
            "sessions: request created"
        );

        self.notify(
            session.reader_id,
            "reading_request",
            "New reading request",
            &format!("A client requested a {} reading", model.session_type),
            json!({
                "session_id": session.id,
                "session_type": model.session_type,
                "rate_per_min": rate_per_min,
            }),
        )
        .await;

        Ok(SessionModel::from(session))
    }

    pub async fn accept(
        &self,
        subject: Subject,
        session_id: Uuid,
    ) -> CoreResult<SessionWithTokenModel> {
        let session = with_db_retry("sessions: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        if session.reader_id != subject.user_id {
            return Err(CoreError::NotAuthorized);
        }

        let now = Utc::now();
        let outcome = with_db_retry("sessions: accept session", || {
            self.session_repo.accept_pending(session_id, subject.user_id, now)
        })
        .await?;

        let session = match outcome {
            AcceptOutcome::Accepted(session) => {
                self.publish_status(session.reader_id, ReaderStatus::InSession, now)
                    .await;

                let client_token = self.token_broker.rtc_token(
                    session.client_id,
                    &session.rtc_channel,
                    RtcRole::Publisher,
                    now,
                )?;
                self.notify(
                    session.client_id,
                    "session_accepted",
                    "Reading accepted",
                    "Your reading request was accepted",
                    json!({
                        "session_id": session.id,
                        "rtc_token": client_token,
                        "pubsub_channel": session.pubsub_channel,
                    }),
                )
                .await;

                self.publish(
                    &session.pubsub_channel,
                    "session-started",
                    json!({ "session_id": session.id, "started_at": session.start_time }),
                )
                .await;

                session
            }
            // Re-accept of an already-active session: same row, fresh
            // token, no duplicated events.
            AcceptOutcome::AlreadyActive(session) => session,
            AcceptOutcome::LostRace(session) => {
                warn!(
                    session_id = %session.id,
                    reader_id = %session.reader_id,
                    "sessions: accept lost the race, request cancelled"
                );
                return Err(CoreError::ReaderUnavailable);
            }
            AcceptOutcome::NotPending(session) => {
                return Err(CoreError::InvalidState(format!(
                    "session is {}",
                    session.status
                )));
            }
            AcceptOutcome::NotFound => return Err(CoreError::NotFound("session")),
        };

        let reader_token = self.token_broker.rtc_token(
            session.reader_id,
            &session.rtc_channel,
            RtcRole::Publisher,
            now,
        )?;

        Ok(SessionWithTokenModel {
            session: SessionModel::from(session),
            rtc_token: reader_token,
        })
    }

    pub async fn decline(
        &self,
        subject: Subject,
        session_id: Uuid,
        reason: Option<String>,
    ) -> CoreResult<SessionModel> {
        let session = with_db_retry("sessions: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        if session.reader_id != subject.user_id {
            return Err(CoreError::NotAuthorized);
        }

        let reason = reason.unwrap_or_else(|| "declined".to_string());
        let cancelled = with_db_retry("sessions: cancel session", || {
            self.session_repo.cancel_pending(session_id, reason.clone())
        })
        .await?
        .ok_or_else(|| {
            CoreError::InvalidState(format!("session is {}", session.status))
        })?;

        self.notify(
            cancelled.client_id,
            "session_declined",
            "Reading declined",
            &format!("The reader declined your request: {}", reason),
            json!({ "session_id": cancelled.id }),
        )
        .await;

        Ok(SessionModel::from(cancelled))
    }

    pub async fn end(&self, subject: Subject, session_id: Uuid) -> CoreResult<SessionSummaryModel> {
        self.end_at(subject, session_id, Utc::now()).await
    }

    /// Duration is the wall-clock difference between accept and end; the
    /// server never meters elapsed time during the session.
    pub async fn end_at(
        &self,
        subject: Subject,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<SessionSummaryModel> {
        let session = with_db_retry("sessions: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        if subject.user_id != session.client_id && subject.user_id != session.reader_id {
            return Err(CoreError::NotAuthorized);
        }

        match SessionStatus::from_str(&session.status) {
            // Idempotent: return the stored result, no further debits.
            Some(SessionStatus::Completed) => return Ok(Self::stored_summary(session)),
            Some(SessionStatus::Active) => {}
            _ => {
                return Err(CoreError::InvalidState(format!(
                    "session is {}",
                    session.status
                )));
            }
        }

        let start_time = session
            .start_time
            .ok_or_else(|| CoreError::InvalidState("session has no start time".to_string()))?;
        let elapsed_ms = (now - start_time).num_milliseconds().max(0);
        let elapsed_seconds = (elapsed_ms + 999) / 1000;
        let charge = SessionCharge::compute(elapsed_seconds, session.rate_per_min, self.platform_fee_rate);

        let command = SettleSessionCommand {
            session_id: session.id,
            ended_by: subject.user_id,
            end_time: now,
            charge,
        };

        // Settling is idempotent, so the retry either completes the
        // write or observes the already-settled row.
        let outcome = with_db_retry("sessions: settle session", || {
            self.ledger_repo.settle_session(command.clone())
        })
        .await?;

        let result = match outcome {
            SettlementOutcome::Settled(result) => result,
            SettlementOutcome::AlreadySettled(session) => {
                return Ok(Self::stored_summary(session));
            }
            SettlementOutcome::InvalidState(status) => {
                return Err(CoreError::InvalidState(format!("session is {}", status)));
            }
        };

        info!(
            session_id = %result.session.id,
            charged = %result.charged,
            partial_settlement = result.partial_settlement,
            "sessions: settled"
        );

        self.publish_status(result.session.reader_id, ReaderStatus::Online, now)
            .await;
        self.publish(
            &result.session.pubsub_channel,
            "session-ended",
            json!({
                "session_id": result.session.id,
                "duration_seconds": result.session.duration_seconds,
                "total_amount": result.charged,
            }),
        )
        .await;

        self.notify(
            result.session.client_id,
            "session_summary",
            "Reading complete",
            &format!("You were charged {} for your reading", result.charged),
            json!({ "session_id": result.session.id, "charged": result.charged }),
        )
        .await;
        self.notify(
            result.session.reader_id,
            "session_summary",
            "Reading complete",
            &format!("You earned {} from your reading", result.reader_earnings),
            json!({
                "session_id": result.session.id,
                "reader_earnings": result.reader_earnings,
            }),
        )
        .await;

        Ok(SessionSummaryModel {
            charged: result.charged,
            partial_settlement: result.partial_settlement,
            session: SessionModel::from(result.session),
        })
    }

    pub async fn get(&self, subject: Subject, session_id: Uuid) -> CoreResult<SessionDetailModel> {
        let session = with_db_retry("sessions: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        let is_party =
            subject.user_id == session.client_id || subject.user_id == session.reader_id;
        if !is_party && subject.role != Role::Admin {
            return Err(CoreError::NotAuthorized);
        }

        let rtc_token = if is_party
            && SessionStatus::from_str(&session.status) == Some(SessionStatus::Active)
        {
            Some(self.token_broker.rtc_token(
                subject.user_id,
                &session.rtc_channel,
                RtcRole::Publisher,
                Utc::now(),
            )?)
        } else {
            None
        };

        Ok(SessionDetailModel {
            session: SessionModel::from(session),
            rtc_token,
        })
    }

    pub async fn send_message(
        &self,
        subject: Subject,
        session_id: Uuid,
        body: String,
    ) -> CoreResult<MessageModel> {
        if body.trim().is_empty() {
            return Err(CoreError::Validation("message body is empty".to_string()));
        }

        let session = with_db_retry("sessions: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        if subject.user_id != session.client_id && subject.user_id != session.reader_id {
            return Err(CoreError::NotAuthorized);
        }

        if SessionStatus::from_str(&session.status) != Some(SessionStatus::Active) {
            return Err(CoreError::InvalidState(format!(
                "session is {}",
                session.status
            )));
        }

        let new_message = NewMessageEntity {
            id: Uuid::new_v4(),
            session_id: session.id,
            sender_id: subject.user_id,
            body,
            created_at: Utc::now(),
        };
        let message = with_db_retry("sessions: append message", || {
            self.session_repo.append_message(new_message.clone())
        })
        .await?;

        self.publish(
            &session.pubsub_channel,
            "message",
            json!({
                "message_id": message.id,
                "sender_id": message.sender_id,
                "body": message.body,
                "created_at": message.created_at,
            }),
        )
        .await;

        Ok(MessageModel::from(message))
    }

    fn stored_summary(session: SessionEntity) -> SessionSummaryModel {
        let charged = session.total_amount.unwrap_or(Decimal::ZERO);
        let partial_settlement = session
            .metadata
            .get("partial_settlement")
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        SessionSummaryModel {
            charged,
            partial_settlement,
            session: SessionModel::from(session),
        }
    }

    /// Best-effort fan-out. The durable state change has already landed;
    /// a failed publish is logged and left to the REST poll fallback.
    async fn publish(&self, channel: &str, event: &str, data: serde_json::Value) {
        if let Err(err) = self.event_bus.publish(channel, event, data).await {
            warn!(%channel, %event, "sessions: event publish failed: {err}");
        }
    }

    async fn publish_status(&self, reader_id: Uuid, status: ReaderStatus, now: DateTime<Utc>) {
        let update = StatusUpdateModel {
            reader_id,
            status,
            timestamp: now,
        };
        self.publish(
            READERS_STATUS_CHANNEL,
            "status-update",
            serde_json::to_value(update).unwrap_or_default(),
        )
        .await;
    }

    /// Durable notification row first, transient publish second, so a
    /// late-joining subscriber can always rehydrate over REST.
    async fn notify(
        &self,
        user_id: Uuid,
        notification_type: &str,
        title: &str,
        body: &str,
        metadata: serde_json::Value,
    ) {
        let row = NewNotificationEntity {
            id: Uuid::new_v4(),
            user_id,
            notification_type: notification_type.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            metadata: metadata.clone(),
            is_read: false,
            created_at: Utc::now(),
        };

        if let Err(err) = with_db_retry("sessions: insert notification", || {
            self.notification_repo.insert(row.clone())
        })
        .await
        {
            warn!(%user_id, notification_type, "sessions: notification row insert failed: {err}");
        }

        self.publish(
            &notifications_channel(user_id),
            "notification",
            json!({ "type": notification_type, "title": title, "body": body, "metadata": metadata }),
        )
        .await;
    }
}

#[cfg(test)]
mod tests;

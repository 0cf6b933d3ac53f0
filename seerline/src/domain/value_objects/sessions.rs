use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::messages::MessageEntity;
use crate::domain::entities::sessions::SessionEntity;
use crate::domain::value_objects::enums::{
    session_statuses::SessionStatus, session_types::SessionType,
};
use crate::realtime::tokens::RtcTokenBundle;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestSessionModel {
    pub reader_id: Uuid,
    pub session_type: SessionType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclineSessionModel {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageModel {
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionModel {
    pub id: Uuid,
    pub client_id: Uuid,
    pub reader_id: Uuid,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub rate_per_min: Decimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub total_amount: Option<Decimal>,
    pub platform_fee: Option<Decimal>,
    pub reader_earnings: Option<Decimal>,
    pub rtc_channel: String,
    pub pubsub_channel: String,
    pub created_at: DateTime<Utc>,
}

impl From<SessionEntity> for SessionModel {
    fn from(entity: SessionEntity) -> Self {
        Self {
            id: entity.id,
            client_id: entity.client_id,
            reader_id: entity.reader_id,
            session_type: SessionType::from_str(&entity.session_type)
                .unwrap_or(SessionType::Chat),
            status: SessionStatus::from_str(&entity.status).unwrap_or(SessionStatus::Pending),
            rate_per_min: entity.rate_per_min,
            start_time: entity.start_time,
            end_time: entity.end_time,
            duration_seconds: entity.duration_seconds,
            total_amount: entity.total_amount,
            platform_fee: entity.platform_fee,
            reader_earnings: entity.reader_earnings,
            rtc_channel: entity.rtc_channel,
            pubsub_channel: entity.pubsub_channel,
            created_at: entity.created_at,
        }
    }
}

/// Session plus the caller's freshly minted RTC credential. Returned to
/// the reader on accept and to either active party on read.
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithTokenModel {
    #[serde(flatten)]
    pub session: SessionModel,
    pub rtc_token: RtcTokenBundle,
}

/// Read view of a session; the token is present only when the caller is
/// a party and the session is active.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetailModel {
    #[serde(flatten)]
    pub session: SessionModel,
    pub rtc_token: Option<RtcTokenBundle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageModel {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<MessageEntity> for MessageModel {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            session_id: entity.session_id,
            sender_id: entity.sender_id,
            body: entity.body,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummaryModel {
    #[serde(flatten)]
    pub session: SessionModel,
    pub charged: Decimal,
    pub partial_settlement: bool,
}

/// Result of the locked pending -> active transition. `LostRace` carries
/// the row already cancelled with reason `reader_already_in_session`.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted(SessionEntity),
    AlreadyActive(SessionEntity),
    LostRace(SessionEntity),
    NotPending(SessionEntity),
    NotFound,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct SetStatusModel {
    pub status: ReaderStatus,
}

/// Payload published on the shared `readers:status` channel.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateModel {
    pub reader_id: Uuid,
    pub status: ReaderStatus,
    pub timestamp: DateTime<Utc>,
}

/// Listing row for `GET /readers/online`; subscribers poll this to
/// reconcile after missed status events.
#[derive(Debug, Clone, Serialize)]
pub struct OnlineReaderModel {
    pub reader_id: Uuid,
    pub display_name: Option<String>,
    pub chat_rate: Decimal,
    pub voice_rate: Decimal,
    pub video_rate: Decimal,
    pub rating: Decimal,
    pub review_count: i32,
    pub total_readings: i32,
}

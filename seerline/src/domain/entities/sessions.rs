use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::postgres::schema::sessions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = sessions)]
pub struct SessionEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub reader_id: Uuid,
    pub session_type: String,
    pub status: String,
    /// Frozen from the reader's then-current rate at request time.
    pub rate_per_min: Decimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i32>,
    pub total_amount: Option<Decimal>,
    pub platform_fee: Option<Decimal>,
    pub reader_earnings: Option<Decimal>,
    pub rtc_channel: String,
    pub pubsub_channel: String,
    pub notes: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSessionEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub reader_id: Uuid,
    pub session_type: String,
    pub status: String,
    pub rate_per_min: Decimal,
    pub rtc_channel: String,
    pub pubsub_channel: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

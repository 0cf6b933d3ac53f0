use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::postgres::schema::reader_profiles;

/// Invariant across the payout pipeline:
/// `total_earned = pending_balance + total_paid_out + in-flight payouts`.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = reader_profiles, primary_key(user_id))]
pub struct ReaderProfileEntity {
    pub user_id: Uuid,
    pub chat_rate: Decimal,
    pub voice_rate: Decimal,
    pub video_rate: Decimal,
    pub is_available: bool,
    pub status: String,
    pub pending_balance: Decimal,
    pub total_earned: Decimal,
    pub total_paid_out: Decimal,
    pub rating: Decimal,
    pub review_count: i32,
    pub total_readings: i32,
    pub payout_account_ref: Option<String>,
    pub payout_account_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reader_profiles)]
pub struct NewReaderProfileEntity {
    pub user_id: Uuid,
    pub chat_rate: Decimal,
    pub voice_rate: Decimal,
    pub video_rate: Decimal,
    pub is_available: bool,
    pub status: String,
    pub pending_balance: Decimal,
    pub total_earned: Decimal,
    pub total_paid_out: Decimal,
    pub rating: Decimal,
    pub review_count: i32,
    pub total_readings: i32,
    pub payout_account_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

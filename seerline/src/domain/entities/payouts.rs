use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::postgres::schema::payouts;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payouts)]
pub struct PayoutEntity {
    pub id: Uuid,
    pub reader_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub external_transfer_ref: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payouts)]
pub struct NewPayoutEntity {
    pub id: Uuid,
    pub reader_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::postgres::schema::transactions;

/// Append-only journal row. Only `status` is ever updated after insert.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = transactions)]
pub struct TransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub external_ref: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transactions)]
pub struct NewTransactionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub external_ref: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

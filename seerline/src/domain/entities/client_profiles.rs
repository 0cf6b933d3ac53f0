use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::postgres::schema::client_profiles;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = client_profiles, primary_key(user_id))]
pub struct ClientProfileEntity {
    pub user_id: Uuid,
    pub balance: Decimal,
    pub total_spent: Decimal,
    pub auto_reload_enabled: bool,
    pub auto_reload_threshold: Option<Decimal>,
    pub auto_reload_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = client_profiles)]
pub struct NewClientProfileEntity {
    pub user_id: Uuid,
    pub balance: Decimal,
    pub total_spent: Decimal,
    pub auto_reload_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::postgres::schema::messages;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = messages)]
pub struct MessageEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

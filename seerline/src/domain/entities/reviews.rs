use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::postgres::schema::reviews;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = reviews)]
pub struct ReviewEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub reader_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reader_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewEntity {
    pub id: Uuid,
    pub session_id: Uuid,
    pub client_id: Uuid,
    pub reader_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

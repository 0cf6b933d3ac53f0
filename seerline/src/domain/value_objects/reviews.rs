use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::reviews::ReviewEntity;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReviewModel {
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondReviewModel {
    pub response: String,
}

/// Review row plus the reader's recomputed running average.
#[derive(Debug, Clone)]
pub struct ReviewAggregate {
    pub review: ReviewEntity,
    pub rating: rust_decimal::Decimal,
    pub review_count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewModel {
    pub id: Uuid,
    pub session_id: Uuid,
    pub reader_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub reader_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewEntity> for ReviewModel {
    fn from(entity: ReviewEntity) -> Self {
        Self {
            id: entity.id,
            session_id: entity.session_id,
            reader_id: entity.reader_id,
            rating: entity.rating,
            comment: entity.comment,
            reader_response: entity.reader_response,
            created_at: entity.created_at,
        }
    }
}

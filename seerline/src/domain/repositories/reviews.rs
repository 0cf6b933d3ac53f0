use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::reviews::{NewReviewEntity, ReviewEntity};
use crate::domain::value_objects::reviews::ReviewAggregate;

#[automock]
#[async_trait]
pub trait ReviewRepository {
    async fn find_by_session(&self, session_id: Uuid) -> Result<Option<ReviewEntity>>;

    /// Inserts the review and recomputes the reader's running average and
    /// count in the same transaction. The unique index on `session_id`
    /// backs the one-review-per-session invariant.
    async fn insert_and_recompute(
        &self,
        new_review_entity: NewReviewEntity,
    ) -> Result<ReviewAggregate>;

    /// Reader may edit only the response. None when no review exists for
    /// the session or it belongs to another reader.
    async fn set_response(
        &self,
        session_id: Uuid,
        reader_id: Uuid,
        response: String,
    ) -> Result<Option<ReviewEntity>>;
}

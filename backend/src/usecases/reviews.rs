use std::sync::Arc;

use chrono::Utc;
use seerline::domain::entities::notifications::NewNotificationEntity;
use seerline::domain::entities::reviews::NewReviewEntity;
use seerline::domain::error::{with_db_retry, CoreError, CoreResult};
use seerline::domain::repositories::{
    notifications::NotificationRepository, reviews::ReviewRepository, sessions::SessionRepository,
};
use seerline::domain::value_objects::enums::session_statuses::SessionStatus;
use seerline::domain::value_objects::reviews::{RespondReviewModel, ReviewModel, SubmitReviewModel};
use seerline::realtime::channels::notifications_channel;
use seerline::realtime::event_bus::EventPublisher;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::usecases::Subject;

pub struct ReviewUseCase<S, R, N, E>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReviewRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    session_repo: Arc<S>,
    review_repo: Arc<R>,
    notification_repo: Arc<N>,
    event_bus: Arc<E>,
}

impl<S, R, N, E> ReviewUseCase<S, R, N, E>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReviewRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    pub fn new(
        session_repo: Arc<S>,
        review_repo: Arc<R>,
        notification_repo: Arc<N>,
        event_bus: Arc<E>,
    ) -> Self {
        Self {
            session_repo,
            review_repo,
            notification_repo,
            event_bus,
        }
    }

    pub async fn submit(
        &self,
        subject: Subject,
        session_id: Uuid,
        model: SubmitReviewModel,
    ) -> CoreResult<ReviewModel> {
        if !(1..=5).contains(&model.rating) {
            return Err(CoreError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let session = with_db_retry("reviews: load session", || {
            self.session_repo.find_by_id(session_id)
        })
        .await?
        .ok_or(CoreError::NotFound("session"))?;

        if session.client_id != subject.user_id {
            return Err(CoreError::NotAuthorized);
        }

        if SessionStatus::from_str(&session.status) != Some(SessionStatus::Completed) {
            return Err(CoreError::InvalidState(
                "only completed sessions can be reviewed".to_string(),
            ));
        }

        let existing = with_db_retry("reviews: check existing review", || {
            self.review_repo.find_by_session(session_id)
        })
        .await?;
        if existing.is_some() {
            return Err(CoreError::AlreadyReviewed);
        }

        let now = Utc::now();
        let new_review = NewReviewEntity {
            id: Uuid::new_v4(),
            session_id,
            client_id: session.client_id,
            reader_id: session.reader_id,
            rating: model.rating,
            comment: model.comment,
            created_at: now,
            updated_at: now,
        };
        let aggregate = with_db_retry("reviews: insert review", || {
            self.review_repo.insert_and_recompute(new_review.clone())
        })
        .await?;

        info!(
            %session_id,
            reader_id = %session.reader_id,
            rating = model.rating,
            new_average = %aggregate.rating,
            "reviews: submitted"
        );

        let row = NewNotificationEntity {
            id: Uuid::new_v4(),
            user_id: session.reader_id,
            notification_type: "new_review".to_string(),
            title: "New review".to_string(),
            body: format!("A client rated your reading {} out of 5", model.rating),
            metadata: json!({ "session_id": session_id, "rating": model.rating }),
            is_read: false,
            created_at: now,
        };
        if let Err(err) = with_db_retry("reviews: insert notification", || {
            self.notification_repo.insert(row.clone())
        })
        .await
        {
            warn!(%session_id, "reviews: notification row insert failed: {err}");
        }
        if let Err(err) = self
            .event_bus
            .publish(
                &notifications_channel(session.reader_id),
                "notification",
                json!({ "type": "new_review", "session_id": session_id, "rating": model.rating }),
            )
            .await
        {
            warn!(%session_id, "reviews: notification publish failed: {err}");
        }

        Ok(ReviewModel::from(aggregate.review))
    }

    pub async fn respond(
        &self,
        subject: Subject,
        session_id: Uuid,
        model: RespondReviewModel,
    ) -> CoreResult<ReviewModel> {
        let review = with_db_retry("reviews: write response", || {
            self.review_repo
                .set_response(session_id, subject.user_id, model.response.clone())
        })
        .await?
        .ok_or(CoreError::NotFound("review"))?;

        Ok(ReviewModel::from(review))
    }
}

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::{avg, count_star};
use diesel::{insert_into, prelude::*, update};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::reviews::{NewReviewEntity, ReviewEntity};
use crate::domain::repositories::reviews::ReviewRepository;
use crate::domain::value_objects::reviews::ReviewAggregate;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{reader_profiles, reviews};

pub struct ReviewPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReviewPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReviewRepository for ReviewPostgres {
    async fn find_by_session(&self, session_id: Uuid) -> Result<Option<ReviewEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let review = reviews::table
            .filter(reviews::session_id.eq(session_id))
            .first::<ReviewEntity>(&mut conn)
            .optional()?;

        Ok(review)
    }

    async fn insert_and_recompute(
        &self,
        new_review_entity: NewReviewEntity,
    ) -> Result<ReviewAggregate> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let aggregate = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let review = insert_into(reviews::table)
                .values(&new_review_entity)
                .get_result::<ReviewEntity>(conn)?;

            let (rating, review_count) = reviews::table
                .filter(reviews::reader_id.eq(review.reader_id))
                .select((avg(reviews::rating), count_star()))
                .first::<(Option<Decimal>, i64)>(conn)?;

            let rating = rating
                .unwrap_or(Decimal::ZERO)
                .round_dp(2);
            let review_count = review_count as i32;

            update(
                reader_profiles::table
                    .filter(reader_profiles::user_id.eq(review.reader_id)),
            )
            .set((
                reader_profiles::rating.eq(rating),
                reader_profiles::review_count.eq(review_count),
                reader_profiles::updated_at.eq(now),
            ))
            .execute(conn)?;

            Ok(ReviewAggregate {
                review,
                rating,
                review_count,
            })
        })?;

        Ok(aggregate)
    }

    async fn set_response(
        &self,
        session_id: Uuid,
        reader_id: Uuid,
        response: String,
    ) -> Result<Option<ReviewEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let review = update(
            reviews::table
                .filter(reviews::session_id.eq(session_id))
                .filter(reviews::reader_id.eq(reader_id)),
        )
        .set((
            reviews::reader_response.eq(Some(response)),
            reviews::updated_at.eq(now),
        ))
        .get_result::<ReviewEntity>(&mut conn)
        .optional()?;

        Ok(review)
    }
}

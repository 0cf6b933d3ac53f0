use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{prelude::*, update};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::reader_profiles::ReaderProfileEntity;
use crate::domain::repositories::reader_profiles::ReaderProfileRepository;
use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;
use crate::domain::value_objects::presence::OnlineReaderModel;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{reader_profiles, users};

pub struct ReaderProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ReaderProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ReaderProfileRepository for ReaderProfilePostgres {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<ReaderProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = reader_profiles::table
            .find(user_id)
            .first::<ReaderProfileEntity>(&mut conn)
            .optional()?;

        Ok(profile)
    }

    async fn list_online(&self) -> Result<Vec<OnlineReaderModel>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = reader_profiles::table
            .inner_join(users::table)
            .filter(reader_profiles::status.eq(ReaderStatus::Online.to_string()))
            .filter(reader_profiles::is_available.eq(true))
            .select((
                reader_profiles::user_id,
                users::display_name,
                reader_profiles::chat_rate,
                reader_profiles::voice_rate,
                reader_profiles::video_rate,
                reader_profiles::rating,
                reader_profiles::review_count,
                reader_profiles::total_readings,
            ))
            .load::<(
                Uuid,
                Option<String>,
                Decimal,
                Decimal,
                Decimal,
                Decimal,
                i32,
                i32,
            )>(&mut conn)?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    reader_id,
                    display_name,
                    chat_rate,
                    voice_rate,
                    video_rate,
                    rating,
                    review_count,
                    total_readings,
                )| OnlineReaderModel {
                    reader_id,
                    display_name,
                    chat_rate,
                    voice_rate,
                    video_rate,
                    rating,
                    review_count,
                    total_readings,
                },
            )
            .collect())
    }

    async fn set_status_if(
        &self,
        reader_id: Uuid,
        expected: Vec<ReaderStatus>,
        next: ReaderStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let flipped = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let current = reader_profiles::table
                .find(reader_id)
                .select(reader_profiles::status)
                .for_update()
                .first::<String>(conn)
                .optional()?;

            let Some(current) = current else {
                return Ok(false);
            };

            let matches_expected = ReaderStatus::from_str(&current)
                .map(|status| expected.contains(&status))
                .unwrap_or(false);
            if !matches_expected {
                return Ok(false);
            }

            update(reader_profiles::table.filter(reader_profiles::user_id.eq(reader_id)))
                .set((
                    reader_profiles::status.eq(next.to_string()),
                    reader_profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

            Ok(true)
        })?;

        Ok(flipped)
    }
}

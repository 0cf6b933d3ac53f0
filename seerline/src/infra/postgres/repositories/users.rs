use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::client_profiles::NewClientProfileEntity;
use crate::domain::entities::reader_profiles::NewReaderProfileEntity;
use crate::domain::entities::users::{SyncUserEntity, UserEntity};
use crate::domain::repositories::users::UserRepository;
use crate::domain::value_objects::enums::payout_account_statuses::PayoutAccountStatus;
use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;
use crate::domain::value_objects::enums::roles::Role;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{client_profiles, reader_profiles, users};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .find(user_id)
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn sync_identity(&self, sync_user_entity: SyncUserEntity) -> Result<UserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let user = conn.transaction::<_, anyhow::Error, _>(|conn| {
            let user = insert_into(users::table)
                .values(&sync_user_entity)
                .on_conflict(users::id)
                .do_update()
                .set((
                    users::display_name.eq(&sync_user_entity.display_name),
                    users::updated_at.eq(now),
                ))
                .get_result::<UserEntity>(conn)?;

            match Role::from_str(&user.role) {
                Some(Role::Reader) => {
                    insert_into(reader_profiles::table)
                        .values(&NewReaderProfileEntity {
                            user_id: user.id,
                            chat_rate: Decimal::ZERO,
                            voice_rate: Decimal::ZERO,
                            video_rate: Decimal::ZERO,
                            is_available: false,
                            status: ReaderStatus::Offline.to_string(),
                            pending_balance: Decimal::ZERO,
                            total_earned: Decimal::ZERO,
                            total_paid_out: Decimal::ZERO,
                            rating: Decimal::ZERO,
                            review_count: 0,
                            total_readings: 0,
                            payout_account_status: PayoutAccountStatus::Pending.to_string(),
                            created_at: now,
                            updated_at: now,
                        })
                        .on_conflict(reader_profiles::user_id)
                        .do_nothing()
                        .execute(conn)?;
                }
                _ => {
                    insert_into(client_profiles::table)
                        .values(&NewClientProfileEntity {
                            user_id: user.id,
                            balance: Decimal::ZERO,
                            total_spent: Decimal::ZERO,
                            auto_reload_enabled: false,
                            created_at: now,
                            updated_at: now,
                        })
                        .on_conflict(client_profiles::user_id)
                        .do_nothing()
                        .execute(conn)?;
                }
            }

            Ok(user)
        })?;

        Ok(user)
    }

    async fn find_admins(&self) -> Result<Vec<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let admins = users::table
            .filter(users::role.eq(Role::Admin.to_string()))
            .load::<UserEntity>(&mut conn)?;

        Ok(admins)
    }
}

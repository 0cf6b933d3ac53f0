use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{insert_into, prelude::*, update};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::payouts::{NewPayoutEntity, PayoutEntity};
use crate::domain::entities::reader_profiles::ReaderProfileEntity;
use crate::domain::repositories::payouts::PayoutRepository;
use crate::domain::value_objects::enums::payout_account_statuses::PayoutAccountStatus;
use crate::domain::value_objects::enums::payout_statuses::PayoutStatus;
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{payouts, reader_profiles};

pub struct PayoutPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PayoutPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PayoutRepository for PayoutPostgres {
    async fn eligible_readers(&self, min_payout: Decimal) -> Result<Vec<ReaderProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let readers = reader_profiles::table
            .filter(reader_profiles::pending_balance.ge(min_payout))
            .filter(
                reader_profiles::payout_account_status
                    .eq(PayoutAccountStatus::Active.to_string()),
            )
            .filter(reader_profiles::payout_account_ref.is_not_null())
            .load::<ReaderProfileEntity>(&mut conn)?;

        Ok(readers)
    }

    async fn create_processing(&self, reader_id: Uuid, amount: Decimal) -> Result<PayoutEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let payout = insert_into(payouts::table)
            .values(&NewPayoutEntity {
                id: Uuid::new_v4(),
                reader_id,
                amount,
                status: PayoutStatus::Processing.to_string(),
                created_at: now,
                updated_at: now,
            })
            .get_result::<PayoutEntity>(&mut conn)?;

        Ok(payout)
    }

    async fn mark_completed(&self, payout_id: Uuid, transfer_ref: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payouts::table.filter(payouts::id.eq(payout_id)))
            .set((
                payouts::status.eq(PayoutStatus::Completed.to_string()),
                payouts::external_transfer_ref.eq(Some(transfer_ref)),
                payouts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_failed(&self, payout_id: Uuid, error: String) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(payouts::table.filter(payouts::id.eq(payout_id)))
            .set((
                payouts::status.eq(PayoutStatus::Failed.to_string()),
                payouts::error.eq(Some(error)),
                payouts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn sweep_stale_processing(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PayoutEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let swept = update(
            payouts::table
                .filter(payouts::status.eq(PayoutStatus::Processing.to_string()))
                .filter(payouts::external_transfer_ref.is_null())
                .filter(payouts::created_at.lt(cutoff)),
        )
        .set((
            payouts::status.eq(PayoutStatus::Failed.to_string()),
            payouts::error.eq(Some("stale processing row swept before new run".to_string())),
            payouts::updated_at.eq(Utc::now()),
        ))
        .get_results::<PayoutEntity>(&mut conn)?;

        Ok(swept)
    }
}

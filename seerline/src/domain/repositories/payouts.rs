use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::payouts::PayoutEntity;
use crate::domain::entities::reader_profiles::ReaderProfileEntity;

#[automock]
#[async_trait]
pub trait PayoutRepository {
    /// Readers with `pending_balance >= min_payout` and an active external
    /// account.
    async fn eligible_readers(&self, min_payout: Decimal) -> Result<Vec<ReaderProfileEntity>>;

    async fn create_processing(&self, reader_id: Uuid, amount: Decimal) -> Result<PayoutEntity>;

    async fn mark_completed(&self, payout_id: Uuid, transfer_ref: String) -> Result<()>;

    async fn mark_failed(&self, payout_id: Uuid, error: String) -> Result<()>;

    /// Rows stuck in `processing` with no transfer reference older than
    /// the retry horizon are failed before a new run begins, which keeps
    /// the scheduler idempotent across restarts.
    async fn sweep_stale_processing(&self, cutoff: DateTime<Utc>) -> Result<Vec<PayoutEntity>>;
}

use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use seerline::domain::entities::notifications::NewNotificationEntity;
use seerline::domain::entities::reader_profiles::ReaderProfileEntity;
use seerline::domain::error::with_db_retry;
use seerline::domain::repositories::{
    ledger::LedgerRepository, notifications::NotificationRepository, payouts::PayoutRepository,
    users::UserRepository,
};
use seerline::payments::stripe_client::StripeClient;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A `processing` row without a transfer reference older than this is
/// failed before a new run begins, keeping the run idempotent across
/// restarts.
pub const STALE_PROCESSING_HORIZON_HOURS: i64 = 1;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransferGateway: Send + Sync {
    async fn create_transfer(
        &self,
        amount: Decimal,
        destination_account: &str,
        reader_id: Uuid,
    ) -> AnyResult<String>;
}

#[async_trait]
impl TransferGateway for StripeClient {
    async fn create_transfer(
        &self,
        amount: Decimal,
        destination_account: &str,
        reader_id: Uuid,
    ) -> AnyResult<String> {
        let transfer = self
            .create_transfer(amount, destination_account, reader_id)
            .await?;
        Ok(transfer.id)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PayoutRunReport {
    pub swept: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Drains eligible reader pending balances to the payment processor.
pub struct PayoutRunUseCase {
    payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
    ledger_repo: Arc<dyn LedgerRepository + Send + Sync>,
    notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    gateway: Arc<dyn TransferGateway>,
    min_payout: Decimal,
}

impl PayoutRunUseCase {
    pub fn new(
        payout_repo: Arc<dyn PayoutRepository + Send + Sync>,
        ledger_repo: Arc<dyn LedgerRepository + Send + Sync>,
        notification_repo: Arc<dyn NotificationRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        gateway: Arc<dyn TransferGateway>,
        min_payout: Decimal,
    ) -> Self {
        Self {
            payout_repo,
            ledger_repo,
            notification_repo,
            user_repo,
            gateway,
            min_payout,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> AnyResult<PayoutRunReport> {
        let mut report = PayoutRunReport::default();

        let cutoff = now - Duration::hours(STALE_PROCESSING_HORIZON_HOURS);
        let swept = with_db_retry("payouts: sweep stale processing rows", || {
            self.payout_repo.sweep_stale_processing(cutoff)
        })
        .await?;
        for payout in &swept {
            warn!(payout_id = %payout.id, reader_id = %payout.reader_id, "payouts: swept stale processing row");
        }
        report.swept = swept.len();

        let readers = with_db_retry("payouts: select eligible readers", || {
            self.payout_repo.eligible_readers(self.min_payout)
        })
        .await?;
        info!(eligible = readers.len(), "payouts: run starting");

        // One reader failing must not block the rest of the run.
        for reader in readers {
            match self.process_reader(&reader).await {
                Ok(()) => report.processed += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(reader_id = %reader.user_id, "payouts: reader payout failed: {err}");
                }
            }
        }

        info!(
            swept = report.swept,
            processed = report.processed,
            failed = report.failed,
            "payouts: run finished"
        );

        Ok(report)
    }

    async fn process_reader(&self, reader: &ReaderProfileEntity) -> AnyResult<()> {
        let account = reader
            .payout_account_ref
            .as_deref()
            .context("eligible reader has no payout account reference")?;
        let amount = reader.pending_balance;

        let payout = with_db_retry("payouts: create payout row", || {
            self.payout_repo.create_processing(reader.user_id, amount)
        })
        .await?;

        match self
            .gateway
            .create_transfer(amount, account, reader.user_id)
            .await
        {
            Ok(transfer_ref) => {
                with_db_retry("payouts: record payout", || {
                    self.ledger_repo
                        .record_payout(reader.user_id, amount, transfer_ref.clone())
                })
                .await?;
                with_db_retry("payouts: complete payout row", || {
                    self.payout_repo
                        .mark_completed(payout.id, transfer_ref.clone())
                })
                .await?;
                info!(reader_id = %reader.user_id, %amount, "payouts: transfer completed");
                Ok(())
            }
            Err(err) => {
                with_db_retry("payouts: fail payout row", || {
                    self.payout_repo.mark_failed(payout.id, err.to_string())
                })
                .await?;
                self.notify_admins(reader.user_id, amount, &err.to_string())
                    .await;
                Err(err)
            }
        }
    }

    async fn notify_admins(&self, reader_id: Uuid, amount: Decimal, error: &str) {
        let admins = match with_db_retry("payouts: load admins", || self.user_repo.find_admins())
            .await
        {
            Ok(admins) => admins,
            Err(err) => {
                warn!("payouts: could not load admins for failure notification: {err}");
                return;
            }
        };

        for admin in admins {
            let row = NewNotificationEntity {
                id: Uuid::new_v4(),
                user_id: admin.id,
                notification_type: "payout_failed".to_string(),
                title: "Reader payout failed".to_string(),
                body: format!("Transfer of {} for reader {} failed", amount, reader_id),
                metadata: json!({ "reader_id": reader_id, "amount": amount, "error": error }),
                is_read: false,
                created_at: Utc::now(),
            };
            if let Err(err) = with_db_retry("payouts: insert admin notification", || {
                self.notification_repo.insert(row.clone())
            })
            .await
            {
                warn!(admin_id = %admin.id, "payouts: admin notification insert failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests;

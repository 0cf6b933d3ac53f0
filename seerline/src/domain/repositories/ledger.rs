use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::transactions::TransactionEntity;
use crate::domain::value_objects::ledger::{RefundOutcome, SettleSessionCommand, SettlementOutcome};

/// Single source of truth for monetary movement. Every state-changing
/// method runs inside a serializable transaction that locks the involved
/// profile rows in ascending identifier order.
#[automock]
#[async_trait]
pub trait LedgerRepository {
    async fn balance_of(&self, user_id: Uuid) -> Result<Option<Decimal>>;

    /// Credits the client balance and appends a completed `deposit` row.
    /// Idempotent by `external_ref`: a repeat returns the original row
    /// without moving money again.
    async fn deposit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        external_ref: String,
    ) -> Result<TransactionEntity>;

    /// Caps the debit at the live balance, scales the split pro-rata,
    /// journals both legs, finalises the session row and releases the
    /// reader's presence, all in one transaction.
    async fn settle_session(&self, command: SettleSessionCommand) -> Result<SettlementOutcome>;

    async fn record_payout(
        &self,
        reader_id: Uuid,
        amount: Decimal,
        external_ref: String,
    ) -> Result<TransactionEntity>;

    /// Admin-only. Marks the original row refunded, appends a `refund`
    /// row, and re-credits the client for deposits and reading payments.
    async fn refund(&self, transaction_id: Uuid, reason: String) -> Result<RefundOutcome>;
}

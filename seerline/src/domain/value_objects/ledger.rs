use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{sessions::SessionEntity, transactions::TransactionEntity};
use crate::domain::value_objects::money::SessionCharge;

#[derive(Debug, Clone, Deserialize)]
pub struct AddFundsModel {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositIntentModel {
    pub client_secret: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundModel {
    pub transaction_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionModel {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub transaction_type: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionEntity> for TransactionModel {
    fn from(entity: TransactionEntity) -> Self {
        Self {
            id: entity.id,
            session_id: entity.session_id,
            transaction_type: entity.transaction_type,
            amount: entity.amount,
            fee: entity.fee,
            net_amount: entity.net_amount,
            status: entity.status,
            created_at: entity.created_at,
        }
    }
}

/// Everything the ledger needs to settle one ended session in a single
/// serializable transaction. Amounts are the orchestrator's wall-clock
/// figures; the ledger caps them against the live balance.
#[derive(Debug, Clone)]
pub struct SettleSessionCommand {
    pub session_id: Uuid,
    pub ended_by: Uuid,
    pub end_time: DateTime<Utc>,
    pub charge: SessionCharge,
}

#[derive(Debug, Clone)]
pub struct SettlementResult {
    pub session: SessionEntity,
    pub charged: Decimal,
    pub platform_fee: Decimal,
    pub reader_earnings: Decimal,
    pub partial_settlement: bool,
}

/// `AlreadySettled` makes `end` idempotent: a concurrent or repeated end
/// observes the completed row instead of double-debiting.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Settled(SettlementResult),
    AlreadySettled(SessionEntity),
    InvalidState(String),
}

#[derive(Debug, Clone)]
pub enum RefundOutcome {
    Refunded(TransactionEntity),
    AlreadyRefunded,
    NotFound,
}

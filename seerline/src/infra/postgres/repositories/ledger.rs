use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*, update};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::sessions::SessionEntity;
use crate::domain::entities::transactions::{NewTransactionEntity, TransactionEntity};
use crate::domain::repositories::ledger::LedgerRepository;
use crate::domain::value_objects::enums::reader_statuses::ReaderStatus;
use crate::domain::value_objects::enums::session_statuses::SessionStatus;
use crate::domain::value_objects::enums::transaction_statuses::TransactionStatus;
use crate::domain::value_objects::enums::transaction_types::TransactionType;
use crate::domain::value_objects::ledger::{
    RefundOutcome, SettleSessionCommand, SettlementOutcome, SettlementResult,
};
use crate::infra::postgres::postgres_connection::PgPoolSquad;
use crate::infra::postgres::schema::{client_profiles, reader_profiles, sessions, transactions};

pub struct LedgerPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl LedgerPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }

    /// Locks the two profile rows in ascending user id order so that
    /// concurrent settlements touching the same pair cannot deadlock.
    /// Returns the client's live balance.
    fn lock_profiles(
        conn: &mut PgConnection,
        client_id: Uuid,
        reader_id: Uuid,
    ) -> Result<Decimal> {
        let lock_client = |conn: &mut PgConnection| -> Result<Decimal> {
            let balance = client_profiles::table
                .find(client_id)
                .select(client_profiles::balance)
                .for_update()
                .first::<Decimal>(conn)?;
            Ok(balance)
        };
        let lock_reader = |conn: &mut PgConnection| -> Result<()> {
            reader_profiles::table
                .find(reader_id)
                .select(reader_profiles::user_id)
                .for_update()
                .first::<Uuid>(conn)?;
            Ok(())
        };

        if client_id <= reader_id {
            let balance = lock_client(conn)?;
            lock_reader(conn)?;
            Ok(balance)
        } else {
            lock_reader(conn)?;
            lock_client(conn)
        }
    }
}

#[async_trait]
impl LedgerRepository for LedgerPostgres {
    async fn balance_of(&self, user_id: Uuid) -> Result<Option<Decimal>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let balance = client_profiles::table
            .find(user_id)
            .select(client_profiles::balance)
            .first::<Decimal>(&mut conn)
            .optional()?;

        Ok(balance)
    }

    async fn deposit(
        &self,
        user_id: Uuid,
        amount: Decimal,
        external_ref: String,
    ) -> Result<TransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let transaction = conn.build_transaction().serializable().run(
            |conn| -> Result<TransactionEntity> {
                // Idempotent by external reference: a webhook redelivery
                // returns the original row without crediting twice.
                if let Some(existing) = transactions::table
                    .filter(transactions::external_ref.eq(&external_ref))
                    .filter(
                        transactions::transaction_type.eq(TransactionType::Deposit.to_string()),
                    )
                    .first::<TransactionEntity>(conn)
                    .optional()?
                {
                    return Ok(existing);
                }

                let balance = client_profiles::table
                    .find(user_id)
                    .select(client_profiles::balance)
                    .for_update()
                    .first::<Decimal>(conn)?;

                update(client_profiles::table.filter(client_profiles::user_id.eq(user_id)))
                    .set((
                        client_profiles::balance.eq(balance + amount),
                        client_profiles::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                let row = insert_into(transactions::table)
                    .values(&NewTransactionEntity {
                        id: Uuid::new_v4(),
                        user_id,
                        session_id: None,
                        transaction_type: TransactionType::Deposit.to_string(),
                        amount,
                        fee: Decimal::ZERO,
                        net_amount: amount,
                        status: TransactionStatus::Completed.to_string(),
                        external_ref: Some(external_ref.clone()),
                        description: None,
                        created_at: now,
                    })
                    .get_result::<TransactionEntity>(conn)?;

                Ok(row)
            },
        )?;

        Ok(transaction)
    }

    async fn settle_session(&self, command: SettleSessionCommand) -> Result<SettlementOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let outcome = conn.build_transaction().serializable().run(
            |conn| -> Result<SettlementOutcome> {
                let session = sessions::table
                    .find(command.session_id)
                    .for_update()
                    .first::<SessionEntity>(conn)
                    .optional()?;

                let Some(session) = session else {
                    return Ok(SettlementOutcome::InvalidState("not_found".to_string()));
                };

                match SessionStatus::from_str(&session.status) {
                    Some(SessionStatus::Completed) => {
                        return Ok(SettlementOutcome::AlreadySettled(session));
                    }
                    Some(SessionStatus::Active) => {}
                    _ => return Ok(SettlementOutcome::InvalidState(session.status.clone())),
                }

                let balance =
                    Self::lock_profiles(conn, session.client_id, session.reader_id)?;

                let charge = &command.charge;
                let charged = balance.min(charge.total_amount);
                let partial_settlement = charged < charge.total_amount;
                let (platform_fee, reader_earnings) = if partial_settlement {
                    charge.scale_to_collected(charged)
                } else {
                    (charge.platform_fee, charge.reader_earnings)
                };

                update(
                    client_profiles::table
                        .filter(client_profiles::user_id.eq(session.client_id)),
                )
                .set((
                    client_profiles::balance.eq(client_profiles::balance - charged),
                    client_profiles::total_spent.eq(client_profiles::total_spent + charged),
                    client_profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

                // Earnings credit and presence release happen in the same
                // transaction as the debit, so the reader can never be
                // paid without the client being charged.
                update(
                    reader_profiles::table
                        .filter(reader_profiles::user_id.eq(session.reader_id)),
                )
                .set((
                    reader_profiles::pending_balance
                        .eq(reader_profiles::pending_balance + reader_earnings),
                    reader_profiles::total_earned
                        .eq(reader_profiles::total_earned + reader_earnings),
                    reader_profiles::total_readings.eq(reader_profiles::total_readings + 1),
                    reader_profiles::status.eq(ReaderStatus::Online.to_string()),
                    reader_profiles::updated_at.eq(now),
                ))
                .execute(conn)?;

                insert_into(transactions::table)
                    .values(&NewTransactionEntity {
                        id: Uuid::new_v4(),
                        user_id: session.client_id,
                        session_id: Some(session.id),
                        transaction_type: TransactionType::ReadingPayment.to_string(),
                        amount: charged,
                        fee: Decimal::ZERO,
                        net_amount: charged,
                        status: TransactionStatus::Completed.to_string(),
                        external_ref: None,
                        description: None,
                        created_at: now,
                    })
                    .execute(conn)?;

                insert_into(transactions::table)
                    .values(&NewTransactionEntity {
                        id: Uuid::new_v4(),
                        user_id: session.reader_id,
                        session_id: Some(session.id),
                        transaction_type: TransactionType::ReadingEarning.to_string(),
                        amount: charged,
                        fee: platform_fee,
                        net_amount: reader_earnings,
                        status: TransactionStatus::Completed.to_string(),
                        external_ref: None,
                        description: None,
                        created_at: now,
                    })
                    .execute(conn)?;

                let mut metadata = session.metadata.clone();
                if let Some(object) = metadata.as_object_mut() {
                    object.insert("ended_by".to_string(), command.ended_by.to_string().into());
                    if partial_settlement {
                        object.insert("partial_settlement".to_string(), true.into());
                        object.insert("disputed".to_string(), true.into());
                    }
                }

                let settled = update(sessions::table.filter(sessions::id.eq(session.id)))
                    .set((
                        sessions::status.eq(SessionStatus::Completed.to_string()),
                        sessions::end_time.eq(Some(command.end_time)),
                        sessions::duration_seconds
                            .eq(Some(charge.duration_seconds as i32)),
                        sessions::total_amount.eq(Some(charged)),
                        sessions::platform_fee.eq(Some(platform_fee)),
                        sessions::reader_earnings.eq(Some(reader_earnings)),
                        sessions::metadata.eq(metadata),
                        sessions::updated_at.eq(now),
                    ))
                    .get_result::<SessionEntity>(conn)?;

                Ok(SettlementOutcome::Settled(SettlementResult {
                    session: settled,
                    charged,
                    platform_fee,
                    reader_earnings,
                    partial_settlement,
                }))
            },
        )?;

        Ok(outcome)
    }

    async fn record_payout(
        &self,
        reader_id: Uuid,
        amount: Decimal,
        external_ref: String,
    ) -> Result<TransactionEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let transaction = conn.build_transaction().serializable().run(
            |conn| -> Result<TransactionEntity> {
                reader_profiles::table
                    .find(reader_id)
                    .select(reader_profiles::user_id)
                    .for_update()
                    .first::<Uuid>(conn)?;

                update(reader_profiles::table.filter(reader_profiles::user_id.eq(reader_id)))
                    .set((
                        reader_profiles::pending_balance
                            .eq(reader_profiles::pending_balance - amount),
                        reader_profiles::total_paid_out
                            .eq(reader_profiles::total_paid_out + amount),
                        reader_profiles::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                let row = insert_into(transactions::table)
                    .values(&NewTransactionEntity {
                        id: Uuid::new_v4(),
                        user_id: reader_id,
                        session_id: None,
                        transaction_type: TransactionType::Payout.to_string(),
                        amount,
                        fee: Decimal::ZERO,
                        net_amount: amount,
                        status: TransactionStatus::Completed.to_string(),
                        external_ref: Some(external_ref.clone()),
                        description: None,
                        created_at: now,
                    })
                    .get_result::<TransactionEntity>(conn)?;

                Ok(row)
            },
        )?;

        Ok(transaction)
    }

    async fn refund(&self, transaction_id: Uuid, reason: String) -> Result<RefundOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        let outcome = conn.build_transaction().serializable().run(
            |conn| -> Result<RefundOutcome> {
                let original = transactions::table
                    .find(transaction_id)
                    .for_update()
                    .first::<TransactionEntity>(conn)
                    .optional()?;

                let Some(original) = original else {
                    return Ok(RefundOutcome::NotFound);
                };

                if TransactionStatus::from_str(&original.status)
                    == Some(TransactionStatus::Refunded)
                {
                    return Ok(RefundOutcome::AlreadyRefunded);
                }

                update(transactions::table.filter(transactions::id.eq(original.id)))
                    .set(transactions::status.eq(TransactionStatus::Refunded.to_string()))
                    .execute(conn)?;

                let original_type = TransactionType::from_str(&original.transaction_type);
                if matches!(
                    original_type,
                    Some(TransactionType::Deposit) | Some(TransactionType::ReadingPayment)
                ) {
                    let balance = client_profiles::table
                        .find(original.user_id)
                        .select(client_profiles::balance)
                        .for_update()
                        .first::<Decimal>(conn)?;

                    update(
                        client_profiles::table
                            .filter(client_profiles::user_id.eq(original.user_id)),
                    )
                    .set((
                        client_profiles::balance.eq(balance + original.amount),
                        client_profiles::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                }

                let refund = insert_into(transactions::table)
                    .values(&NewTransactionEntity {
                        id: Uuid::new_v4(),
                        user_id: original.user_id,
                        session_id: original.session_id,
                        transaction_type: TransactionType::Refund.to_string(),
                        amount: original.amount,
                        fee: Decimal::ZERO,
                        net_amount: original.amount,
                        status: TransactionStatus::Completed.to_string(),
                        external_ref: original.external_ref.clone(),
                        description: Some(reason.clone()),
                        created_at: now,
                    })
                    .get_result::<TransactionEntity>(conn)?;

                Ok(RefundOutcome::Refunded(refund))
            },
        )?;

        Ok(outcome)
    }
}

use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use seerline::domain::entities::notifications::NewNotificationEntity;
use seerline::domain::error::{with_db_retry, CoreError, CoreResult};
use seerline::domain::repositories::{
    client_profiles::ClientProfileRepository, ledger::LedgerRepository,
    notifications::NotificationRepository, payouts::PayoutRepository,
    reader_profiles::ReaderProfileRepository,
};
use seerline::domain::value_objects::enums::payout_account_statuses::PayoutAccountStatus;
use seerline::domain::value_objects::enums::roles::Role;
use seerline::domain::value_objects::ledger::{
    AddFundsModel, DepositIntentModel, RefundModel, RefundOutcome, TransactionModel,
};
use seerline::payments::stripe_client::{StripeClient, StripeEvent, StripePaymentIntent};
use seerline::realtime::channels::notifications_channel;
use seerline::realtime::event_bus::EventPublisher;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::Subject;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        user_id: Uuid,
    ) -> AnyResult<StripePaymentIntent>;

    async fn create_transfer(
        &self,
        amount: Decimal,
        destination_account: &str,
        reader_id: Uuid,
    ) -> AnyResult<String>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: Decimal,
        user_id: Uuid,
    ) -> AnyResult<StripePaymentIntent> {
        self.create_payment_intent(amount, user_id).await
    }

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

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        self.verify_webhook_signature(payload, signature)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletModel {
    pub balance: Decimal,
    pub total_spent: Decimal,
}

pub struct PaymentsUseCase<C, R, L, P, N, G, E>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    client_repo: Arc<C>,
    reader_repo: Arc<R>,
    ledger_repo: Arc<L>,
    payout_repo: Arc<P>,
    notification_repo: Arc<N>,
    gateway: Arc<G>,
    event_bus: Arc<E>,
    min_payout: Decimal,
}

impl<C, R, L, P, N, G, E> PaymentsUseCase<C, R, L, P, N, G, E>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_repo: Arc<C>,
        reader_repo: Arc<R>,
        ledger_repo: Arc<L>,
        payout_repo: Arc<P>,
        notification_repo: Arc<N>,
        gateway: Arc<G>,
        event_bus: Arc<E>,
        min_payout: Decimal,
    ) -> Self {
        Self {
            client_repo,
            reader_repo,
            ledger_repo,
            payout_repo,
            notification_repo,
            gateway,
            event_bus,
            min_payout,
        }
    }

    pub async fn wallet(&self, subject: Subject) -> CoreResult<WalletModel> {
        let profile = with_db_retry("payments: load client profile", || {
            self.client_repo.find_by_user_id(subject.user_id)
        })
        .await?
        .ok_or(CoreError::NotFound("client profile"))?;

        Ok(WalletModel {
            balance: profile.balance,
            total_spent: profile.total_spent,
        })
    }

    /// Creates the payment intent for a top-up. No balance moves until
    /// the processor confirms through the webhook.
    pub async fn init_deposit(
        &self,
        subject: Subject,
        model: AddFundsModel,
    ) -> CoreResult<DepositIntentModel> {
        if subject.role != Role::Client {
            return Err(CoreError::NotAuthorized);
        }
        if model.amount <= Decimal::ZERO {
            return Err(CoreError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        let intent = self
            .gateway
            .create_payment_intent(model.amount, subject.user_id)
            .await
            .map_err(|err| CoreError::Transient(format!("payment processor failed: {err}")))?;

        let client_secret = intent.client_secret.ok_or_else(|| {
            CoreError::Transient("payment intent missing client secret".to_string())
        })?;

        info!(user_id = %subject.user_id, amount = %model.amount, "payments: deposit intent created");

        Ok(DepositIntentModel {
            client_secret,
            amount: model.amount,
        })
    }

    /// Ingest of processor webhooks. Idempotent by payment-intent id via
    /// the ledger's external-reference dedup.
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> CoreResult<()> {
        let event = self
            .gateway
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                error!("payments: webhook verification failed: {err}");
                CoreError::Validation("signature verification failed".to_string())
            })?;

        match event.type_.as_str() {
            "payment_intent.succeeded" => self.handle_intent_succeeded(&event).await?,
            "payment_intent.payment_failed" => {
                if let Some((user_id, _)) = Self::intent_target(&event) {
                    self.notify(
                        user_id,
                        "deposit_failed",
                        "Top-up failed",
                        "Your payment could not be completed",
                        json!({}),
                    )
                    .await;
                }
                warn!("payments: payment_intent.payment_failed received");
            }
            _ => {
                debug!("payments: unhandled webhook event type: {:?}", event.type_);
            }
        }

        Ok(())
    }

    pub async fn manual_payout(&self, subject: Subject) -> CoreResult<TransactionModel> {
        if subject.role != Role::Reader {
            return Err(CoreError::NotAuthorized);
        }

        let profile = with_db_retry("payments: load reader profile", || {
            self.reader_repo.find_by_user_id(subject.user_id)
        })
        .await?
        .ok_or(CoreError::NotFound("reader profile"))?;

        if profile.pending_balance < self.min_payout {
            return Err(CoreError::BelowMinPayout);
        }

        if PayoutAccountStatus::from_str(&profile.payout_account_status)
            != Some(PayoutAccountStatus::Active)
        {
            return Err(CoreError::AccountNotActive);
        }
        let account = profile
            .payout_account_ref
            .as_deref()
            .ok_or(CoreError::AccountNotActive)?;

        let amount = profile.pending_balance;
        let payout = with_db_retry("payments: create payout row", || {
            self.payout_repo.create_processing(subject.user_id, amount)
        })
        .await?;

        match self
            .gateway
            .create_transfer(amount, account, subject.user_id)
            .await
        {
            Ok(transfer_ref) => {
                let transaction = with_db_retry("payments: record payout", || {
                    self.ledger_repo
                        .record_payout(subject.user_id, amount, transfer_ref.clone())
                })
                .await?;
                with_db_retry("payments: complete payout row", || {
                    self.payout_repo
                        .mark_completed(payout.id, transfer_ref.clone())
                })
                .await?;

                info!(reader_id = %subject.user_id, %amount, "payments: manual payout completed");

                self.notify(
                    subject.user_id,
                    "payout_sent",
                    "Payout on its way",
                    &format!("{} has been transferred to your account", amount),
                    json!({ "payout_id": payout.id, "amount": amount }),
                )
                .await;

                Ok(TransactionModel::from(transaction))
            }
            Err(err) => {
                error!(reader_id = %subject.user_id, "payments: transfer failed: {err}");
                with_db_retry("payments: fail payout row", || {
                    self.payout_repo.mark_failed(payout.id, err.to_string())
                })
                .await?;
                Err(CoreError::Transient(format!("transfer failed: {err}")))
            }
        }
    }

    pub async fn refund(&self, subject: Subject, model: RefundModel) -> CoreResult<TransactionModel> {
        if subject.role != Role::Admin {
            return Err(CoreError::NotAuthorized);
        }

        match with_db_retry("payments: refund transaction", || {
            self.ledger_repo
                .refund(model.transaction_id, model.reason.clone())
        })
        .await?
        {
            RefundOutcome::Refunded(transaction) => Ok(TransactionModel::from(transaction)),
            RefundOutcome::AlreadyRefunded => Err(CoreError::Conflict(
                "transaction is already refunded".to_string(),
            )),
            RefundOutcome::NotFound => Err(CoreError::NotFound("transaction")),
        }
    }

    async fn handle_intent_succeeded(&self, event: &StripeEvent) -> CoreResult<()> {
        let (user_id, intent) = Self::intent_target(event).ok_or_else(|| {
            CoreError::Validation("payment intent missing user metadata".to_string())
        })?;

        let purpose = intent
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get("purpose").cloned());
        if purpose.as_deref() != Some("wallet_deposit") {
            debug!("payments: ignoring non-deposit payment intent");
            return Ok(());
        }

        let amount_minor = intent
            .amount
            .ok_or_else(|| CoreError::Validation("payment intent missing amount".to_string()))?;
        let amount = Decimal::new(amount_minor, 2);

        let transaction = with_db_retry("payments: credit deposit", || {
            self.ledger_repo.deposit(user_id, amount, intent.id.clone())
        })
        .await?;

        if transaction.user_id != user_id {
            return Err(CoreError::Conflict(
                "payment reference already recorded for another user".to_string(),
            ));
        }

        info!(%user_id, %amount, intent = %intent.id, "payments: deposit credited");

        self.notify(
            user_id,
            "deposit",
            "Funds added",
            &format!("{} was added to your balance", amount),
            json!({ "transaction_id": transaction.id, "amount": amount }),
        )
        .await;

        Ok(())
    }

    fn intent_target(event: &StripeEvent) -> Option<(Uuid, StripePaymentIntent)> {
        let intent = StripeClient::extract_payment_intent(event)?;
        let user_id = intent
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get("user_id"))
            .and_then(|value| Uuid::parse_str(value).ok())?;
        Some((user_id, intent))
    }

    async fn notify(
        &self,
        user_id: Uuid,
        notification_type: &str,
        title: &str,
        body: &str,
        metadata: serde_json::Value,
    ) {
        let row = NewNotificationEntity {
            id: Uuid::new_v4(),
            user_id,
            notification_type: notification_type.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            metadata: metadata.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        if let Err(err) = with_db_retry("payments: insert notification", || {
            self.notification_repo.insert(row.clone())
        })
        .await
        {
            warn!(%user_id, notification_type, "payments: notification row insert failed: {err}");
        }

        if let Err(err) = self
            .event_bus
            .publish(
                &notifications_channel(user_id),
                "notification",
                json!({ "type": notification_type, "title": title, "body": body, "metadata": metadata }),
            )
            .await
        {
            warn!(%user_id, notification_type, "payments: notification publish failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests;

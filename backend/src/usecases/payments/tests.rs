use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use seerline::domain::entities::notifications::NotificationEntity;
use seerline::domain::entities::payouts::PayoutEntity;
use seerline::domain::entities::reader_profiles::ReaderProfileEntity;
use seerline::domain::entities::transactions::TransactionEntity;
use seerline::domain::repositories::client_profiles::MockClientProfileRepository;
use seerline::domain::repositories::ledger::MockLedgerRepository;
use seerline::domain::repositories::notifications::MockNotificationRepository;
use seerline::domain::repositories::payouts::MockPayoutRepository;
use seerline::domain::repositories::reader_profiles::MockReaderProfileRepository;
use seerline::payments::stripe_client::StripeEventData;
use seerline::realtime::event_bus::MockEventPublisher;
use serde_json::json;

use super::*;

type TestUseCase = PaymentsUseCase<
    MockClientProfileRepository,
    MockReaderProfileRepository,
    MockLedgerRepository,
    MockPayoutRepository,
    MockNotificationRepository,
    MockPaymentGateway,
    MockEventPublisher,
>;

struct Mocks {
    client: MockClientProfileRepository,
    reader: MockReaderProfileRepository,
    ledger: MockLedgerRepository,
    payout: MockPayoutRepository,
    notification: MockNotificationRepository,
    gateway: MockPaymentGateway,
    event_bus: MockEventPublisher,
}

impl Mocks {
    fn new() -> Self {
        Self {
            client: MockClientProfileRepository::new(),
            reader: MockReaderProfileRepository::new(),
            ledger: MockLedgerRepository::new(),
            payout: MockPayoutRepository::new(),
            notification: MockNotificationRepository::new(),
            gateway: MockPaymentGateway::new(),
            event_bus: MockEventPublisher::new(),
        }
    }

    fn expect_notify(&mut self, times: usize) {
        self.notification
            .expect_insert()
            .times(times)
            .returning(|row| {
                Ok(NotificationEntity {
                    id: row.id,
                    user_id: row.user_id,
                    notification_type: row.notification_type,
                    title: row.title,
                    body: row.body,
                    metadata: row.metadata,
                    is_read: row.is_read,
                    created_at: row.created_at,
                })
            });
        self.event_bus
            .expect_publish()
            .times(times)
            .returning(|_, _, _| Ok(()));
    }

    fn into_usecase(self) -> TestUseCase {
        PaymentsUseCase::new(
            Arc::new(self.client),
            Arc::new(self.reader),
            Arc::new(self.ledger),
            Arc::new(self.payout),
            Arc::new(self.notification),
            Arc::new(self.gateway),
            Arc::new(self.event_bus),
            dec!(15.00),
        )
    }
}

fn reader_subject(user_id: Uuid) -> Subject {
    Subject {
        user_id,
        role: Role::Reader,
    }
}

fn reader_profile(
    user_id: Uuid,
    pending_balance: Decimal,
    account_status: &str,
) -> ReaderProfileEntity {
    let now = Utc::now();
    ReaderProfileEntity {
        user_id,
        chat_rate: dec!(1.50),
        voice_rate: dec!(2.00),
        video_rate: dec!(3.00),
        is_available: true,
        status: "online".to_string(),
        pending_balance,
        total_earned: pending_balance,
        total_paid_out: dec!(0.00),
        rating: dec!(0.00),
        review_count: 0,
        total_readings: 0,
        payout_account_ref: Some("acct_reader".to_string()),
        payout_account_status: account_status.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn transaction_fixture(user_id: Uuid, amount: Decimal, external_ref: &str) -> TransactionEntity {
    TransactionEntity {
        id: Uuid::new_v4(),
        user_id,
        session_id: None,
        transaction_type: "deposit".to_string(),
        amount,
        fee: dec!(0.00),
        net_amount: amount,
        status: "completed".to_string(),
        external_ref: Some(external_ref.to_string()),
        description: None,
        created_at: Utc::now(),
    }
}

fn intent_succeeded_event(user_id: Uuid, amount_minor: i64) -> StripeEvent {
    StripeEvent {
        id: Some("evt_1".to_string()),
        type_: "payment_intent.succeeded".to_string(),
        created: None,
        livemode: Some(false),
        data: StripeEventData {
            object: json!({
                "id": "pi_1",
                "amount": amount_minor,
                "status": "succeeded",
                "metadata": { "user_id": user_id.to_string(), "purpose": "wallet_deposit" },
            }),
        },
    }
}

#[tokio::test]
async fn webhook_rejects_a_bad_signature() {
    let mut mocks = Mocks::new();
    mocks
        .gateway
        .expect_verify_webhook_signature()
        .returning(|_, _| Err(anyhow::anyhow!("invalid webhook signature")));

    let usecase = mocks.into_usecase();
    let result = usecase.handle_webhook(b"{}", "t=1,v1=bad").await;

    assert!(matches!(result, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn webhook_credits_the_deposit_once() {
    let user_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .gateway
        .expect_verify_webhook_signature()
        .returning(move |_, _| Ok(intent_succeeded_event(user_id, 1500)));
    mocks
        .ledger
        .expect_deposit()
        .withf(move |deposit_user, amount, external_ref| {
            *deposit_user == user_id && *amount == dec!(15.00) && external_ref.as_str() == "pi_1"
        })
        .returning(move |deposit_user, amount, external_ref| {
            Ok(transaction_fixture(deposit_user, amount, &external_ref))
        })
        .times(1);
    mocks.expect_notify(1);

    let usecase = mocks.into_usecase();
    usecase
        .handle_webhook(b"{}", "t=1,v1=good")
        .await
        .expect("deposit webhook must succeed");
}

#[tokio::test]
async fn webhook_conflicts_when_the_reference_belongs_to_another_user() {
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .gateway
        .expect_verify_webhook_signature()
        .returning(move |_, _| Ok(intent_succeeded_event(user_id, 1500)));
    mocks
        .ledger
        .expect_deposit()
        .returning(move |_, amount, external_ref| {
            Ok(transaction_fixture(other_user, amount, &external_ref))
        });

    let usecase = mocks.into_usecase();
    let result = usecase.handle_webhook(b"{}", "t=1,v1=good").await;

    assert!(matches!(result, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn manual_payout_needs_the_floor() {
    let reader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(reader_profile(reader_id, dec!(14.99), "active"))));

    let usecase = mocks.into_usecase();
    let result = usecase.manual_payout(reader_subject(reader_id)).await;

    assert!(matches!(result, Err(CoreError::BelowMinPayout)));
}

#[tokio::test]
async fn manual_payout_needs_an_active_account() {
    let reader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(reader_profile(reader_id, dec!(42.50), "restricted"))));

    let usecase = mocks.into_usecase();
    let result = usecase.manual_payout(reader_subject(reader_id)).await;

    assert!(matches!(result, Err(CoreError::AccountNotActive)));
}

#[tokio::test]
async fn manual_payout_transfers_and_records() {
    let reader_id = Uuid::new_v4();
    let payout_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(reader_profile(reader_id, dec!(15.00), "active"))));
    mocks
        .payout
        .expect_create_processing()
        .withf(move |id, amount| *id == reader_id && *amount == dec!(15.00))
        .returning(move |id, amount| {
            Ok(PayoutEntity {
                id: payout_id,
                reader_id: id,
                amount,
                status: "processing".to_string(),
                external_transfer_ref: None,
                error: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });
    mocks
        .gateway
        .expect_create_transfer()
        .withf(move |amount, account, id| {
            *amount == dec!(15.00) && account == "acct_reader" && *id == reader_id
        })
        .returning(|_, _, _| Ok("tr_1".to_string()));
    mocks
        .ledger
        .expect_record_payout()
        .withf(move |id, amount, transfer_ref| {
            *id == reader_id && *amount == dec!(15.00) && transfer_ref.as_str() == "tr_1"
        })
        .returning(move |id, amount, transfer_ref| {
            let mut transaction = transaction_fixture(id, amount, &transfer_ref);
            transaction.transaction_type = "payout".to_string();
            Ok(transaction)
        });
    mocks
        .payout
        .expect_mark_completed()
        .withf(move |id, transfer_ref| *id == payout_id && transfer_ref.as_str() == "tr_1")
        .returning(|_, _| Ok(()));
    mocks.expect_notify(1);

    let usecase = mocks.into_usecase();
    let transaction = usecase
        .manual_payout(reader_subject(reader_id))
        .await
        .expect("payout must complete");

    assert_eq!(transaction.amount, dec!(15.00));
    assert_eq!(transaction.transaction_type, "payout");
}

#[tokio::test]
async fn manual_payout_failure_marks_the_row_failed() {
    let reader_id = Uuid::new_v4();
    let payout_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(reader_profile(reader_id, dec!(20.00), "active"))));
    mocks
        .payout
        .expect_create_processing()
        .returning(move |id, amount| {
            Ok(PayoutEntity {
                id: payout_id,
                reader_id: id,
                amount,
                status: "processing".to_string(),
                external_transfer_ref: None,
                error: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });
    mocks
        .gateway
        .expect_create_transfer()
        .returning(|_, _, _| Err(anyhow::anyhow!("account disabled")));
    mocks
        .payout
        .expect_mark_failed()
        .withf(move |id, error| *id == payout_id && error.contains("account disabled"))
        .returning(|_, _| Ok(()));

    let usecase = mocks.into_usecase();
    let result = usecase.manual_payout(reader_subject(reader_id)).await;

    assert!(matches!(result, Err(CoreError::Transient(_))));
}

#[tokio::test]
async fn refund_is_admin_only() {
    let usecase = Mocks::new().into_usecase();

    let result = usecase
        .refund(
            Subject {
                user_id: Uuid::new_v4(),
                role: Role::Client,
            },
            RefundModel {
                transaction_id: Uuid::new_v4(),
                reason: "test".to_string(),
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::NotAuthorized)));
}

use chrono::Utc;
use rust_decimal_macros::dec;
use seerline::domain::entities::notifications::NotificationEntity;
use seerline::domain::entities::payouts::PayoutEntity;
use seerline::domain::entities::transactions::TransactionEntity;
use seerline::domain::entities::users::UserEntity;
use seerline::domain::repositories::ledger::MockLedgerRepository;
use seerline::domain::repositories::notifications::MockNotificationRepository;
use seerline::domain::repositories::payouts::MockPayoutRepository;
use seerline::domain::repositories::users::MockUserRepository;

use super::*;

fn reader(pending_balance: Decimal) -> ReaderProfileEntity {
    let now = Utc::now();
    ReaderProfileEntity {
        user_id: Uuid::new_v4(),
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
        payout_account_status: "active".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn processing_payout(reader_id: Uuid, amount: Decimal) -> PayoutEntity {
    let now = Utc::now();
    PayoutEntity {
        id: Uuid::new_v4(),
        reader_id,
        amount,
        status: "processing".to_string(),
        external_transfer_ref: None,
        error: None,
        created_at: now,
        updated_at: now,
    }
}

fn payout_transaction(reader_id: Uuid, amount: Decimal, transfer_ref: &str) -> TransactionEntity {
    TransactionEntity {
        id: Uuid::new_v4(),
        user_id: reader_id,
        session_id: None,
        transaction_type: "payout".to_string(),
        amount,
        fee: dec!(0.00),
        net_amount: amount,
        status: "completed".to_string(),
        external_ref: Some(transfer_ref.to_string()),
        description: None,
        created_at: Utc::now(),
    }
}

fn admin_user() -> UserEntity {
    let now = Utc::now();
    UserEntity {
        id: Uuid::new_v4(),
        identity_subject: "admin-subject".to_string(),
        display_name: Some("Operator".to_string()),
        role: "admin".to_string(),
        created_at: now,
        updated_at: now,
    }
}

struct Mocks {
    payout: MockPayoutRepository,
    ledger: MockLedgerRepository,
    notification: MockNotificationRepository,
    user: MockUserRepository,
    gateway: MockTransferGateway,
}

impl Mocks {
    fn new() -> Self {
        let mut payout = MockPayoutRepository::new();
        payout
            .expect_sweep_stale_processing()
            .returning(|_| Ok(vec![]));

        Self {
            payout,
            ledger: MockLedgerRepository::new(),
            notification: MockNotificationRepository::new(),
            user: MockUserRepository::new(),
            gateway: MockTransferGateway::new(),
        }
    }

    fn into_usecase(self) -> PayoutRunUseCase {
        PayoutRunUseCase::new(
            Arc::new(self.payout),
            Arc::new(self.ledger),
            Arc::new(self.notification),
            Arc::new(self.user),
            Arc::new(self.gateway),
            dec!(15.00),
        )
    }
}

#[tokio::test]
async fn a_reader_at_the_floor_is_paid_out_in_full() {
    let eligible = reader(dec!(15.00));
    let reader_id = eligible.user_id;
    let payout_row = processing_payout(reader_id, dec!(15.00));
    let payout_id = payout_row.id;

    let mut mocks = Mocks::new();
    mocks
        .payout
        .expect_eligible_readers()
        .withf(|min_payout| *min_payout == dec!(15.00))
        .returning(move |_| Ok(vec![eligible.clone()]));
    mocks
        .payout
        .expect_create_processing()
        .withf(move |id, amount| *id == reader_id && *amount == dec!(15.00))
        .returning(move |_, _| Ok(payout_row.clone()));
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
        .times(1)
        .returning(|id, amount, transfer_ref| Ok(payout_transaction(id, amount, &transfer_ref)));
    mocks
        .payout
        .expect_mark_completed()
        .withf(move |id, transfer_ref| *id == payout_id && transfer_ref.as_str() == "tr_1")
        .times(1)
        .returning(|_, _| Ok(()));

    let report = mocks
        .into_usecase()
        .run(Utc::now())
        .await
        .expect("run must succeed");

    assert_eq!(
        report,
        PayoutRunReport {
            swept: 0,
            processed: 1,
            failed: 0,
        }
    );
}

#[tokio::test]
async fn one_failing_transfer_does_not_block_the_next_reader() {
    let failing = reader(dec!(20.00));
    let failing_id = failing.user_id;
    let succeeding = reader(dec!(16.00));
    let succeeding_id = succeeding.user_id;

    let mut mocks = Mocks::new();
    mocks
        .payout
        .expect_eligible_readers()
        .returning(move |_| Ok(vec![failing.clone(), succeeding.clone()]));
    mocks
        .payout
        .expect_create_processing()
        .returning(|reader_id, amount| Ok(processing_payout(reader_id, amount)));
    mocks
        .gateway
        .expect_create_transfer()
        .returning(move |_, _, reader_id| {
            if reader_id == failing_id {
                Err(anyhow::anyhow!("account frozen"))
            } else {
                Ok("tr_2".to_string())
            }
        });
    mocks
        .payout
        .expect_mark_failed()
        .withf(|_, error| error.contains("account frozen"))
        .times(1)
        .returning(|_, _| Ok(()));
    mocks.user.expect_find_admins().returning(|| Ok(vec![admin_user()]));
    mocks
        .notification
        .expect_insert()
        .withf(|row| row.notification_type == "payout_failed")
        .times(1)
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
    mocks
        .ledger
        .expect_record_payout()
        .withf(move |id, _, _| *id == succeeding_id)
        .times(1)
        .returning(|id, amount, transfer_ref| Ok(payout_transaction(id, amount, &transfer_ref)));
    mocks
        .payout
        .expect_mark_completed()
        .times(1)
        .returning(|_, _| Ok(()));

    let report = mocks
        .into_usecase()
        .run(Utc::now())
        .await
        .expect("run must finish despite a failure");

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn stale_processing_rows_are_failed_before_the_run() {
    let mut mocks = Mocks::new();
    // Replace the default empty sweep.
    mocks.payout = MockPayoutRepository::new();
    mocks
        .payout
        .expect_sweep_stale_processing()
        .withf(|cutoff| *cutoff <= Utc::now())
        .returning(|_| Ok(vec![processing_payout(Uuid::new_v4(), dec!(18.00))]));
    mocks.payout.expect_eligible_readers().returning(|_| Ok(vec![]));

    let report = mocks
        .into_usecase()
        .run(Utc::now())
        .await
        .expect("run must succeed");

    assert_eq!(report.swept, 1);
    assert_eq!(report.processed, 0);
}

use std::sync::Arc;

use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::json;

use seerline::domain::entities::messages::MessageEntity;
use seerline::domain::entities::notifications::NotificationEntity;
use seerline::domain::entities::reader_profiles::ReaderProfileEntity;
use seerline::domain::repositories::ledger::MockLedgerRepository;
use seerline::domain::repositories::notifications::MockNotificationRepository;
use seerline::domain::repositories::reader_profiles::MockReaderProfileRepository;
use seerline::domain::repositories::sessions::MockSessionRepository;
use seerline::domain::value_objects::ledger::SettlementResult;
use seerline::domain::value_objects::money::PLATFORM_FEE_RATE;
use seerline::realtime::event_bus::MockEventPublisher;

use super::*;

type TestUseCase = SessionUseCase<
    MockSessionRepository,
    MockReaderProfileRepository,
    MockLedgerRepository,
    MockNotificationRepository,
    MockEventPublisher,
>;

struct Mocks {
    session: MockSessionRepository,
    reader: MockReaderProfileRepository,
    ledger: MockLedgerRepository,
    notification: MockNotificationRepository,
    event_bus: MockEventPublisher,
}

impl Mocks {
    fn new() -> Self {
        Self {
            session: MockSessionRepository::new(),
            reader: MockReaderProfileRepository::new(),
            ledger: MockLedgerRepository::new(),
            notification: MockNotificationRepository::new(),
            event_bus: MockEventPublisher::new(),
        }
    }

    fn expect_notification_inserts(&mut self, times: usize) {
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
    }

    fn expect_publishes(&mut self, times: usize) {
        self.event_bus
            .expect_publish()
            .times(times)
            .returning(|_, _, _| Ok(()));
    }

    fn into_usecase(self) -> TestUseCase {
        SessionUseCase::new(
            Arc::new(self.session),
            Arc::new(self.reader),
            Arc::new(self.ledger),
            Arc::new(self.notification),
            Arc::new(self.event_bus),
            Arc::new(TokenBroker::new(
                "app-id".to_string(),
                "rtc-cert".to_string(),
                "key:secret".to_string(),
            )),
            PLATFORM_FEE_RATE,
        )
    }
}

fn client_subject(user_id: Uuid) -> Subject {
    Subject {
        user_id,
        role: Role::Client,
    }
}

fn reader_subject(user_id: Uuid) -> Subject {
    Subject {
        user_id,
        role: Role::Reader,
    }
}

fn online_reader(user_id: Uuid, chat_rate: Decimal) -> ReaderProfileEntity {
    let now = Utc::now();
    ReaderProfileEntity {
        user_id,
        chat_rate,
        voice_rate: chat_rate * dec!(2),
        video_rate: chat_rate * dec!(3),
        is_available: true,
        status: ReaderStatus::Online.to_string(),
        pending_balance: dec!(0.00),
        total_earned: dec!(0.00),
        total_paid_out: dec!(0.00),
        rating: dec!(0.00),
        review_count: 0,
        total_readings: 0,
        payout_account_ref: None,
        payout_account_status: "pending".to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn session_fixture(
    client_id: Uuid,
    reader_id: Uuid,
    status: SessionStatus,
    rate: Decimal,
) -> SessionEntity {
    let id = Uuid::new_v4();
    let now = Utc::now();
    SessionEntity {
        id,
        client_id,
        reader_id,
        session_type: "chat".to_string(),
        status: status.to_string(),
        rate_per_min: rate,
        start_time: None,
        end_time: None,
        duration_seconds: None,
        total_amount: None,
        platform_fee: None,
        reader_earnings: None,
        rtc_channel: format!("rtc_{}", id.simple()),
        pubsub_channel: format!("reading:{}", id),
        notes: None,
        metadata: json!({}),
        created_at: now,
        updated_at: now,
    }
}

fn active_session(
    client_id: Uuid,
    reader_id: Uuid,
    rate: Decimal,
    start_time: DateTime<Utc>,
) -> SessionEntity {
    let mut session = session_fixture(client_id, reader_id, SessionStatus::Active, rate);
    session.start_time = Some(start_time);
    session
}

#[tokio::test]
async fn request_freezes_the_rate_and_creates_a_pending_row() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(online_reader(reader_id, dec!(1.50)))));
    mocks
        .ledger
        .expect_balance_of()
        .returning(|_| Ok(Some(dec!(10.00))));
    mocks
        .session
        .expect_create()
        .withf(|new_session| {
            new_session.status == "pending"
                && new_session.rate_per_min == dec!(1.50)
                && new_session.session_type == "chat"
                && new_session.rtc_channel.starts_with("rtc_")
                && new_session.pubsub_channel.starts_with("reading:")
        })
        .returning(move |new_session| {
            Ok(SessionEntity {
                id: new_session.id,
                client_id: new_session.client_id,
                reader_id: new_session.reader_id,
                session_type: new_session.session_type,
                status: new_session.status,
                rate_per_min: new_session.rate_per_min,
                start_time: None,
                end_time: None,
                duration_seconds: None,
                total_amount: None,
                platform_fee: None,
                reader_earnings: None,
                rtc_channel: new_session.rtc_channel,
                pubsub_channel: new_session.pubsub_channel,
                notes: None,
                metadata: new_session.metadata,
                created_at: new_session.created_at,
                updated_at: new_session.updated_at,
            })
        });
    // The reader hears about the request: one durable row, one publish.
    mocks.expect_notification_inserts(1);
    mocks.expect_publishes(1);

    let usecase = mocks.into_usecase();
    let session = usecase
        .request(
            client_subject(client_id),
            RequestSessionModel {
                reader_id,
                session_type: SessionType::Chat,
            },
        )
        .await
        .expect("request must succeed");

    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.rate_per_min, dec!(1.50));
    assert_eq!(session.reader_id, reader_id);
    assert_eq!(session.client_id, client_id);
}

#[tokio::test]
async fn request_rejects_balance_below_the_reserve() {
    let reader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .reader
        .expect_find_by_user_id()
        .returning(move |_| Ok(Some(online_reader(reader_id, dec!(1.50)))));
    // 2.00 < 3 x 1.50; no session row is written.
    mocks
        .ledger
        .expect_balance_of()
        .returning(|_| Ok(Some(dec!(2.00))));

    let usecase = mocks.into_usecase();
    let result = usecase
        .request(
            client_subject(Uuid::new_v4()),
            RequestSessionModel {
                reader_id,
                session_type: SessionType::Chat,
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::InsufficientBalance)));
}

#[tokio::test]
async fn request_rejects_a_reader_who_is_not_online() {
    let reader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks.reader.expect_find_by_user_id().returning(move |_| {
        let mut reader = online_reader(reader_id, dec!(1.50));
        reader.status = ReaderStatus::Busy.to_string();
        Ok(Some(reader))
    });

    let usecase = mocks.into_usecase();
    let result = usecase
        .request(
            client_subject(Uuid::new_v4()),
            RequestSessionModel {
                reader_id,
                session_type: SessionType::Chat,
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::ReaderUnavailable)));
}

#[tokio::test]
async fn accept_activates_the_session_and_mints_both_tokens() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let pending = session_fixture(client_id, reader_id, SessionStatus::Pending, dec!(1.50));
    let session_id = pending.id;
    let rtc_channel = pending.rtc_channel.clone();

    let mut mocks = Mocks::new();
    {
        let pending = pending.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
    }
    mocks
        .session
        .expect_accept_pending()
        .returning(move |_, _, now| {
            let mut active = pending.clone();
            active.status = SessionStatus::Active.to_string();
            active.start_time = Some(now);
            Ok(AcceptOutcome::Accepted(active))
        });
    // status-update, session_accepted notification, session-started.
    mocks.expect_publishes(3);
    mocks.expect_notification_inserts(1);

    let usecase = mocks.into_usecase();
    let accepted = usecase
        .accept(reader_subject(reader_id), session_id)
        .await
        .expect("accept must succeed");

    assert_eq!(accepted.session.status, SessionStatus::Active);
    assert_eq!(accepted.rtc_token.uid, TokenBroker::numeric_uid(reader_id));
    assert_eq!(accepted.rtc_token.channel, rtc_channel);
}

#[tokio::test]
async fn accept_is_idempotent_for_an_already_active_session() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let active = active_session(client_id, reader_id, dec!(1.50), Utc::now());
    let session_id = active.id;

    let mut mocks = Mocks::new();
    {
        let active = active.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(active.clone())));
    }
    mocks
        .session
        .expect_accept_pending()
        .returning(move |_, _, _| Ok(AcceptOutcome::AlreadyActive(active.clone())));
    // No expectations on the event bus or the notification store: a
    // second accept must not duplicate events.

    let usecase = mocks.into_usecase();
    let accepted = usecase
        .accept(reader_subject(reader_id), session_id)
        .await
        .expect("second accept must succeed");

    assert_eq!(accepted.session.status, SessionStatus::Active);
    assert_eq!(accepted.rtc_token.uid, TokenBroker::numeric_uid(reader_id));
}

#[tokio::test]
async fn accept_that_lost_the_race_is_reader_unavailable() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let pending = session_fixture(client_id, reader_id, SessionStatus::Pending, dec!(1.50));
    let session_id = pending.id;

    let mut mocks = Mocks::new();
    {
        let pending = pending.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
    }
    mocks
        .session
        .expect_accept_pending()
        .returning(move |_, _, _| {
            let mut cancelled = pending.clone();
            cancelled.status = SessionStatus::Cancelled.to_string();
            cancelled.notes = Some("reader_already_in_session".to_string());
            Ok(AcceptOutcome::LostRace(cancelled))
        });

    let usecase = mocks.into_usecase();
    let result = usecase.accept(reader_subject(reader_id), session_id).await;

    assert!(matches!(result, Err(CoreError::ReaderUnavailable)));
}

#[tokio::test]
async fn accept_by_another_reader_is_not_authorized() {
    let pending = session_fixture(
        Uuid::new_v4(),
        Uuid::new_v4(),
        SessionStatus::Pending,
        dec!(1.50),
    );
    let session_id = pending.id;

    let mut mocks = Mocks::new();
    mocks
        .session
        .expect_find_by_id()
        .returning(move |_| Ok(Some(pending.clone())));

    let usecase = mocks.into_usecase();
    let result = usecase
        .accept(reader_subject(Uuid::new_v4()), session_id)
        .await;

    assert!(matches!(result, Err(CoreError::NotAuthorized)));
}

#[tokio::test]
async fn end_bills_whole_started_minutes_and_settles() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let start = Utc::now();
    let session = active_session(client_id, reader_id, dec!(1.50), start);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    {
        let session = session.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(session.clone())));
    }
    mocks
        .ledger
        .expect_settle_session()
        .withf(move |command| {
            command.session_id == session_id
                && command.charge.duration_seconds == 90
                && command.charge.minutes_billed == 2
                && command.charge.total_amount == dec!(3.00)
                && command.charge.platform_fee == dec!(0.90)
                && command.charge.reader_earnings == dec!(2.10)
        })
        .returning(move |command| {
            let mut settled = session.clone();
            settled.status = SessionStatus::Completed.to_string();
            settled.end_time = Some(command.end_time);
            settled.duration_seconds = Some(command.charge.duration_seconds as i32);
            settled.total_amount = Some(command.charge.total_amount);
            settled.platform_fee = Some(command.charge.platform_fee);
            settled.reader_earnings = Some(command.charge.reader_earnings);
            Ok(SettlementOutcome::Settled(SettlementResult {
                session: settled,
                charged: command.charge.total_amount,
                platform_fee: command.charge.platform_fee,
                reader_earnings: command.charge.reader_earnings,
                partial_settlement: false,
            }))
        });
    // status-update, session-ended, and one notification per party.
    mocks.expect_publishes(4);
    mocks.expect_notification_inserts(2);

    let usecase = mocks.into_usecase();
    let summary = usecase
        .end_at(
            client_subject(client_id),
            session_id,
            start + Duration::seconds(90),
        )
        .await
        .expect("end must settle");

    assert_eq!(summary.session.status, SessionStatus::Completed);
    assert_eq!(summary.charged, dec!(3.00));
    assert!(!summary.partial_settlement);
    assert_eq!(summary.session.duration_seconds, Some(90));
}

#[tokio::test]
async fn end_is_idempotent_after_settlement() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let mut session = active_session(client_id, reader_id, dec!(1.50), Utc::now());
    session.status = SessionStatus::Completed.to_string();
    session.total_amount = Some(dec!(3.00));
    session.duration_seconds = Some(90);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .session
        .expect_find_by_id()
        .returning(move |_| Ok(Some(session.clone())));
    // No ledger, notification, or event-bus expectations: the second end
    // must produce no further effects.

    let usecase = mocks.into_usecase();
    let summary = usecase
        .end_at(client_subject(client_id), session_id, Utc::now())
        .await
        .expect("repeated end must return the stored result");

    assert_eq!(summary.charged, dec!(3.00));
    assert_eq!(summary.session.duration_seconds, Some(90));
}

#[tokio::test]
async fn end_of_a_pending_session_is_invalid_state() {
    let client_id = Uuid::new_v4();
    let session = session_fixture(
        client_id,
        Uuid::new_v4(),
        SessionStatus::Pending,
        dec!(1.50),
    );
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .session
        .expect_find_by_id()
        .returning(move |_| Ok(Some(session.clone())));

    let usecase = mocks.into_usecase();
    let result = usecase
        .end_at(client_subject(client_id), session_id, Utc::now())
        .await;

    assert!(matches!(result, Err(CoreError::InvalidState(_))));
}

#[tokio::test]
async fn end_retries_the_settle_once_before_giving_up() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let start = Utc::now();
    let session = active_session(client_id, reader_id, dec!(1.50), start);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    {
        let session = session.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(session.clone())));
    }

    let mut seq = mockall::Sequence::new();
    mocks
        .ledger
        .expect_settle_session()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(anyhow::anyhow!("connection reset")));
    mocks
        .ledger
        .expect_settle_session()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |command| {
            let mut settled = session.clone();
            settled.status = SessionStatus::Completed.to_string();
            settled.total_amount = Some(command.charge.total_amount);
            Ok(SettlementOutcome::Settled(SettlementResult {
                session: settled,
                charged: command.charge.total_amount,
                platform_fee: command.charge.platform_fee,
                reader_earnings: command.charge.reader_earnings,
                partial_settlement: false,
            }))
        });
    mocks.expect_publishes(4);
    mocks.expect_notification_inserts(2);

    let usecase = mocks.into_usecase();
    let summary = usecase
        .end_at(
            client_subject(client_id),
            session_id,
            start + Duration::seconds(60),
        )
        .await
        .expect("retry must recover the settle");

    assert_eq!(summary.charged, dec!(1.50));
}

#[tokio::test]
async fn end_reports_a_partial_settlement() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let start = Utc::now();
    let session = active_session(client_id, reader_id, dec!(1.50), start);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    {
        let session = session.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(session.clone())));
    }
    // Balance at settlement only covered 1.00 of the 1.50 bill; the
    // split is preserved on the collected amount.
    mocks
        .ledger
        .expect_settle_session()
        .returning(move |command| {
            let mut settled = session.clone();
            settled.status = SessionStatus::Completed.to_string();
            settled.total_amount = Some(dec!(1.00));
            settled.metadata = json!({ "partial_settlement": true, "disputed": true });
            Ok(SettlementOutcome::Settled(SettlementResult {
                session: settled,
                charged: dec!(1.00),
                platform_fee: dec!(0.30),
                reader_earnings: dec!(0.70),
                partial_settlement: true,
            }))
        });
    mocks.expect_publishes(4);
    mocks.expect_notification_inserts(2);

    let usecase = mocks.into_usecase();
    let summary = usecase
        .end_at(
            client_subject(client_id),
            session_id,
            start + Duration::seconds(60),
        )
        .await
        .expect("partial settlement still completes the session");

    assert_eq!(summary.charged, dec!(1.00));
    assert!(summary.partial_settlement);
}

#[tokio::test]
async fn db_failures_surface_as_transient_after_one_retry() {
    let mut mocks = Mocks::new();
    // Both attempts fail: the handler boundary retries once, then maps
    // the failure to a retryable error instead of an internal one.
    mocks
        .session
        .expect_find_by_id()
        .times(2)
        .returning(|_| Err(anyhow::anyhow!("connection reset")));

    let usecase = mocks.into_usecase();
    let result = usecase
        .get(client_subject(Uuid::new_v4()), Uuid::new_v4())
        .await;

    assert!(matches!(result, Err(CoreError::Transient(_))));
}

#[tokio::test]
async fn decline_cancels_and_notifies_the_client() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let pending = session_fixture(client_id, reader_id, SessionStatus::Pending, dec!(1.50));
    let session_id = pending.id;

    let mut mocks = Mocks::new();
    {
        let pending = pending.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(pending.clone())));
    }
    mocks
        .session
        .expect_cancel_pending()
        .withf(|_, reason| reason.as_str() == "busy right now")
        .returning(move |_, reason| {
            let mut cancelled = pending.clone();
            cancelled.status = SessionStatus::Cancelled.to_string();
            cancelled.notes = Some(reason);
            Ok(Some(cancelled))
        });
    mocks.expect_notification_inserts(1);
    mocks.expect_publishes(1);

    let usecase = mocks.into_usecase();
    let declined = usecase
        .decline(
            reader_subject(reader_id),
            session_id,
            Some("busy right now".to_string()),
        )
        .await
        .expect("decline must succeed");

    assert_eq!(declined.status, SessionStatus::Cancelled);
}

#[tokio::test]
async fn messages_require_an_active_session() {
    let client_id = Uuid::new_v4();
    let mut session = session_fixture(
        client_id,
        Uuid::new_v4(),
        SessionStatus::Completed,
        dec!(1.50),
    );
    session.total_amount = Some(dec!(1.50));
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .session
        .expect_find_by_id()
        .returning(move |_| Ok(Some(session.clone())));

    let usecase = mocks.into_usecase();
    let result = usecase
        .send_message(client_subject(client_id), session_id, "hello".to_string())
        .await;

    assert!(matches!(result, Err(CoreError::InvalidState(_))));
}

#[tokio::test]
async fn messages_are_stored_and_published_on_the_session_channel() {
    let client_id = Uuid::new_v4();
    let reader_id = Uuid::new_v4();
    let session = active_session(client_id, reader_id, dec!(1.50), Utc::now());
    let session_id = session.id;
    let channel = session.pubsub_channel.clone();

    let mut mocks = Mocks::new();
    {
        let session = session.clone();
        mocks
            .session
            .expect_find_by_id()
            .returning(move |_| Ok(Some(session.clone())));
    }
    mocks
        .session
        .expect_append_message()
        .returning(|new_message| {
            Ok(MessageEntity {
                id: new_message.id,
                session_id: new_message.session_id,
                sender_id: new_message.sender_id,
                body: new_message.body,
                created_at: new_message.created_at,
            })
        });
    mocks
        .event_bus
        .expect_publish()
        .withf(move |publish_channel, event, _| publish_channel == channel && event == "message")
        .times(1)
        .returning(|_, _, _| Ok(()));

    let usecase = mocks.into_usecase();
    let message = usecase
        .send_message(client_subject(client_id), session_id, "hello".to_string())
        .await
        .expect("message must append");

    assert_eq!(message.body, "hello");
    assert_eq!(message.sender_id, client_id);
}

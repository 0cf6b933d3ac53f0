use std::sync::Arc;

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use seerline::domain::repositories::{
    client_profiles::ClientProfileRepository, ledger::LedgerRepository,
    notifications::NotificationRepository, payouts::PayoutRepository,
    reader_profiles::ReaderProfileRepository,
};
use seerline::domain::value_objects::ledger::{AddFundsModel, RefundModel};
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::infra::postgres::repositories::{
    client_profiles::ClientProfilePostgres, ledger::LedgerPostgres,
    notifications::NotificationPostgres, payouts::PayoutPostgres,
    reader_profiles::ReaderProfilePostgres,
};
use seerline::payments::stripe_client::StripeClient;
use seerline::realtime::event_bus::{EventPublisher, PubSubHttpClient};

use crate::auth::AuthUser;
use crate::axum_http::error_responses::ApiError;
use crate::axum_http::rate_limit::{rate_limit_middleware, RateCategory, RateLimiter};
use crate::axum_http::response;
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::payments::{PaymentGateway, PaymentsUseCase};
use crate::usecases::Subject;

pub fn build_usecase(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
) -> Arc<
    PaymentsUseCase<
        ClientProfilePostgres,
        ReaderProfilePostgres,
        LedgerPostgres,
        PayoutPostgres,
        NotificationPostgres,
        StripeClient,
        PubSubHttpClient,
    >,
> {
    let stripe_client = StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
    )
    .expect("stripe client is invalid");
    let event_bus =
        PubSubHttpClient::new(config.pubsub.rest_url.clone(), config.pubsub.api_key.clone())
            .expect("pub/sub client is invalid");

    Arc::new(PaymentsUseCase::new(
        Arc::new(ClientProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(ReaderProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(LedgerPostgres::new(Arc::clone(&db_pool))),
        Arc::new(PayoutPostgres::new(Arc::clone(&db_pool))),
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool))),
        Arc::new(stripe_client),
        Arc::new(event_bus),
        config.billing.min_payout,
    ))
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    limiter: RateLimiter,
) -> Router {
    let payments_usecase = build_usecase(db_pool, config);

    Router::new()
        .route("/add-funds", post(add_funds))
        .route("/wallet", get(wallet))
        .route("/reader/payout", post(reader_payout))
        .route("/refund", post(refund))
        .route_layer(from_fn_with_state(
            (limiter, RateCategory::Payments),
            rate_limit_middleware,
        ))
        .with_state(payments_usecase)
}

pub async fn add_funds<C, R, L, P, N, G, E>(
    State(payments_usecase): State<Arc<PaymentsUseCase<C, R, L, P, N, G, E>>>,
    auth: AuthUser,
    Json(model): Json<AddFundsModel>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let intent = payments_usecase
        .init_deposit(Subject::from(&auth), model)
        .await?;
    Ok(response::created(intent))
}

pub async fn wallet<C, R, L, P, N, G, E>(
    State(payments_usecase): State<Arc<PaymentsUseCase<C, R, L, P, N, G, E>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let wallet = payments_usecase.wallet(Subject::from(&auth)).await?;
    Ok(response::ok(wallet))
}

pub async fn reader_payout<C, R, L, P, N, G, E>(
    State(payments_usecase): State<Arc<PaymentsUseCase<C, R, L, P, N, G, E>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let transaction = payments_usecase.manual_payout(Subject::from(&auth)).await?;
    Ok(response::ok(transaction))
}

pub async fn refund<C, R, L, P, N, G, E>(
    State(payments_usecase): State<Arc<PaymentsUseCase<C, R, L, P, N, G, E>>>,
    auth: AuthUser,
    Json(model): Json<RefundModel>,
) -> Result<impl IntoResponse, ApiError>
where
    C: ClientProfileRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    P: PayoutRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let transaction = payments_usecase
        .refund(Subject::from(&auth), model)
        .await?;
    Ok(response::ok(transaction))
}

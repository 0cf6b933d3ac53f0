use std::sync::Arc;

use axum::{
    body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, routing::post, Json,
    Router,
};
use seerline::domain::error::CoreError;
use seerline::domain::repositories::{
    client_profiles::ClientProfileRepository, ledger::LedgerRepository,
    notifications::NotificationRepository, payouts::PayoutRepository,
    reader_profiles::ReaderProfileRepository,
};
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::realtime::event_bus::EventPublisher;
use serde_json::json;

use crate::axum_http::error_responses::ApiError;
use crate::axum_http::routers::payments::build_usecase;
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::payments::{PaymentGateway, PaymentsUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let payments_usecase = build_usecase(db_pool, config);

    Router::new()
        .route("/payments", post(payments_webhook))
        .with_state(payments_usecase)
}

/// Processor-signed ingest; authenticated by the webhook signature, not a
/// bearer token.
pub async fn payments_webhook<C, R, L, P, N, G, E>(
    State(payments_usecase): State<Arc<PaymentsUseCase<C, R, L, P, N, G, E>>>,
    headers: HeaderMap,
    body: Bytes,
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
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError(CoreError::Validation(
                "missing stripe-signature header".to_string(),
            ))
        })?;

    payments_usecase.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}

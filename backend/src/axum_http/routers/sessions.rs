use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use seerline::domain::repositories::{
    ledger::LedgerRepository, notifications::NotificationRepository,
    reader_profiles::ReaderProfileRepository, reviews::ReviewRepository,
    sessions::SessionRepository,
};
use seerline::domain::value_objects::reviews::{RespondReviewModel, SubmitReviewModel};
use seerline::domain::value_objects::sessions::{
    DeclineSessionModel, RequestSessionModel, SendMessageModel,
};
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::infra::postgres::repositories::{
    ledger::LedgerPostgres, notifications::NotificationPostgres,
    reader_profiles::ReaderProfilePostgres, reviews::ReviewPostgres, sessions::SessionPostgres,
};
use seerline::realtime::event_bus::{EventPublisher, PubSubHttpClient};
use seerline::realtime::tokens::TokenBroker;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::ApiError;
use crate::axum_http::rate_limit::{rate_limit_middleware, RateCategory, RateLimiter};
use crate::axum_http::response;
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::reviews::ReviewUseCase;
use crate::usecases::sessions::SessionUseCase;
use crate::usecases::Subject;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    config: Arc<DotEnvyConfig>,
    limiter: RateLimiter,
) -> Router {
    let session_repository = Arc::new(SessionPostgres::new(Arc::clone(&db_pool)));
    let reader_repository = Arc::new(ReaderProfilePostgres::new(Arc::clone(&db_pool)));
    let ledger_repository = Arc::new(LedgerPostgres::new(Arc::clone(&db_pool)));
    let notification_repository = Arc::new(NotificationPostgres::new(Arc::clone(&db_pool)));
    let event_bus = Arc::new(
        PubSubHttpClient::new(config.pubsub.rest_url.clone(), config.pubsub.api_key.clone())
            .expect("pub/sub client is invalid"),
    );
    let token_broker = Arc::new(TokenBroker::new(
        config.rtc.app_id.clone(),
        config.rtc.certificate.clone(),
        config.pubsub.api_key.clone(),
    ));

    let sessions_usecase = Arc::new(SessionUseCase::new(
        Arc::clone(&session_repository),
        reader_repository,
        ledger_repository,
        Arc::clone(&notification_repository),
        Arc::clone(&event_bus),
        token_broker,
        config.billing.platform_fee_rate,
    ));

    let reviews_usecase = Arc::new(ReviewUseCase::new(
        session_repository,
        Arc::new(ReviewPostgres::new(Arc::clone(&db_pool))),
        notification_repository,
        event_bus,
    ));

    let request_routes = Router::new()
        .route("/request", post(request))
        .route_layer(from_fn_with_state(
            (limiter.clone(), RateCategory::SessionRequests),
            rate_limit_middleware,
        ))
        .with_state(Arc::clone(&sessions_usecase));

    let message_routes = Router::new()
        .route("/:id/messages", post(send_message))
        .route_layer(from_fn_with_state(
            (limiter, RateCategory::Messages),
            rate_limit_middleware,
        ))
        .with_state(Arc::clone(&sessions_usecase));

    let review_routes = Router::new()
        .route("/:id/review", post(submit_review))
        .route("/:id/review-response", post(respond_review))
        .with_state(reviews_usecase);

    Router::new()
        .route("/:id/accept", post(accept))
        .route("/:id/decline", post(decline))
        .route("/:id/end", post(end))
        .route("/:id", get(get_session))
        .with_state(sessions_usecase)
        .merge(request_routes)
        .merge(message_routes)
        .merge(review_routes)
}

pub async fn request<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Json(model): Json<RequestSessionModel>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let session = sessions_usecase
        .request(Subject::from(&auth), model)
        .await?;
    Ok(response::created(session))
}

pub async fn accept<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let accepted = sessions_usecase
        .accept(Subject::from(&auth), session_id)
        .await?;
    Ok(response::ok(accepted))
}

pub async fn decline<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(model): Json<DeclineSessionModel>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let declined = sessions_usecase
        .decline(Subject::from(&auth), session_id, model.reason)
        .await?;
    Ok(response::ok(declined))
}

pub async fn end<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let summary = sessions_usecase
        .end(Subject::from(&auth), session_id)
        .await?;
    Ok(response::ok(summary))
}

pub async fn get_session<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let detail = sessions_usecase.get(Subject::from(&auth), session_id).await?;
    Ok(response::ok(detail))
}

pub async fn send_message<S, R, L, N, E>(
    State(sessions_usecase): State<Arc<SessionUseCase<S, R, L, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(model): Json<SendMessageModel>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReaderProfileRepository + Send + Sync + 'static,
    L: LedgerRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let message = sessions_usecase
        .send_message(Subject::from(&auth), session_id, model.body)
        .await?;
    Ok(response::created(message))
}

pub async fn submit_review<S, R, N, E>(
    State(reviews_usecase): State<Arc<ReviewUseCase<S, R, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(model): Json<SubmitReviewModel>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReviewRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let review = reviews_usecase
        .submit(Subject::from(&auth), session_id, model)
        .await?;
    Ok(response::created(review))
}

pub async fn respond_review<S, R, N, E>(
    State(reviews_usecase): State<Arc<ReviewUseCase<S, R, N, E>>>,
    auth: AuthUser,
    Path(session_id): Path<Uuid>,
    Json(model): Json<RespondReviewModel>,
) -> Result<impl IntoResponse, ApiError>
where
    S: SessionRepository + Send + Sync + 'static,
    R: ReviewRepository + Send + Sync + 'static,
    N: NotificationRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let review = reviews_usecase
        .respond(Subject::from(&auth), session_id, model)
        .await?;
    Ok(response::ok(review))
}

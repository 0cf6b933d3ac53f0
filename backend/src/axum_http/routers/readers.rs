use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use seerline::domain::repositories::{
    reader_profiles::ReaderProfileRepository, sessions::SessionRepository,
};
use seerline::domain::value_objects::presence::SetStatusModel;
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::infra::postgres::repositories::{
    reader_profiles::ReaderProfilePostgres, sessions::SessionPostgres,
};
use seerline::realtime::event_bus::{EventPublisher, PubSubHttpClient};
use serde_json::json;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::ApiError;
use crate::axum_http::response;
use crate::config::config_model::DotEnvyConfig;
use crate::usecases::presence::PresenceUseCase;
use crate::usecases::Subject;

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let event_bus =
        PubSubHttpClient::new(config.pubsub.rest_url.clone(), config.pubsub.api_key.clone())
            .expect("pub/sub client is invalid");

    let presence_usecase = Arc::new(PresenceUseCase::new(
        Arc::new(ReaderProfilePostgres::new(Arc::clone(&db_pool))),
        Arc::new(SessionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(event_bus),
    ));

    Router::new()
        .route("/me/status", patch(set_status))
        .route("/online", get(list_online))
        .with_state(presence_usecase)
}

pub async fn set_status<R, S, E>(
    State(presence_usecase): State<Arc<PresenceUseCase<R, S, E>>>,
    auth: AuthUser,
    Json(model): Json<SetStatusModel>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ReaderProfileRepository + Send + Sync + 'static,
    S: SessionRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let status = presence_usecase
        .set_status(Subject::from(&auth), model.status)
        .await?;
    Ok(response::ok(json!({ "status": status })))
}

/// Read-only reconciliation poll for presence subscribers.
pub async fn list_online<R, S, E>(
    State(presence_usecase): State<Arc<PresenceUseCase<R, S, E>>>,
) -> Result<impl IntoResponse, ApiError>
where
    R: ReaderProfileRepository + Send + Sync + 'static,
    S: SessionRepository + Send + Sync + 'static,
    E: EventPublisher + Send + Sync + 'static,
{
    let readers = presence_usecase.list_online().await?;
    Ok(response::ok(readers))
}

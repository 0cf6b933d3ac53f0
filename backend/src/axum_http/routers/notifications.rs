use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use seerline::domain::repositories::notifications::NotificationRepository;
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::infra::postgres::repositories::notifications::NotificationPostgres;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::ApiError;
use crate::axum_http::response;
use crate::usecases::notifications::NotificationUseCase;
use crate::usecases::Subject;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let notifications_usecase = Arc::new(NotificationUseCase::new(Arc::new(
        NotificationPostgres::new(Arc::clone(&db_pool)),
    )));

    Router::new()
        .route("/", get(list))
        .route("/:id/read", post(mark_read))
        .with_state(notifications_usecase)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
}

pub async fn list<N>(
    State(notifications_usecase): State<Arc<NotificationUseCase<N>>>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    let notifications = notifications_usecase
        .list(Subject::from(&auth), query.unread)
        .await?;
    Ok(response::ok(notifications))
}

pub async fn mark_read<N>(
    State(notifications_usecase): State<Arc<NotificationUseCase<N>>>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
    N: NotificationRepository + Send + Sync + 'static,
{
    notifications_usecase
        .mark_read(Subject::from(&auth), notification_id)
        .await?;
    Ok(response::ok(json!({ "read": true })))
}

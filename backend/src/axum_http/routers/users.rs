use std::sync::Arc;

use axum::{
    extract::State, middleware::from_fn_with_state, response::IntoResponse, routing::post, Router,
};
use seerline::domain::repositories::users::UserRepository;
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use seerline::infra::postgres::repositories::users::UserPostgres;

use crate::auth::AuthUser;
use crate::axum_http::error_responses::ApiError;
use crate::axum_http::rate_limit::{rate_limit_middleware, RateCategory, RateLimiter};
use crate::axum_http::response;
use crate::usecases::users::UserSyncUseCase;

pub fn routes(db_pool: Arc<PgPoolSquad>, limiter: RateLimiter) -> Router {
    let users_usecase = Arc::new(UserSyncUseCase::new(Arc::new(UserPostgres::new(
        Arc::clone(&db_pool),
    ))));

    Router::new()
        .route("/sync", post(sync))
        .route_layer(from_fn_with_state(
            (limiter, RateCategory::AuthSync),
            rate_limit_middleware,
        ))
        .with_state(users_usecase)
}

pub async fn sync<U>(
    State(users_usecase): State<Arc<UserSyncUseCase<U>>>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError>
where
    U: UserRepository + Send + Sync + 'static,
{
    let user = users_usecase.sync(&auth).await?;
    Ok(response::ok(user))
}

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use seerline::infra::postgres::postgres_connection::PgPoolSquad;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::info;

use crate::axum_http::rate_limit::{rate_limit_middleware, RateCategory, RateLimiter};
use crate::axum_http::{default_routers, routers};
use crate::config::config_model::DotEnvyConfig;

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let limiter = RateLimiter::new(config.identity.jwt_secret.clone());

    // Idle buckets are dropped in the background so the key space cannot
    // grow without bound.
    let purge_limiter = limiter.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(300)).await;
            purge_limiter.purge_stale(3600.0).await;
        }
    });

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/auth",
            routers::users::routes(Arc::clone(&db_pool), limiter.clone()),
        )
        .nest(
            "/api/v1/sessions",
            routers::sessions::routes(Arc::clone(&db_pool), Arc::clone(&config), limiter.clone()),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(Arc::clone(&db_pool), Arc::clone(&config), limiter.clone()),
        )
        .nest(
            "/api/v1/readers",
            routers::readers::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .nest(
            "/api/v1/notifications",
            routers::notifications::routes(Arc::clone(&db_pool)),
        )
        .nest(
            "/api/v1/webhooks",
            routers::webhooks::routes(Arc::clone(&db_pool), Arc::clone(&config)),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(from_fn_with_state(
            (limiter, RateCategory::General),
            rate_limit_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(config.frontend_url.parse::<HeaderValue>()?),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.server.port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

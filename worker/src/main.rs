use anyhow::Result;
use seerline::domain::repositories::{
    ledger::LedgerRepository, notifications::NotificationRepository, payouts::PayoutRepository,
    sessions::SessionRepository, users::UserRepository,
};
use seerline::infra::postgres::postgres_connection;
use seerline::infra::postgres::repositories::{
    ledger::LedgerPostgres, notifications::NotificationPostgres, payouts::PayoutPostgres,
    sessions::SessionPostgres, users::UserPostgres,
};
use seerline::payments::stripe_client::StripeClient;
use seerline::realtime::event_bus::{EventPublisher, PubSubHttpClient};
use std::sync::Arc;
use tracing::{error, info};
use worker::usecases::payout_run::{PayoutRunUseCase, TransferGateway};
use worker::usecases::session_sweep::SessionSweepUseCase;
use worker::{config, services};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    seerline::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let payout_repository: Arc<dyn PayoutRepository + Send + Sync> =
        Arc::new(PayoutPostgres::new(Arc::clone(&db_pool_arc)));
    let ledger_repository: Arc<dyn LedgerRepository + Send + Sync> =
        Arc::new(LedgerPostgres::new(Arc::clone(&db_pool_arc)));
    let notification_repository: Arc<dyn NotificationRepository + Send + Sync> =
        Arc::new(NotificationPostgres::new(Arc::clone(&db_pool_arc)));
    let user_repository: Arc<dyn UserRepository + Send + Sync> =
        Arc::new(UserPostgres::new(Arc::clone(&db_pool_arc)));
    let session_repository: Arc<dyn SessionRepository + Send + Sync> =
        Arc::new(SessionPostgres::new(Arc::clone(&db_pool_arc)));

    let transfer_gateway: Arc<dyn TransferGateway> = Arc::new(StripeClient::new(
        dotenvy_env.stripe.secret_key.clone(),
        dotenvy_env.stripe.webhook_secret.clone(),
    )?);
    let event_bus: Arc<dyn EventPublisher> = Arc::new(PubSubHttpClient::new(
        dotenvy_env.pubsub.rest_url.clone(),
        dotenvy_env.pubsub.api_key.clone(),
    )?);

    let payout_usecase = Arc::new(PayoutRunUseCase::new(
        payout_repository,
        ledger_repository,
        notification_repository.clone(),
        user_repository,
        transfer_gateway,
        dotenvy_env.jobs.min_payout,
    ));

    let sweep_usecase = Arc::new(SessionSweepUseCase::new(
        session_repository,
        notification_repository,
        event_bus,
        dotenvy_env.jobs.session_timeout_minutes,
    ));

    info!("Worker started");

    let payout_loop = tokio::spawn(services::payout_scheduler::run(payout_usecase));
    let sweep_loop = tokio::spawn(services::session_sweeper::run(sweep_usecase));

    tokio::select! {
        result = payout_loop => result??,
        result = sweep_loop => result??,
    };

    Ok(())
}

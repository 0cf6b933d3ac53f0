use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info};

use crate::usecases::session_sweep::SessionSweepUseCase;

const SWEEP_INTERVAL_SECS: u64 = 60;

pub async fn run(usecase: Arc<SessionSweepUseCase>) -> Result<()> {
    loop {
        tokio::time::sleep(Duration::from_secs(SWEEP_INTERVAL_SECS)).await;

        match usecase.sweep(Utc::now()).await {
            Ok(0) => {}
            Ok(swept) => info!(swept, "Pending session sweep cancelled stale requests"),
            Err(err) => error!("Pending session sweep failed: {}", err),
        }
    }
}

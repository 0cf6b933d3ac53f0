use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};

use crate::usecases::payout_run::PayoutRunUseCase;

const RUN_HOUR_UTC: u32 = 2;

/// Next 02:00 UTC strictly after `now`.
pub fn next_run_at(now: DateTime<Utc>) -> DateTime<Utc> {
    let today_run = now
        .date_naive()
        .and_hms_opt(RUN_HOUR_UTC, 0, 0)
        .expect("02:00:00 is a valid time")
        .and_utc();

    if now < today_run {
        today_run
    } else {
        today_run + Duration::days(1)
    }
}

pub async fn run(usecase: Arc<PayoutRunUseCase>) -> Result<()> {
    loop {
        let now = Utc::now();
        let next = next_run_at(now);
        let wait = (next - now).to_std().unwrap_or(StdDuration::ZERO);
        info!("Payout scheduler sleeping until {}", next);
        tokio::time::sleep(wait).await;

        match usecase.run(Utc::now()).await {
            Ok(report) => info!(
                swept = report.swept,
                processed = report.processed,
                failed = report.failed,
                "Payout run completed"
            ),
            Err(err) => error!("Payout run failed: {}", err),
        }
    }
}

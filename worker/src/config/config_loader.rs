use anyhow::Result;
use rust_decimal::Decimal;

use super::config_model::{Database, DotEnvyConfig, Jobs, Pubsub, Stripe};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let stripe = Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY is invalid"),
        webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
            .expect("STRIPE_WEBHOOK_SECRET is invalid"),
    };

    let pubsub = Pubsub {
        api_key: std::env::var("PUBSUB_API_KEY").expect("PUBSUB_API_KEY is invalid"),
        rest_url: std::env::var("PUBSUB_REST_URL")
            .unwrap_or_else(|_| "https://rest.ably.io".to_string()),
    };

    let min_payout: Decimal = std::env::var("MIN_PAYOUT")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or_else(|| Decimal::new(1500, 2));

    let session_timeout_minutes: i64 = std::env::var("SESSION_TIMEOUT_MINUTES")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or(5);

    let jobs = Jobs {
        min_payout,
        session_timeout_minutes,
    };

    Ok(DotEnvyConfig {
        database,
        stripe,
        pubsub,
        jobs,
    })
}

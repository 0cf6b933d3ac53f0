use anyhow::Result;
use rust_decimal::Decimal;
use seerline::domain::value_objects::money::fee_rate_from_percent;

use super::config_model::{
    Billing, Database, DotEnvyConfig, Identity, Pubsub, Rtc, Server, Stripe,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let identity = Identity {
        jwt_secret: std::env::var("IDENTITY_JWT_SECRET").expect("IDENTITY_JWT_SECRET is invalid"),
    };

    let stripe = Stripe {
        secret_key: std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY is invalid"),
        webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
            .expect("STRIPE_WEBHOOK_SECRET is invalid"),
    };

    let rtc = Rtc {
        app_id: std::env::var("RTC_APP_ID").expect("RTC_APP_ID is invalid"),
        certificate: std::env::var("RTC_APP_CERTIFICATE").expect("RTC_APP_CERTIFICATE is invalid"),
    };

    let pubsub = Pubsub {
        api_key: std::env::var("PUBSUB_API_KEY").expect("PUBSUB_API_KEY is invalid"),
        rest_url: std::env::var("PUBSUB_REST_URL")
            .unwrap_or_else(|_| "https://rest.ably.io".to_string()),
    };

    let platform_fee_percent: u32 = std::env::var("PLATFORM_FEE_PERCENT")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or(30);

    let min_payout: Decimal = std::env::var("MIN_PAYOUT")
        .ok()
        .map(|v| v.parse())
        .transpose()?
        .unwrap_or_else(|| Decimal::new(1500, 2));

    let billing = Billing {
        platform_fee_rate: fee_rate_from_percent(platform_fee_percent),
        min_payout,
    };

    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    Ok(DotEnvyConfig {
        server,
        database,
        identity,
        stripe,
        rtc,
        pubsub,
        billing,
        frontend_url,
    })
}

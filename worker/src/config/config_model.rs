use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub stripe: Stripe,
    pub pubsub: Pubsub,
    pub jobs: Jobs,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Pubsub {
    pub api_key: String,
    pub rest_url: String,
}

#[derive(Debug, Clone)]
pub struct Jobs {
    pub min_payout: Decimal,
    pub session_timeout_minutes: i64,
}

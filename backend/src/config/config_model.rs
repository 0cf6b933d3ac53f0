use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub identity: Identity,
    pub stripe: Stripe,
    pub rtc: Rtc,
    pub pubsub: Pubsub,
    pub billing: Billing,
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct Rtc {
    pub app_id: String,
    pub certificate: String,
}

#[derive(Debug, Clone)]
pub struct Pubsub {
    pub api_key: String,
    pub rest_url: String,
}

#[derive(Debug, Clone)]
pub struct Billing {
    pub platform_fee_rate: Decimal,
    pub min_payout: Decimal,
}

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use seerline::domain::error::CoreError;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::auth;
use crate::axum_http::error_responses::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    General,
    AuthSync,
    Payments,
    Messages,
    SessionRequests,
}

impl RateCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            RateCategory::General => "general",
            RateCategory::AuthSync => "auth_sync",
            RateCategory::Payments => "payments",
            RateCategory::Messages => "messages",
            RateCategory::SessionRequests => "session_requests",
        }
    }

    /// (requests, window seconds)
    fn limit(&self) -> (f64, f64) {
        match self {
            RateCategory::General => (100.0, 900.0),
            RateCategory::AuthSync => (10.0, 3600.0),
            RateCategory::Payments => (5.0, 60.0),
            RateCategory::Messages => (60.0, 60.0),
            RateCategory::SessionRequests => (3.0, 60.0),
        }
    }

    fn rate(&self) -> f64 {
        let (requests, window) = self.limit();
        requests / window
    }

    fn capacity(&self) -> f64 {
        self.limit().0
    }
}

/// Subject identifier when the bearer token carries one, network address
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RateKey {
    Subject(Uuid),
    Addr(IpAddr),
}

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<(RateCategory, RateKey), TokenBucket>>>,
    jwt_secret: String,
}

impl RateLimiter {
    pub fn new(jwt_secret: String) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            jwt_secret,
        }
    }

    async fn check(&self, category: RateCategory, key: RateKey) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry((category, key))
            .or_insert_with(|| TokenBucket::new(category.capacity()));
        bucket.try_consume(category.rate(), category.capacity())
    }

    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill).as_secs_f64() < max_idle_secs
        });
    }
}

pub async fn rate_limit_middleware(
    State((limiter, category)): State<(RateLimiter, RateCategory)>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = auth::subject_hint(req.headers(), &limiter.jwt_secret)
        .map(RateKey::Subject)
        .or_else(|| extract_client_ip(&req).map(RateKey::Addr));

    if let Some(key) = key {
        if !limiter.check(category, key).await {
            warn!(category = category.tag(), ?key, "Rate limit exceeded");
            return Err(ApiError(CoreError::RateLimitExceeded(category.tag())));
        }
    }

    Ok(next.run(req).await)
}

/// Try ConnectInfo first, then X-Forwarded-For, then X-Real-IP.
fn extract_client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(connect_info.0.ip());
    }

    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            if let Ok(ip) = value.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new("test-secret".to_string())
    }

    #[tokio::test]
    async fn test_session_requests_allow_three_then_block() {
        let limiter = limiter();
        let key = RateKey::Subject(Uuid::new_v4());

        for _ in 0..3 {
            assert!(limiter.check(RateCategory::SessionRequests, key).await);
        }

        assert!(!limiter.check(RateCategory::SessionRequests, key).await);
    }

    #[tokio::test]
    async fn test_categories_do_not_share_buckets() {
        let limiter = limiter();
        let key = RateKey::Subject(Uuid::new_v4());

        for _ in 0..3 {
            assert!(limiter.check(RateCategory::SessionRequests, key).await);
        }
        assert!(!limiter.check(RateCategory::SessionRequests, key).await);

        // The same subject still has payment budget.
        assert!(limiter.check(RateCategory::Payments, key).await);
    }

    #[tokio::test]
    async fn test_different_subjects_have_separate_buckets() {
        let limiter = limiter();
        let key1 = RateKey::Subject(Uuid::new_v4());
        let key2 = RateKey::Subject(Uuid::new_v4());

        for _ in 0..5 {
            assert!(limiter.check(RateCategory::Payments, key1).await);
        }
        assert!(!limiter.check(RateCategory::Payments, key1).await);

        assert!(limiter.check(RateCategory::Payments, key2).await);
    }

    #[tokio::test]
    async fn test_address_fallback_keys_work() {
        let limiter = limiter();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.check(RateCategory::General, RateKey::Addr(ip)).await);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let limiter = limiter();
        let key = RateKey::Subject(Uuid::new_v4());
        assert!(limiter.check(RateCategory::General, key).await);

        limiter.purge_stale(0.0).await;

        let buckets = limiter.buckets.lock().await;
        assert!(buckets.is_empty());
    }
}

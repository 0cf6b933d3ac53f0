use std::future::Future;

use thiserror::Error;
use tracing::warn;

/// Error kinds surfaced to API callers. Everything that crosses a handler
/// boundary is folded into one of these; `Internal` never leaks its cause
/// to the response body.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("caller lacks the required role or ownership")]
    NotAuthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("balance is below the required reserve")]
    InsufficientBalance,

    #[error("reader is not available")]
    ReaderUnavailable,

    #[error("rate limit exceeded for {0}")]
    RateLimitExceeded(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("session has already been reviewed")]
    AlreadyReviewed,

    #[error("pending balance is below the minimum payout")]
    BelowMinPayout,

    #[error("payout account is not active")]
    AccountNotActive,

    #[error("{0}")]
    Transient(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION",
            CoreError::NotAuthorized => "NOT_AUTHORIZED",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::InvalidState(_) => "INVALID_STATE",
            CoreError::InvalidTransition(_) => "INVALID_TRANSITION",
            CoreError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            CoreError::ReaderUnavailable => "READER_UNAVAILABLE",
            CoreError::RateLimitExceeded(_) => "RATE_LIMIT_EXCEEDED",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::AlreadyReviewed => "ALREADY_REVIEWED",
            CoreError::BelowMinPayout => "BELOW_MIN_PAYOUT",
            CoreError::AccountNotActive => "ACCOUNT_NOT_ACTIVE",
            CoreError::Transient(_) => "TRANSIENT_ERROR",
            CoreError::Internal(_) => "INTERNAL",
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Handler boundary for database round-trips: one retry, then the
/// failure surfaces as `TRANSIENT_ERROR` so the caller knows a repeat is
/// safe. Every use case routes its repository calls through here.
pub async fn with_db_retry<T, F, Fut>(context: &'static str, op: F) -> CoreResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!("{context} failed, retrying once: {err}");
            op().await
                .map_err(|err| CoreError::Transient(format!("{context} failed: {err}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn a_failure_is_retried_once_and_can_recover() {
        let calls = AtomicUsize::new(0);

        let value = with_db_retry("load row", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .expect("second attempt must win");

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn two_failures_surface_as_transient() {
        let calls = AtomicUsize::new(0);

        let result: CoreResult<i32> = with_db_retry("load row", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("connection reset")) }
        })
        .await;

        let err = result.expect_err("both attempts failed");
        assert!(matches!(err, CoreError::Transient(_)));
        assert_eq!(err.code(), "TRANSIENT_ERROR");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_first_attempt_success_is_not_repeated() {
        let calls = AtomicUsize::new(0);

        let value = with_db_retry("load row", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok("row") }
        })
        .await
        .unwrap();

        assert_eq!(value, "row");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}


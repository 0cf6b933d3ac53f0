use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seerline::domain::error::CoreError;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

/// Boundary wrapper turning a `CoreError` into the error envelope
/// `{ "success": false, "error": { "code", "message" } }`.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let (status, message) = match &self.0 {
            CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoreError::NotAuthorized => (StatusCode::FORBIDDEN, self.0.to_string()),
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoreError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoreError::InsufficientBalance => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::ReaderUnavailable => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::RateLimitExceeded(_) => {
                (StatusCode::TOO_MANY_REQUESTS, self.0.to_string())
            }
            CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            CoreError::AlreadyReviewed => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::BelowMinPayout => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::AccountNotActive => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::Transient(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CoreError::Internal(err) => {
                // Never leak internals to the response body.
                let correlation_id = Uuid::new_v4();
                error!(%correlation_id, "internal error: {err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("internal error (correlation id {correlation_id})"),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": { "code": code, "message": message },
        }));

        (status, body).into_response()
    }
}

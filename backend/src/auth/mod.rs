use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use seerline::domain::value_objects::enums::roles::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::config_loader;

/// Claims minted by the identity collaborator. `sub` is the opaque
/// subject identifier, which doubles as the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub role: String,
    pub name: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub display_name: Option<String>,
}

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::UNAUTHORIZED,
            format!("Unauthorized: {}", self.0),
        )
            .into_response()
    }
}

pub fn validate_identity_jwt(token: &str) -> Result<IdentityClaims, AuthError> {
    let config =
        config_loader::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    let secret = config.identity.jwt_secret;

    validate_identity_jwt_with_secret(token, &secret)
}

pub fn validate_identity_jwt_with_secret(
    token: &str,
    secret: &str,
) -> Result<IdentityClaims, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<IdentityClaims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Pulls the bearer subject out of a request without rejecting it; used
/// by the rate limiter to key buckets by subject before auth runs.
pub fn subject_hint(parts: &axum::http::HeaderMap, secret: &str) -> Option<Uuid> {
    let auth_header = parts.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;
    let claims = validate_identity_jwt_with_secret(token, secret).ok()?;
    Uuid::parse_str(&claims.sub).ok()
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let auth_str = auth_header.to_str().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            )
        })?;

        if !auth_str.starts_with("Bearer ") {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format".to_string(),
            ));
        }

        let token = &auth_str[7..];

        let claims = validate_identity_jwt(token)
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.0.to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid user ID in token".to_string(),
            )
        })?;

        let role = Role::from_str(&claims.role).ok_or((
            StatusCode::UNAUTHORIZED,
            "Unknown role in token".to_string(),
        ))?;

        Ok(AuthUser {
            user_id,
            role,
            display_name: claims.name,
        })
    }
}

use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const RTC_TOKEN_TTL_HOURS: i64 = 24;
const PUBSUB_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcRole {
    Publisher,
    Subscriber,
}

impl Display for RtcRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self {
            RtcRole::Publisher => "publisher",
            RtcRole::Subscriber => "subscriber",
        };
        write!(f, "{}", role)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RtcTokenBundle {
    pub token: String,
    pub uid: u32,
    pub channel: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PubsubTokenBundle {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PubsubClaims {
    sub: String,
    iat: i64,
    exp: i64,
    capability: serde_json::Value,
}

/// Stateless credential mint for the external RTC and pub/sub services.
/// Holds the signing secrets; they never appear in logs or errors.
pub struct TokenBroker {
    rtc_app_id: String,
    rtc_certificate: String,
    pubsub_key: String,
}

impl TokenBroker {
    pub fn new(rtc_app_id: String, rtc_certificate: String, pubsub_key: String) -> Self {
        Self {
            rtc_app_id,
            rtc_certificate,
            pubsub_key,
        }
    }

    /// Stable numeric UID for the RTC service: the absolute value of a
    /// 32-bit rolling hash of the user identifier. The same user always
    /// maps to the same UID, so rejoins keep their seat.
    pub fn numeric_uid(user_id: Uuid) -> u32 {
        let mut hash: i32 = 0;
        for byte in user_id.to_string().bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(byte as i32);
        }
        hash.unsigned_abs()
    }

    pub fn rtc_token(
        &self,
        user_id: Uuid,
        channel: &str,
        role: RtcRole,
        now: DateTime<Utc>,
    ) -> anyhow::Result<RtcTokenBundle> {
        let uid = Self::numeric_uid(user_id);
        let expires_at = now + Duration::hours(RTC_TOKEN_TTL_HOURS);

        let payload = format!(
            "{}.{}.{}.{}.{}",
            self.rtc_app_id,
            channel,
            uid,
            role,
            expires_at.timestamp()
        );
        let mut mac = HmacSha256::new_from_slice(self.rtc_certificate.as_bytes())?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(RtcTokenBundle {
            token: format!("007{}.{}", payload, signature),
            uid,
            channel: channel.to_string(),
            expires_at,
        })
    }

    /// Pub/sub credential with the full wildcard capability. Key format is
    /// `name:secret`; the secret half signs the JWT.
    pub fn pubsub_token(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<PubsubTokenBundle> {
        let expires_at = now + Duration::hours(PUBSUB_TOKEN_TTL_HOURS);
        let secret = self
            .pubsub_key
            .split_once(':')
            .map(|(_, secret)| secret)
            .unwrap_or(&self.pubsub_key);

        let claims = PubsubClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            capability: json!({ "*": ["subscribe", "publish", "presence"] }),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;

        Ok(PubsubTokenBundle { token, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn broker() -> TokenBroker {
        TokenBroker::new(
            "app-id-under-test".to_string(),
            "rtc-signing-certificate".to_string(),
            "keyname:keysecret".to_string(),
        )
    }

    #[test]
    fn numeric_uid_is_stable_per_user() {
        let user = Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        assert_eq!(TokenBroker::numeric_uid(user), TokenBroker::numeric_uid(user));
        assert_ne!(
            TokenBroker::numeric_uid(user),
            TokenBroker::numeric_uid(Uuid::new_v4())
        );
    }

    #[test]
    fn rtc_token_binds_channel_and_uid_and_expires_in_a_day() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let bundle = broker()
            .rtc_token(user, "rtc_room", RtcRole::Publisher, now)
            .unwrap();

        assert_eq!(bundle.uid, TokenBroker::numeric_uid(user));
        assert_eq!(bundle.channel, "rtc_room");
        assert_eq!(bundle.expires_at, now + Duration::hours(24));
        assert!(bundle.token.starts_with("007"));

        // Same inputs, same token; different channel, different token.
        let again = broker()
            .rtc_token(user, "rtc_room", RtcRole::Publisher, now)
            .unwrap();
        assert_eq!(bundle.token, again.token);
        let other = broker()
            .rtc_token(user, "rtc_other", RtcRole::Publisher, now)
            .unwrap();
        assert_ne!(bundle.token, other.token);
    }

    #[test]
    fn pubsub_token_carries_wildcard_capability_for_one_hour() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let bundle = broker().pubsub_token(user, now).unwrap();

        let mut validation = Validation::default();
        validation.validate_exp = false;
        let decoded = decode::<PubsubClaims>(
            &bundle.token,
            &DecodingKey::from_secret(b"keysecret"),
            &validation,
        )
        .expect("token must verify against the key secret");

        assert_eq!(decoded.claims.sub, user.to_string());
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
        assert_eq!(
            decoded.claims.capability,
            json!({ "*": ["subscribe", "publish", "presence"] })
        );
    }
}

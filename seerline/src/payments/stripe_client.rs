use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimal Stripe client built on reqwest. Covers exactly what the core
/// needs: payment intents for wallet top-ups, transfers for reader
/// payouts, and webhook signature verification.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub amount: Option<i64>,
    pub status: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct StripeTransfer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(PAYMENT_TIMEOUT).build()?;
        Ok(Self {
            http,
            secret_key,
            webhook_secret,
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (error_type, error_code, error_param, error_message) =
            match serde_json::from_str::<StripeErrorEnvelope>(&body) {
                Ok(envelope) => {
                    let details = envelope.error;
                    (details.type_, details.code, details.param, details.message)
                }
                Err(_) => (None, None, None, None),
            };

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?error_type,
            stripe_error_code = ?error_code,
            stripe_error_param = ?error_param,
            stripe_error_message = ?error_message,
            context = %context,
            "stripe api request failed"
        );

        anyhow::bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    fn to_minor_units(amount: Decimal) -> Result<i64> {
        (amount * Decimal::from(100))
            .trunc()
            .to_i64()
            .ok_or_else(|| anyhow::anyhow!("amount out of range for minor units"))
    }

    /// Creates a PaymentIntent for a wallet top-up and returns it with the
    /// client secret the frontend confirms against.
    /// https://stripe.com/docs/api/payment_intents/create
    pub async fn create_payment_intent(
        &self,
        amount: Decimal,
        user_id: Uuid,
    ) -> Result<StripePaymentIntent> {
        let body = [
            ("amount", Self::to_minor_units(amount)?.to_string()),
            ("currency", "usd".to_string()),
            ("metadata[user_id]", user_id.to_string()),
            ("metadata[purpose]", "wallet_deposit".to_string()),
        ];

        let resp = self
            .http
            .post("https://api.stripe.com/v1/payment_intents")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create payment intent").await?;

        let parsed: StripePaymentIntent = resp.json().await?;
        Ok(parsed)
    }

    /// Moves pending reader earnings to their connected account.
    /// https://stripe.com/docs/api/transfers/create
    pub async fn create_transfer(
        &self,
        amount: Decimal,
        destination_account: &str,
        reader_id: Uuid,
    ) -> Result<StripeTransfer> {
        let body = [
            ("amount", Self::to_minor_units(amount)?.to_string()),
            ("currency", "usd".to_string()),
            ("destination", destination_account.to_string()),
            ("metadata[reader_id]", reader_id.to_string()),
        ];

        let resp = self
            .http
            .post("https://api.stripe.com/v1/transfers")
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create transfer").await?;

        let parsed: StripeTransfer = resp.json().await?;
        Ok(parsed)
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            if let Some(rest) = part.strip_prefix("t=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| anyhow::anyhow!("missing timestamp in stripe-signature"))?;
        let signature =
            signature.ok_or_else(|| anyhow::anyhow!("missing v1 in stripe-signature"))?;

        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())?;
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    pub fn extract_payment_intent(event: &StripeEvent) -> Option<StripePaymentIntent> {
        serde_json::from_value(event.data.object.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client() -> StripeClient {
        StripeClient::new("sk_test_secret".to_string(), "whsec_test".to_string()).unwrap()
    }

    fn sign(payload: &[u8], timestamp: &str, secret: &str) -> String {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn minor_units_are_exact_for_two_decimal_amounts() {
        assert_eq!(StripeClient::to_minor_units(dec!(15.00)).unwrap(), 1500);
        assert_eq!(StripeClient::to_minor_units(dec!(2.10)).unwrap(), 210);
        assert_eq!(StripeClient::to_minor_units(dec!(0.01)).unwrap(), 1);
    }

    #[test]
    fn webhook_signature_round_trips() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1","amount":1500,"status":"succeeded"}}}"#;
        let signature = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={}", signature);

        let event = client()
            .verify_webhook_signature(payload, &header)
            .expect("valid signature must verify");
        assert_eq!(event.type_, "payment_intent.succeeded");

        let intent = StripeClient::extract_payment_intent(&event).unwrap();
        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.amount, Some(1500));
    }

    #[test]
    fn webhook_rejects_a_tampered_payload() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{}}}"#;
        let signature = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={}", signature);

        let tampered = br#"{"id":"evt_2","type":"payment_intent.succeeded","data":{"object":{}}}"#;
        assert!(client().verify_webhook_signature(tampered, &header).is_err());
    }

    #[test]
    fn webhook_rejects_a_malformed_signature_header() {
        let payload = br#"{}"#;
        assert!(client().verify_webhook_signature(payload, "v1=deadbeef").is_err());
        assert!(client().verify_webhook_signature(payload, "t=123").is_err());
    }
}

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::{error, warn};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_RETRIES: u32 = 5;

/// At-least-once fan-out to the external pub/sub service. Ordering is only
/// whatever the service provides within a single channel.
#[automock]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &str, data: serde_json::Value) -> Result<()>;
}

/// REST publisher for the pub/sub collaborator. Retries transient failures
/// with doubling backoff before giving up.
pub struct PubSubHttpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PubSubHttpClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(PUBLISH_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    async fn publish_once(
        &self,
        channel: &str,
        event: &str,
        data: &serde_json::Value,
    ) -> Result<()> {
        let (key_name, key_secret) = self
            .api_key
            .split_once(':')
            .unwrap_or((self.api_key.as_str(), ""));

        let resp = self
            .http
            .post(format!("{}/channels/{}/messages", self.base_url, channel))
            .basic_auth(key_name, Some(key_secret))
            .json(&json!({ "name": event, "data": data }))
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("pub/sub publish failed with status {}", resp.status());
        }

        Ok(())
    }
}

#[async_trait]
impl EventPublisher for PubSubHttpClient {
    async fn publish(&self, channel: &str, event: &str, data: serde_json::Value) -> Result<()> {
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 0..=MAX_RETRIES {
            match self.publish_once(channel, event, &data).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < MAX_RETRIES => {
                    warn!(
                        %channel,
                        %event,
                        attempt,
                        "pub/sub publish failed, retrying: {err}"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(err) => {
                    error!(%channel, %event, "pub/sub publish exhausted retries: {err}");
                    return Err(err);
                }
            }
        }

        unreachable!("retry loop always returns")
    }
}

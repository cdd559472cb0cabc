use super::{Credentials, Publisher};
use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

/// Posts statuses to a Mastodon-compatible `/api/v1/statuses` endpoint.
#[derive(Clone)]
pub struct StatusPublisher {
    endpoint: String,
    token: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl StatusPublisher {
    pub fn new(creds: Credentials) -> Self {
        Self {
            endpoint: format!("{}/api/v1/statuses", creds.api_base),
            token: creds.access_token,
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Publisher for StatusPublisher {
    async fn publish(&self, status: &str) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.token)
                .timeout(self.timeout)
                .form(&[("status", status)])
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status() {
                    Ok(_) => {
                        metrics::counter!("posts_published_total").increment(1);
                        return Ok(());
                    }
                    Err(e) => anyhow!("status post HTTP error: {e}"),
                },
                Err(e) => anyhow!("status post request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(attempt, error = %err, "status post failed, retrying");
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

// crates/askbridge/src/llm/http_client.rs
// HTTP transport for chat-completion endpoints with bounded retry

use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

use crate::utils::truncate;

/// Retry attempts after the first request for transient failures
const DEFAULT_MAX_RETRIES: u32 = 3;
/// First backoff; doubles on every retry
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Error bodies are cut to this many bytes before they reach logs or errors
const MAX_ERROR_BODY: usize = 500;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// 429 and 5xx are worth retrying; everything else is final
pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Shared HTTP client for chat-completion calls
pub struct LlmHttpClient {
    client: Client,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for LlmHttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }
}

impl LlmHttpClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            request_timeout,
            connect_timeout,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// POST a JSON body with Bearer auth, retrying transient failures.
    /// Returns the response body as text on success.
    pub async fn post_json(
        &self,
        request_id: &str,
        url: &str,
        api_key: &str,
        body: String,
    ) -> Result<String> {
        let mut retries = 0;

        loop {
            let sent = self
                .client
                .post(url)
                .bearer_auth(api_key)
                .header("Content-Type", "application/json")
                .body(body.clone())
                .send()
                .await;

            let backoff = self.retry.backoff(retries);
            match sent {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }

                    let error_body = response.text().await.unwrap_or_default();
                    let error_body = truncate(&error_body, MAX_ERROR_BODY);
                    if retries < self.retry.max_retries && is_transient_status(status) {
                        warn!(
                            request_id = %request_id,
                            status = %status,
                            error = %error_body,
                            "Transient API error, retrying in {:?}",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        retries += 1;
                        continue;
                    }
                    return Err(anyhow!("API error {}: {}", status, error_body));
                }
                Err(e) => {
                    // Only connect/timeout errors are safe to resend
                    if retries < self.retry.max_retries && (e.is_connect() || e.is_timeout()) {
                        warn!(
                            request_id = %request_id,
                            error = %e,
                            "Request failed (connect/timeout), retrying in {:?}",
                            backoff
                        );
                        tokio::time::sleep(backoff).await;
                        retries += 1;
                        continue;
                    }
                    return Err(anyhow!("Request failed after {} retries: {}", retries, e));
                }
            }
        }
    }
}

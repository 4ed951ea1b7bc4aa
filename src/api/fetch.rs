//! Retrying JSON fetch client for the upstream market-data API.
//!
//! Only HTTP-level 429 and 5xx responses are retried. Transport failures
//! (DNS, connect, timeout) carry no status and are surfaced immediately.

use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("upstream still failing with {status} after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        status: u16,
        body: String,
    },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("invalid JSON from upstream: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status reported by the upstream, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Upstream { status, .. } | FetchError::RetriesExhausted { status, .. } => {
                Some(*status)
            }
            FetchError::Network(_) | FetchError::Decode(_) => None,
        }
    }
}

/// Backoff settings for a [`FetchClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Wait before re-issuing a request whose attempt number `attempt` failed.
    ///
    /// `base * 2^attempt`, lengthened (never shortened) by a server hint.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let backoff = self.base_delay.saturating_mul(factor);
        match retry_after {
            Some(hint) => backoff.max(hint),
            None => backoff,
        }
    }
}

/// Result of a single request, before any retry decision is made.
#[derive(Debug)]
pub enum Attempt {
    Success(Value),
    Failed(FailedAttempt),
}

#[derive(Debug)]
pub struct FailedAttempt {
    pub status: StatusCode,
    pub retry_after: Option<Duration>,
    pub body: String,
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Parses a delay-seconds `Retry-After` value. HTTP-date forms are ignored.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(client: Client, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, FetchError> {
        self.get_json_with_retries(path, params, self.policy.max_retries)
            .await
    }

    pub async fn get_json_with_retries(
        &self,
        path: &str,
        params: &[(String, String)],
        max_retries: u32,
    ) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            let failed = match self.send_once(&url, params).await? {
                Attempt::Success(json) => return Ok(json),
                Attempt::Failed(failed) => failed,
            };

            if !is_retryable(failed.status) {
                debug!(status = failed.status.as_u16(), %url, "Non-retryable upstream status");
                return Err(FetchError::Upstream {
                    status: failed.status.as_u16(),
                    body: failed.body,
                });
            }

            if attempt >= max_retries {
                warn!(
                    status = failed.status.as_u16(),
                    attempts = attempt + 1,
                    %url,
                    "Giving up on upstream request"
                );
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    status: failed.status.as_u16(),
                    body: failed.body,
                });
            }

            let delay = self.policy.delay_for(attempt, failed.retry_after);
            warn!(
                status = failed.status.as_u16(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                %url,
                "Retryable upstream status, backing off"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, url: &str, params: &[(String, String)]) -> Result<Attempt, FetchError> {
        debug!("Sending request to {}", url);
        let response = self
            .client
            .get(url)
            .query(params)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await.map_err(FetchError::Network)?;
            let json = serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))?;
            return Ok(Attempt::Success(json));
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "Failed to read upstream error body");
                String::new()
            }
        };

        Ok(Attempt::Failed(FailedAttempt {
            status,
            retry_after,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (0..4).map(|n| policy.delay_for(n, None).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000]);
    }

    #[test]
    fn retry_after_only_lengthens_the_wait() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
        // 2s backoff beats a 1s hint
        assert_eq!(
            policy.delay_for(2, Some(Duration::from_secs(1))),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn huge_attempt_numbers_saturate() {
        let policy = RetryPolicy::default();
        assert!(policy.delay_for(64, None) >= policy.delay_for(31, None));
    }

    #[test]
    fn classifies_statuses() {
        for code in [429u16, 500, 502, 503, 504] {
            assert!(is_retryable(StatusCode::from_u16(code).unwrap()), "{code}");
        }
        for code in [400u16, 401, 403, 404, 422] {
            assert!(!is_retryable(StatusCode::from_u16(code).unwrap()), "{code}");
        }
    }

    #[test]
    fn parses_retry_after_seconds() {
        assert_eq!(parse_retry_after("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_retry_after(" 1.5 "), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("0"), None);
        assert_eq!(parse_retry_after("-3"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = FetchClient::new(Client::new(), "http://localhost:1/api/v3/", RetryPolicy::default());
        assert_eq!(client.base_url(), "http://localhost:1/api/v3");
    }

    #[test]
    fn only_http_failures_report_a_status() {
        let err = FetchError::Upstream {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(FetchError::Decode("x".into()).status(), None);
    }
}

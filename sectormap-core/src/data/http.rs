//! Blocking HTTP plumbing shared by the listing and price providers:
//! client construction and the retry loop around the circuit breaker.

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Retry schedule for a provider request: `max_retries` extra attempts with
/// exponential backoff starting at `base_delay`. A 429 `retry-after` longer
/// than the backoff is honoured up to `max_rate_limit_wait`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_rate_limit_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_rate_limit_wait: Duration::from_secs(60),
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, DataError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))
}

/// Send a request built by `make` until it succeeds, the retries run out,
/// or the breaker opens.
pub(crate) fn send_with_retry(
    breaker: &CircuitBreaker,
    policy: RetryPolicy,
    what: &str,
    make: impl Fn() -> RequestBuilder,
) -> Result<Response, DataError> {
    let mut last_error = None;
    let mut rate_limit_wait: Option<Duration> = None;

    for attempt in 0..=policy.max_retries {
        if !breaker.is_allowed() {
            tracing::warn!(
                what,
                remaining = ?breaker.remaining_cooldown(),
                "circuit breaker open, request refused"
            );
            return Err(DataError::CircuitBreakerTripped);
        }

        if attempt > 0 {
            let backoff = policy.base_delay * 2u32.pow(attempt - 1);
            let delay = rate_limit_wait.take().map_or(backoff, |wait| wait.max(backoff));
            tracing::debug!(what, attempt, ?delay, "retrying provider request");
            std::thread::sleep(delay);
        }

        match make().send() {
            Ok(resp) => {
                let status = resp.status();

                if status == StatusCode::FORBIDDEN {
                    breaker.trip();
                    return Err(DataError::CircuitBreakerTripped);
                }

                if status == StatusCode::TOO_MANY_REQUESTS {
                    breaker.record_failure();
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    rate_limit_wait =
                        Some(Duration::from_secs(retry_after).min(policy.max_rate_limit_wait));
                    last_error = Some(DataError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                    continue;
                }

                if status == StatusCode::UNAUTHORIZED {
                    return Err(DataError::AuthenticationRequired(format!(
                        "{what} rejected the request"
                    )));
                }

                if !status.is_success() {
                    breaker.record_failure();
                    last_error = Some(DataError::Other(format!("HTTP {status} from {what}")));
                    continue;
                }

                breaker.record_success();
                return Ok(resp);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                return Err(DataError::NetworkUnreachable(e.to_string()));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
}

//! HTTP retry helper for transient errors.
//!
//! Provider adapters call [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly so every outbound call gets
//! bounded retry with exponential backoff on transient failures
//! (timeouts, connection resets, HTTP 429, HTTP 5xx).
//!
//! # Usage
//!
//! ```ignore
//! use crate::retry;
//!
//! // GET with query params
//! let body = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::ProviderError;

/// Maximum number of retry attempts for transient HTTP errors.
///
/// With exponential backoff from [`BASE_DELAY_MS`] (500ms, 1s, 2s) the
/// total wait before giving up is 3.5 seconds — kept short because
/// domain-service callers are interactive.
const MAX_RETRIES: u32 = 3;

/// Backoff delay before the first retry, doubled on each attempt.
const BASE_DELAY_MS: u64 = 500;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Retry behaviour
///
/// Retries up to [`MAX_RETRIES`] times with exponential backoff on
/// connection errors, timeouts, HTTP 429, and HTTP 5xx. Does **not**
/// retry other 4xx — those are permanent and surface as
/// [`ProviderError::Status`] carrying the parsed body (several backends
/// report domain outcomes such as "no route" inside 4xx bodies).
///
/// # Errors
///
/// Returns [`ProviderError::RateLimited`] when 429 persists past all
/// retries, [`ProviderError::Http`] for exhausted transport failures,
/// [`ProviderError::Status`] for non-retryable statuses, and
/// [`ProviderError::Parse`] when a successful body is not valid JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(&build_request).await?;
    let status = response.status();
    let url = response.url().to_string();

    let text = response.text().await?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => {
            if status.is_success() {
                Ok(value)
            } else {
                Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: Some(value),
                })
            }
        }
        Err(e) if status.is_success() => {
            log::error!(
                "JSON parse failed for {url}: {e} (received {} bytes)",
                text.len()
            );
            Err(ProviderError::Parse {
                message: format!("invalid JSON from {url}: {e}"),
            })
        }
        Err(_) => Err(ProviderError::Status {
            status: status.as_u16(),
            body: None,
        }),
    }
}

/// Core retry loop: sends the request, retrying transient failures.
///
/// Returns the response for any status except retry-exhausted 429/5xx;
/// non-retryable statuses are passed through for the caller to classify.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(build_request: &F) -> Result<reqwest::Response, ProviderError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_millis(BASE_DELAY_MS << (attempt - 1));
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    continue;
                }
                return Err(ProviderError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP 429 (rate limited)");
                        continue;
                    }
                    return Err(ProviderError::RateLimited);
                }

                if status.is_server_error() {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status} (server error)");
                        continue;
                    }
                    return Err(ProviderError::Status {
                        status: status.as_u16(),
                        body: None,
                    });
                }

                return Ok(response);
            }
        }
    }

    unreachable!("retry loop exited without returning")
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

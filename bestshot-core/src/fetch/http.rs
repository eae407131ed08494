//! HTTP image fetcher with retry, content-type validation and size limits.
//!
//! ## Features
//!
//! - Fixed-delay retry on transient errors (timeouts, connection failures,
//!   5xx, 429), at most `max_retries` retries after the first attempt
//! - Immediate failure on other statuses, non-image content types, oversized
//!   payloads and undecodable bodies
//! - The body is streamed chunk by chunk and the read stops as soon as it
//!   passes `max_image_bytes`, whether or not a `Content-Length` was sent
//! - Full observability with tracing instrumentation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use image::RgbImage;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use super::{decode_image, ImageSource};
use crate::config::FetchConfig;
use crate::error::{BestshotError, FetchError, Result};

/// Production [`ImageSource`] backed by `reqwest`.
pub struct HttpImageFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpImageFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom configuration.
    #[instrument(level = "debug", skip_all, fields(
        timeout_ms = config.timeout.as_millis() as u64,
        max_retries = config.max_retries
    ))]
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                BestshotError::HttpClient(format!("Failed to create HTTP client: {e}"))
            })?;

        debug!("HTTP image fetcher created");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Constant-interval backoff; the attempt budget is enforced per attempt.
    fn build_backoff(&self) -> ExponentialBackoff {
        let delay = self.config.retry_delay;
        ExponentialBackoff {
            current_interval: delay,
            initial_interval: delay,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: delay,
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Turn a failure into a retry decision for attempt number `attempt` (1-based).
    fn classify(
        &self,
        err: FetchError,
        transient: bool,
        attempt: u32,
    ) -> backoff::Error<FetchError> {
        if transient && attempt <= self.config.max_retries {
            backoff::Error::transient(err)
        } else {
            backoff::Error::permanent(err)
        }
    }

    /// A single request attempt.
    async fn fetch_attempt(
        &self,
        url: &str,
        attempt: u32,
    ) -> std::result::Result<RgbImage, backoff::Error<FetchError>> {
        let start = Instant::now();
        let limit = self.config.max_image_bytes;

        let mut response = self.client.get(url).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            let transient = is_transient_error(&e);
            debug!(error = %e, latency_ms, transient, attempt, "Request failed");
            self.classify(request_error(e), transient, attempt)
        })?;

        let status = response.status();
        debug!(status = %status, attempt, "Received HTTP response");

        if !status.is_success() {
            let err = FetchError::HttpStatus {
                status: status.as_u16(),
            };
            return Err(self.classify(err, is_transient_status(status), attempt));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let is_image = content_type
            .as_deref()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            debug!(content_type = ?content_type, "Skipping non-image response");
            return Err(backoff::Error::permanent(FetchError::InvalidContentType {
                content_type,
            }));
        }

        if let Some(size) = response.content_length().filter(|&size| size > limit) {
            return Err(backoff::Error::permanent(FetchError::TooLarge { size, limit }));
        }

        let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            let transient = is_transient_error(&e);
            debug!(error = %e, transient, attempt, "Failed to read response body");
            self.classify(request_error(e), transient, attempt)
        })? {
            let size = (body.len() + chunk.len()) as u64;
            if size > limit {
                debug!(size, limit, "Body exceeded size limit, aborting read");
                return Err(backoff::Error::permanent(FetchError::TooLarge { size, limit }));
            }
            body.extend_from_slice(&chunk);
        }

        let image = decode_image(&body).map_err(backoff::Error::permanent)?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            width = image.width(),
            height = image.height(),
            "Image fetched and decoded"
        );
        Ok(image)
    }
}

#[async_trait]
impl ImageSource for HttpImageFetcher {
    /// Fetch and decode one image, retrying transient failures.
    #[instrument(level = "debug", skip(self), fields(max_retries = self.config.max_retries))]
    async fn fetch(&self, url: &str) -> std::result::Result<RgbImage, FetchError> {
        let start = Instant::now();
        let mut attempt = 0u32;

        let result = retry_notify(
            self.build_backoff(),
            || {
                attempt += 1;
                let current = attempt;
                async move { self.fetch_attempt(url, current).await }
            },
            |err: FetchError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await;

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(total_latency_ms, "Fetch succeeded"),
            Err(e) => info!(error = %e, total_latency_ms, "Fetch failed"),
        }

        result
    }
}

fn request_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(error.to_string())
    } else {
        FetchError::Network(error.to_string())
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

/// Check if an HTTP status code indicates a transient error.
///
/// Server errors and rate limiting are retried; every other client error is final.
pub fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_status_codes() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_transient_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::FORBIDDEN));
        assert!(!is_transient_status(StatusCode::GONE));
    }

    #[test]
    fn test_create_fetcher() {
        let fetcher = HttpImageFetcher::new().unwrap();
        assert_eq!(fetcher.config().max_retries, 1);
        assert_eq!(fetcher.config().retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_retry_budget() {
        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            max_retries: 2,
            ..Default::default()
        })
        .unwrap();

        let err = || FetchError::HttpStatus { status: 503 };
        assert!(matches!(
            fetcher.classify(err(), true, 1),
            backoff::Error::Transient { .. }
        ));
        assert!(matches!(
            fetcher.classify(err(), true, 2),
            backoff::Error::Transient { .. }
        ));
        assert!(matches!(
            fetcher.classify(err(), true, 3),
            backoff::Error::Permanent(_)
        ));
        assert!(matches!(
            fetcher.classify(err(), false, 1),
            backoff::Error::Permanent(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_retry() {
        let fetcher = HttpImageFetcher::with_config(FetchConfig {
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap();

        let start = Instant::now();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        // A single retry would sleep for the full delay.
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

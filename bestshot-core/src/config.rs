//! Selection and fetch configuration.
//!
//! Defaults match the thresholds the enrichment pipeline has always used.
//! `SelectionConfig::from_env()` and `FetchConfig::from_env()` overlay
//! `BESTSHOT_*` environment variables.
//!
//! The two are independent: a selector reads only [`SelectionConfig`], while
//! [`FetchConfig`] belongs to the `HttpImageFetcher` the selector is built on.

use std::time::Duration;

use crate::error::{BestshotError, Result};

/// Default minimum Laplacian variance for a candidate to be accepted.
pub const DEFAULT_LAPLACIAN_THRESHOLD: f64 = 100.0;

/// Default maximum Hamming distance for a placeholder match.
pub const DEFAULT_HAMMING_THRESHOLD: u32 = 10;

/// Upper bound of the accepted `laplacian_threshold` domain.
pub const MAX_LAPLACIAN_THRESHOLD: f64 = 500.0;

/// Upper bound of the accepted `hamming_threshold` domain (64-bit fingerprints).
pub const MAX_HAMMING_THRESHOLD: u32 = 64;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_MAX_IMAGE_BYTES: u64 = 25 * 1024 * 1024;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;
const DEFAULT_USER_AGENT: &str = concat!("bestshot/", env!("CARGO_PKG_VERSION"));

/// Configuration for fetching a single image over HTTP.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt, for transient failures only.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Largest accepted response body.
    pub max_image_bytes: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Configuration for a selection call.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Minimum sharpness (Laplacian variance) a cropped candidate must reach.
    pub laplacian_threshold: f64,
    /// A candidate within this Hamming distance of any placeholder is rejected.
    pub hamming_threshold: u32,
    /// Candidates evaluated at once by the concurrent selector.
    pub max_concurrent_fetches: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            laplacian_threshold: DEFAULT_LAPLACIAN_THRESHOLD,
            hamming_threshold: DEFAULT_HAMMING_THRESHOLD,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl FetchConfig {
    /// Load fetch settings from environment variables, falling back to defaults.
    ///
    /// Recognized: `BESTSHOT_MAX_RETRIES`, `BESTSHOT_RETRY_DELAY_MS`,
    /// `BESTSHOT_FETCH_TIMEOUT_SECS`, `BESTSHOT_MAX_IMAGE_BYTES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let max_retries = lookup("BESTSHOT_MAX_RETRIES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_retries);

        let retry_delay = parse("BESTSHOT_RETRY_DELAY_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);

        let timeout = parse("BESTSHOT_FETCH_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_image_bytes = parse("BESTSHOT_MAX_IMAGE_BYTES").unwrap_or(defaults.max_image_bytes);

        Self {
            timeout,
            max_retries,
            retry_delay,
            max_image_bytes,
            ..defaults
        }
    }
}

impl SelectionConfig {
    /// Load thresholds from environment variables, falling back to defaults.
    ///
    /// Recognized: `BESTSHOT_LAPLACIAN_THRESHOLD`, `BESTSHOT_HAMMING_THRESHOLD`,
    /// `BESTSHOT_MAX_CONCURRENT_FETCHES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let laplacian_threshold = lookup("BESTSHOT_LAPLACIAN_THRESHOLD")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.laplacian_threshold);

        let hamming_threshold = lookup("BESTSHOT_HAMMING_THRESHOLD")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.hamming_threshold);

        let max_concurrent_fetches = lookup("BESTSHOT_MAX_CONCURRENT_FETCHES")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_concurrent_fetches);

        Self {
            laplacian_threshold,
            hamming_threshold,
            max_concurrent_fetches,
        }
    }

    /// Check every value against its documented domain.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_LAPLACIAN_THRESHOLD).contains(&self.laplacian_threshold) {
            return Err(BestshotError::InvalidConfig(format!(
                "laplacian_threshold must be within 0-{MAX_LAPLACIAN_THRESHOLD}, got {}",
                self.laplacian_threshold
            )));
        }
        if self.hamming_threshold > MAX_HAMMING_THRESHOLD {
            return Err(BestshotError::InvalidConfig(format!(
                "hamming_threshold must be within 0-{MAX_HAMMING_THRESHOLD}, got {}",
                self.hamming_threshold
            )));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(BestshotError::InvalidConfig(
                "max_concurrent_fetches must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

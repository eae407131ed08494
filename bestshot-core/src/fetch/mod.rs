//! Image retrieval.
//!
//! Candidates are retrieved through the [`ImageSource`] trait. The production
//! implementation is [`HttpImageFetcher`]; [`MockImageSource`] serves canned
//! responses for tests.
//!
//! ## Fallback
//!
//! [`fetch_with_fallback`] drives a [`FetchPlan`]: the normalized URL is tried
//! first, then the original URL if they differ, then the candidate is given up.

#[cfg(feature = "network")]
mod http;
mod mock;

#[cfg(feature = "network")]
pub use http::{is_transient_error, is_transient_status, HttpImageFetcher};
pub use mock::MockImageSource;

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tracing::debug;

use crate::error::FetchError;
use crate::normalize::normalize;

/// A place candidate images can be retrieved from.
///
/// Implementations must be thread-safe (`Send + Sync`) and handle retries
/// internally; a returned error is final for that URL.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Retrieve and decode the image at `url` into 3-channel RGB.
    async fn fetch(&self, url: &str) -> Result<RgbImage, FetchError>;
}

#[async_trait]
impl<T: ImageSource + ?Sized> ImageSource for &T {
    async fn fetch(&self, url: &str) -> Result<RgbImage, FetchError> {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<T: ImageSource + ?Sized> ImageSource for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<RgbImage, FetchError> {
        (**self).fetch(url).await
    }
}

/// Decode an encoded image payload, dropping any alpha channel.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, FetchError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|e| FetchError::DecodeFailed(e.to_string()))
}

/// A decoded image together with the URL that produced it.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub image: RgbImage,
    pub url: String,
}

/// Which URL to try next for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// Try the normalized URL.
    TryCanonical { canonical: String, original: String },
    /// The normalized URL failed; try the URL exactly as supplied.
    TryOriginal { original: String },
    /// Nothing left to try.
    Failed,
}

impl FetchPlan {
    pub fn new(original: &str) -> Self {
        Self::TryCanonical {
            canonical: normalize(original),
            original: original.to_string(),
        }
    }

    /// URL for the current state, `None` once failed.
    pub fn current_url(&self) -> Option<&str> {
        match self {
            Self::TryCanonical { canonical, .. } => Some(canonical.as_str()),
            Self::TryOriginal { original } => Some(original.as_str()),
            Self::Failed => None,
        }
    }

    /// Advance after the current URL failed.
    ///
    /// When normalization left the URL untouched there is no distinct original
    /// to fall back to, so the plan fails straight away.
    pub fn on_failure(self) -> Self {
        match self {
            Self::TryCanonical {
                canonical,
                original,
            } if canonical != original => Self::TryOriginal { original },
            _ => Self::Failed,
        }
    }
}

/// Fetch a candidate, falling back from the normalized to the original URL.
///
/// Returns the last fetch error when every planned URL failed.
pub async fn fetch_with_fallback<S>(source: &S, url: &str) -> Result<FetchedImage, FetchError>
where
    S: ImageSource + ?Sized,
{
    let mut plan = FetchPlan::new(url);
    let mut last_error = None;

    while let Some(current) = plan.current_url().map(str::to_owned) {
        match source.fetch(&current).await {
            Ok(image) => return Ok(FetchedImage { image, url: current }),
            Err(e) => {
                debug!(url = %current, error = %e, "Fetch failed");
                last_error = Some(e);
                plan = plan.on_failure();
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::Network(format!("no URL to fetch for {url}"))))
}

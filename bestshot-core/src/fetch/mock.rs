//! In-memory image source for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

use super::{decode_image, ImageSource};
use crate::error::FetchError;

/// Serves canned responses keyed by exact URL and records every request.
///
/// URLs with no configured response fail with HTTP 404.
#[derive(Debug, Default)]
pub struct MockImageSource {
    responses: HashMap<String, Result<RgbImage, FetchError>>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<String>>,
}

impl MockImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `image` for `url`.
    pub fn with_image(mut self, url: impl Into<String>, image: RgbImage) -> Self {
        self.responses.insert(url.into(), Ok(image));
        self
    }

    /// Serve an encoded payload for `url`, decoded the same way a network
    /// response would be.
    pub fn with_bytes(mut self, url: impl Into<String>, bytes: &[u8]) -> Self {
        self.responses.insert(url.into(), decode_image(bytes));
        self
    }

    /// Fail every request for `url` with `error`.
    pub fn with_error(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// Hold every response for `url` back by `delay`.
    pub fn with_delay(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl ImageSource for MockImageSource {
    async fn fetch(&self, url: &str) -> Result<RgbImage, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }

        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus { status: 404 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[tokio::test]
    async fn test_unknown_url_is_not_found() {
        let source = MockImageSource::new();
        assert_eq!(
            source.fetch("https://example.com/x.png").await,
            Err(FetchError::HttpStatus { status: 404 })
        );
    }

    #[tokio::test]
    async fn test_records_requests_in_order() {
        let image = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let source = MockImageSource::new().with_image("a", image.clone());

        assert_eq!(source.fetch("a").await, Ok(image));
        let _ = source.fetch("b").await;
        assert_eq!(source.requests(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_fail_to_decode() {
        let source = MockImageSource::new().with_bytes("a", b"\x89PNG\r\n\x1a\ntruncated");
        assert!(matches!(
            source.fetch("a").await,
            Err(FetchError::DecodeFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_delay_holds_response_back() {
        let image = RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]));
        let source = MockImageSource::new()
            .with_image("slow", image.clone())
            .with_delay("slow", Duration::from_millis(50));

        let start = std::time::Instant::now();
        assert_eq!(source.fetch("slow").await, Ok(image));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}

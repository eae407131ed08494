//! Bestshot Core - best-candidate product image selection
//!
//! When a product image cannot be taken from its authoritative source, the
//! enrichment pipeline falls back to a pool of externally supplied candidate
//! URLs of unknown quality. This crate picks the single best of them.
//!
//! # Pipeline
//!
//! For every candidate, in caller order:
//!
//! 1. Strip transient query parameters from the URL ([`normalize`])
//! 2. Fetch and decode, falling back to the original URL ([`fetch`])
//! 3. Reject known "no photo available" graphics ([`placeholder`])
//! 4. Trim whitespace borders and reject blurry images ([`quality`])
//! 5. Keep the largest survivor, sharpness breaking ties ([`select`])
//!
//! # Example
//!
//! ```no_run
//! use bestshot_core::{
//!     load_placeholders, FetchConfig, HttpImageFetcher, ImageSelector, SelectionConfig,
//! };
//!
//! # async fn example() -> bestshot_core::Result<()> {
//! // Load once at start-up, then share by reference
//! let corpus = load_placeholders("assets/placeholders");
//!
//! let fetcher = HttpImageFetcher::with_config(FetchConfig::from_env())?;
//! let selector = ImageSelector::with_config(fetcher, SelectionConfig::from_env())?;
//!
//! let candidates = vec![
//!     "https://images.example.com/upc/0001.jpg?cache=123".to_string(),
//!     "https://cdn.example.net/p/0001_large.png".to_string(),
//! ];
//! let result = selector.select_best_image(&candidates, &corpus).await;
//! if let Some(url) = result.url() {
//!     println!("Selected {url}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod placeholder;
pub mod quality;
pub mod select;

// Re-export main types for convenience
pub use config::{FetchConfig, SelectionConfig};
pub use error::{BestshotError, FetchError, Result};
pub use fetch::{decode_image, fetch_with_fallback, FetchPlan, ImageSource, MockImageSource};
pub use normalize::normalize;
pub use placeholder::{
    hamming_distance, is_placeholder, load_placeholders, Fingerprint, FingerprintAlgorithm,
    Fingerprinter, PlaceholderCorpus,
};
pub use quality::{crop_whitespace, sharpness};
pub use select::{
    select_best_image, ImageSelector, QualityScore, Rejection, SelectedImage, SelectionResult,
};

// Network-dependent exports
#[cfg(feature = "network")]
pub use fetch::HttpImageFetcher;

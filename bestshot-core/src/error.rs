use thiserror::Error;

#[derive(Error, Debug)]
pub enum BestshotError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Why a single image fetch failed.
///
/// Every variant is a per-candidate rejection; none of them aborts a selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid content type: {content_type:?}")]
    InvalidContentType { content_type: Option<String> },

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Payload too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

pub type Result<T> = std::result::Result<T, BestshotError>;

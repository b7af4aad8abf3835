//! Fetch error types.

use emojiart_core::ResolveError;
use thiserror::Error;
use url::Url;

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while fetching or decoding a background.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned status {0}")]
    Status(u16),

    /// Reading a local file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The `data:` URI is malformed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The `file:` URL does not name a local path.
    #[error("Invalid file URL: {0}")]
    InvalidFileUrl(String),

    /// The URL scheme is not one we can fetch.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The response body exceeded the configured limit.
    #[error("Response too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Bytes received.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The bytes are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

impl FetchError {
    /// Convert into the core's resolution error for `url`.
    #[must_use]
    pub fn into_resolve_error(self, url: &Url) -> ResolveError {
        match self {
            Self::Decode(reason) => ResolveError::Decode(reason),
            other => ResolveError::Fetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

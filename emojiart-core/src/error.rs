//! Error types for EmojiArt operations.

use thiserror::Error;

use crate::EmojiId;

/// Result type for document operations.
pub type EmojiArtResult<T> = Result<T, EmojiArtError>;

/// Errors that can occur in document operations.
#[derive(Debug, Error)]
pub enum EmojiArtError {
    /// Emoji not found in the document.
    ///
    /// Mutating intents treat a missing target as a no-op; this variant is
    /// only returned by explicit lookups.
    #[error("Emoji not found: {0}")]
    NotFound(EmojiId),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bytes decoded but describe an impossible document.
    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Errors produced while resolving a background image.
///
/// These never escape as hard failures; the resolver records them in
/// [`FetchStatus::Failed`](crate::FetchStatus::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The bytes could not be retrieved.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// Address that was requested.
        url: String,
        /// Transport-level reason.
        reason: String,
    },

    /// The bytes were retrieved but are not a decodable image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// No async runtime was available to run the fetch.
    #[error("No async runtime available for background fetch")]
    NoRuntime,
}

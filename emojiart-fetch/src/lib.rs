//! # EmojiArt Fetch
//!
//! Concrete [`ImageFetcher`](emojiart_core::ImageFetcher) and
//! [`ImageDecoder`](emojiart_core::ImageDecoder) implementations for the
//! background resolver.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            BackgroundResolver               │
//! ├──────────────────────┬──────────────────────┤
//! │ UrlFetcher           │ RasterDecoder        │
//! │ http(s) / file / data│ png, jpeg, gif, webp │
//! └──────────────────────┴──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod image;

use std::sync::Arc;

use async_trait::async_trait;
use emojiart_core::{BackgroundResolver, ImageFetcher, ResolveError};
use url::Url;

pub use error::{FetchError, FetchResult};
pub use http::{FetchConfig, UrlFetcher};
pub use image::{decode_data_uri, ImageFormat, RasterDecoder};

/// Build a resolver wired to a [`UrlFetcher`] and a [`RasterDecoder`].
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn resolver(config: FetchConfig, decoder: RasterDecoder) -> FetchResult<BackgroundResolver> {
    let fetcher = UrlFetcher::new(config)?;
    Ok(BackgroundResolver::new(Arc::new(fetcher), Arc::new(decoder)))
}

/// Fetcher for hosts that edit documents without displaying them.
///
/// Every fetch fails immediately without touching the network or disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl ImageFetcher for OfflineFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResolveError> {
        tracing::debug!(%url, "Skipping background fetch while offline");
        Err(ResolveError::Fetch {
            url: url.to_string(),
            reason: "offline".to_string(),
        })
    }
}

/// Build a resolver that decodes embedded backgrounds but never fetches URLs.
#[must_use]
pub fn offline_resolver(decoder: RasterDecoder) -> BackgroundResolver {
    BackgroundResolver::new(Arc::new(OfflineFetcher), Arc::new(decoder))
}

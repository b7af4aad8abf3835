//! # Background Resolution
//!
//! Turns the document [`Background`] into a decoded image.
//!
//! ```text
//!            Url(a)                 success
//!   Idle ───────────▶ Fetching(a) ──────────▶ Idle   (image installed)
//!                          │
//!                          │ fetch/decode error
//!                          ▼
//!                      Failed(a)
//! ```
//!
//! Fetches run on Tokio tasks and report back over a channel; the owner of
//! the document applies completions with [`BackgroundResolver::apply`]. A
//! completion only takes effect if it belongs to the latest fetch and the
//! document background is still the address it was fetched for, so a slow
//! response can never overwrite a newer background.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use crate::{Background, ResolveError};

/// A decoded background image (RGBA8, row-major).
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecodedImage {
    /// Wrap decoded RGBA pixel data.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// RGBA pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Retrieves the raw bytes behind a background address.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the bytes at `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResolveError>;
}

/// Decodes raw image bytes.
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes` into an image.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Decode`] if the bytes are not a supported image.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ResolveError>;
}

/// Background fetch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing in flight.
    Idle,
    /// Fetching the given address.
    Fetching(Url),
    /// The last fetch of the given address failed.
    Failed(Url),
}

impl FetchStatus {
    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching(_))
    }

    /// The address that failed, if any.
    #[must_use]
    pub const fn failed_url(&self) -> Option<&Url> {
        match self {
            Self::Failed(url) => Some(url),
            _ => None,
        }
    }
}

/// Outcome of a background fetch, produced on a worker task.
#[derive(Debug)]
pub struct FetchCompletion {
    generation: u64,
    url: Url,
    result: Result<DecodedImage, ResolveError>,
}

impl FetchCompletion {
    /// The address that was fetched.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the fetch produced an image.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Resolves document backgrounds into images, at most one fetch at a time.
pub struct BackgroundResolver {
    fetcher: Arc<dyn ImageFetcher>,
    decoder: Arc<dyn ImageDecoder>,
    status: FetchStatus,
    image: Option<DecodedImage>,
    last_error: Option<ResolveError>,
    /// Bumped whenever an in-flight fetch is superseded.
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<FetchCompletion>,
    rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl fmt::Debug for BackgroundResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundResolver")
            .field("status", &self.status)
            .field("image", &self.image)
            .field("last_error", &self.last_error)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl BackgroundResolver {
    /// Create an idle resolver using the given capabilities.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ImageFetcher>, decoder: Arc<dyn ImageDecoder>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            decoder,
            status: FetchStatus::Idle,
            image: None,
            last_error: None,
            generation: 0,
            in_flight: None,
            tx,
            rx,
        }
    }

    /// Current fetch state.
    #[must_use]
    pub const fn status(&self) -> &FetchStatus {
        &self.status
    }

    /// The resolved image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    /// Why the last resolution failed, if it did.
    #[must_use]
    pub const fn last_error(&self) -> Option<&ResolveError> {
        self.last_error.as_ref()
    }

    /// React to the document background becoming `background`.
    ///
    /// URL backgrounds start a fetch (requires a Tokio runtime); embedded
    /// data is decoded synchronously; blank clears the image.
    pub fn background_changed(&mut self, background: &Background) {
        match background {
            Background::Url(url) => {
                if matches!(&self.status, FetchStatus::Fetching(current) if current == url) {
                    tracing::debug!("Fetch of {url} already in flight");
                    return;
                }
                self.supersede();
                self.image = None;
                self.last_error = None;
                self.start_fetch(url.clone());
            }
            Background::ImageData(data) => {
                self.supersede();
                self.status = FetchStatus::Idle;
                match self.decoder.decode(data) {
                    Ok(image) => {
                        self.image = Some(image);
                        self.last_error = None;
                    }
                    Err(e) => {
                        tracing::warn!("Embedded background could not be decoded: {e}");
                        self.image = None;
                        self.last_error = Some(e);
                    }
                }
            }
            Background::Blank => {
                self.supersede();
                self.status = FetchStatus::Idle;
                self.image = None;
                self.last_error = None;
            }
        }
    }

    /// Abort the in-flight fetch, if any, and return to idle.
    pub fn cancel(&mut self) {
        self.supersede();
        if self.status.is_fetching() {
            self.status = FetchStatus::Idle;
        }
    }

    /// Abort the in-flight fetch and invalidate any completion it produced.
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.in_flight.take() {
            tracing::debug!("Cancelling background fetch");
            handle.abort();
        }
    }

    fn start_fetch(&mut self, url: Url) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Cannot fetch {url}: no Tokio runtime");
            self.last_error = Some(ResolveError::NoRuntime);
            self.status = FetchStatus::Failed(url);
            return;
        };

        tracing::debug!("Fetching background {url}");
        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let decoder = Arc::clone(&self.decoder);
        let tx = self.tx.clone();
        let task_url = url.clone();

        self.in_flight = Some(runtime.spawn(async move {
            // A panicking fetcher must still produce a completion, or the
            // status would stay `Fetching` forever.
            let fetched = AssertUnwindSafe(fetcher.fetch(&task_url))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!("Fetcher panicked while fetching {task_url}");
                    Err(ResolveError::Fetch {
                        url: task_url.to_string(),
                        reason: "fetcher panicked".to_string(),
                    })
                });
            let result = match fetched {
                Ok(bytes) => tokio::task::spawn_blocking(move || decoder.decode(&bytes))
                    .await
                    .unwrap_or_else(|e| Err(ResolveError::Decode(e.to_string()))),
                Err(e) => Err(e),
            };
            // The receiver lives as long as the resolver; a send error means
            // the resolver was dropped and nobody cares about the result.
            let _ = tx.send(FetchCompletion {
                generation,
                url: task_url,
                result,
            });
        }));
        self.status = FetchStatus::Fetching(url);
    }

    /// Apply a completion if it is still current for `background`.
    ///
    /// Returns `false` (and changes nothing) for stale completions.
    pub fn apply(&mut self, completion: FetchCompletion, background: &Background) -> bool {
        if completion.generation != self.generation
            || background.url() != Some(&completion.url)
        {
            tracing::debug!("Discarding stale fetch of {}", completion.url);
            return false;
        }

        self.in_flight = None;
        match completion.result {
            Ok(image) => {
                tracing::debug!(
                    "Background {} resolved ({}x{})",
                    completion.url,
                    image.width(),
                    image.height()
                );
                self.image = Some(image);
                self.last_error = None;
                self.status = FetchStatus::Idle;
            }
            Err(e) => {
                tracing::warn!("Background {} failed: {e}", completion.url);
                self.image = None;
                self.last_error = Some(e);
                self.status = FetchStatus::Failed(completion.url);
            }
        }
        true
    }

    /// Take a pending completion without waiting.
    pub fn try_next_completion(&mut self) -> Option<FetchCompletion> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next completion.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        self.rx.recv().await
    }
}

impl Drop for BackgroundResolver {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns the URL path bytes as the image "bytes".
    struct PathFetcher;

    #[async_trait]
    impl ImageFetcher for PathFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResolveError> {
            if url.path().contains("missing") {
                return Err(ResolveError::Fetch {
                    url: url.to_string(),
                    reason: "404".to_string(),
                });
            }
            Ok(url.path().as_bytes().to_vec())
        }
    }

    /// Width of the decoded image is the number of input bytes.
    struct LenDecoder;

    impl ImageDecoder for LenDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, ResolveError> {
            if bytes.is_empty() {
                return Err(ResolveError::Decode("empty".to_string()));
            }
            let width = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
            Ok(DecodedImage::new(width, 1, bytes.to_vec()))
        }
    }

    /// Panics on https, succeeds with no bytes otherwise.
    struct PanickyFetcher;

    #[async_trait]
    impl ImageFetcher for PanickyFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResolveError> {
            if url.scheme() == "https" {
                panic!("connection pool poisoned");
            }
            Ok(Vec::new())
        }
    }

    fn resolver() -> BackgroundResolver {
        BackgroundResolver::new(Arc::new(PathFetcher), Arc::new(LenDecoder))
    }

    fn url(s: &str) -> Url {
        Url::parse(s).expect("url")
    }

    async fn settle(resolver: &mut BackgroundResolver, background: &Background) {
        while resolver.status().is_fetching() {
            let completion = resolver.next_completion().await.expect("channel open");
            resolver.apply(completion, background);
        }
    }

    #[test]
    fn test_blank_is_idle_without_image() {
        let mut resolver = resolver();
        resolver.background_changed(&Background::Blank);
        assert_eq!(resolver.status(), &FetchStatus::Idle);
        assert!(resolver.image().is_none());
    }

    #[test]
    fn test_image_data_decodes_synchronously() {
        let mut resolver = resolver();
        resolver.background_changed(&Background::ImageData(vec![1, 2, 3]));
        assert_eq!(resolver.status(), &FetchStatus::Idle);
        assert_eq!(resolver.image().map(DecodedImage::width), Some(3));
    }

    #[test]
    fn test_image_data_decode_failure_keeps_idle() {
        let mut resolver = resolver();
        resolver.background_changed(&Background::ImageData(Vec::new()));
        assert_eq!(resolver.status(), &FetchStatus::Idle);
        assert!(resolver.image().is_none());
        assert!(matches!(resolver.last_error(), Some(ResolveError::Decode(_))));
    }

    #[test]
    fn test_url_without_runtime_fails() {
        let mut resolver = resolver();
        let address = url("https://example.com/a.png");
        resolver.background_changed(&Background::Url(address.clone()));
        assert_eq!(resolver.status(), &FetchStatus::Failed(address));
        assert_eq!(resolver.last_error(), Some(&ResolveError::NoRuntime));
    }

    #[tokio::test]
    async fn test_url_fetch_success() {
        let mut resolver = resolver();
        let background = Background::Url(url("https://example.com/abcd"));
        resolver.background_changed(&background);
        assert!(resolver.status().is_fetching());

        settle(&mut resolver, &background).await;
        assert_eq!(resolver.status(), &FetchStatus::Idle);
        // "/abcd" is five bytes
        assert_eq!(resolver.image().map(DecodedImage::width), Some(5));
    }

    #[tokio::test]
    async fn test_url_fetch_failure() {
        let mut resolver = resolver();
        let address = url("https://example.com/missing.png");
        let background = Background::Url(address.clone());
        resolver.background_changed(&background);

        settle(&mut resolver, &background).await;
        assert_eq!(resolver.status(), &FetchStatus::Failed(address));
        assert!(matches!(resolver.last_error(), Some(ResolveError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_stale_generation_is_discarded() {
        let mut resolver = resolver();
        let a = url("https://example.com/a");
        let b = url("https://example.com/bbbbbbbb");
        resolver.background_changed(&Background::Url(a.clone()));
        let stale_generation = resolver.generation;

        let background = Background::Url(b);
        resolver.background_changed(&background);

        // A late result for `a` arrives after the switch.
        resolver
            .tx
            .send(FetchCompletion {
                generation: stale_generation,
                url: a,
                result: Ok(DecodedImage::new(1, 1, vec![0; 4])),
            })
            .expect("send");

        settle(&mut resolver, &background).await;
        assert_eq!(resolver.status(), &FetchStatus::Idle);
        // "/bbbbbbbb" is nine bytes
        assert_eq!(resolver.image().map(DecodedImage::width), Some(9));
    }

    #[tokio::test]
    async fn test_completion_for_other_background_is_discarded() {
        let mut resolver = resolver();
        let a = url("https://example.com/a");
        resolver.background_changed(&Background::Url(a));
        let completion = resolver.next_completion().await.expect("completion");

        // The document moved on without telling the resolver yet.
        assert!(!resolver.apply(completion, &Background::Blank));
        assert!(resolver.image().is_none());
    }

    #[tokio::test]
    async fn test_same_url_keeps_running_fetch() {
        let mut resolver = resolver();
        let background = Background::Url(url("https://example.com/a"));
        resolver.background_changed(&background);
        let generation = resolver.generation;
        resolver.background_changed(&background);
        assert_eq!(resolver.generation, generation);
    }

    #[tokio::test]
    async fn test_blank_cancels_fetch() {
        let mut resolver = resolver();
        let a = Background::Url(url("https://example.com/a"));
        resolver.background_changed(&a);
        resolver.background_changed(&Background::Blank);
        assert_eq!(resolver.status(), &FetchStatus::Idle);

        // Anything still delivered is stale.
        if let Some(completion) = resolver.try_next_completion() {
            assert!(!resolver.apply(completion, &Background::Blank));
        }
        assert!(resolver.image().is_none());
    }

    #[tokio::test]
    async fn test_panicking_fetcher_ends_in_failed() {
        let mut resolver = BackgroundResolver::new(Arc::new(PanickyFetcher), Arc::new(LenDecoder));
        let a = url("https://images.example.com/a.png");
        let background = Background::Url(a.clone());

        resolver.background_changed(&background);
        tokio::time::timeout(
            std::time::Duration::from_secs(2),
            settle(&mut resolver, &background),
        )
        .await
        .expect("fetch settles");

        assert_eq!(resolver.status(), &FetchStatus::Failed(a));
        assert!(resolver.image().is_none());
        assert!(matches!(
            resolver.last_error(),
            Some(ResolveError::Fetch { reason, .. }) if reason == "fetcher panicked"
        ));
    }
}

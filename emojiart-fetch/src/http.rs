//! URL fetcher for background images.
//!
//! Resolves `http(s)://` through reqwest, `file://` from the local disk,
//! and `data:` URIs inline.

use std::time::Duration;

use async_trait::async_trait;
use emojiart_core::{ImageFetcher, ResolveError};
use url::Url;

use crate::error::{FetchError, FetchResult};
use crate::image::{data_uri_mime, decode_data_uri};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on a fetched body (32 MiB).
pub const DEFAULT_MAX_BYTES: usize = 32 * 1024 * 1024;

/// Configuration for [`UrlFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User-Agent header sent with HTTP requests.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Bodies larger than this are rejected.
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("emojiart/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Fetches background bytes for any URL the document may hold.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    http: reqwest::Client,
    config: FetchConfig,
}

impl UrlFetcher {
    /// Create a fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch the raw bytes behind `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme is unsupported, the transfer fails,
    /// or the body exceeds [`FetchConfig::max_bytes`].
    pub async fn fetch_bytes(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let bytes = match url.scheme() {
            "http" | "https" => self.fetch_http(url).await?,
            "file" => Self::fetch_file(url).await?,
            "data" => Self::fetch_data(url)?,
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        };
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    async fn fetch_http(&self, url: &Url) -> FetchResult<Vec<u8>> {
        tracing::debug!(%url, "GET background");
        let mut response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "Background fetch rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length() {
            self.check_size(usize::try_from(len).unwrap_or(usize::MAX))?;
        }

        // Content-Length may be absent (chunked), so enforce the limit as we go.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            self.check_size(body.len() + chunk.len())?;
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(%url, bytes = body.len(), "Fetched background");
        Ok(body)
    }

    fn fetch_data(url: &Url) -> FetchResult<Vec<u8>> {
        if let Some(mime) = data_uri_mime(url.as_str()) {
            if !mime.to_ascii_lowercase().starts_with("image/") {
                return Err(FetchError::InvalidDataUri(format!("not an image: {mime}")));
            }
        }
        decode_data_uri(url.as_str())
    }

    async fn fetch_file(url: &Url) -> FetchResult<Vec<u8>> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::InvalidFileUrl(url.to_string()))?;
        tracing::debug!(path = %path.display(), "Reading background file");
        Ok(tokio::fs::read(&path).await?)
    }

    fn check_size(&self, size: usize) -> FetchResult<()> {
        if size > self.config.max_bytes {
            return Err(FetchError::TooLarge {
                size,
                limit: self.config.max_bytes,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ImageFetcher for UrlFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, ResolveError> {
        self.fetch_bytes(url)
            .await
            .map_err(|e| e.into_resolve_error(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> UrlFetcher {
        UrlFetcher::new(FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert!(config.user_agent.starts_with("emojiart/"));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock requires network binding not available in sandbox"
    )]
    async fn test_fetch_http_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .and(header("user-agent", "emojiart-test"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = UrlFetcher::new(FetchConfig {
            user_agent: "emojiart-test".to_string(),
            ..FetchConfig::default()
        })
        .unwrap();
        let url = Url::parse(&format!("{}/cat.png", server.uri())).unwrap();
        assert_eq!(fetcher.fetch_bytes(&url).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock requires network binding not available in sandbox"
    )]
    async fn test_fetch_http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing.png", server.uri())).unwrap();
        let err = fetcher().fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));

        let resolve = ImageFetcher::fetch(&fetcher(), &url).await.unwrap_err();
        assert!(matches!(resolve, ResolveError::Fetch { .. }));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock requires network binding not available in sandbox"
    )]
    async fn test_fetch_http_too_large() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let fetcher = UrlFetcher::new(FetchConfig {
            max_bytes: 16,
            ..FetchConfig::default()
        })
        .unwrap();
        let url = Url::parse(&format!("{}/big.png", server.uri())).unwrap();
        let err = fetcher.fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { limit: 16, .. }));
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bg.bin");
        std::fs::write(&file, b"pixels").unwrap();

        let url = Url::from_file_path(&file).unwrap();
        assert_eq!(fetcher().fetch_bytes(&url).await.unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("nope.png")).unwrap();
        let err = fetcher().fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }

    #[tokio::test]
    async fn test_fetch_data_uri() {
        let url = Url::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(fetcher().fetch_bytes(&url).await.unwrap(), b"hello");

        let untyped = Url::parse("data:,hello").unwrap();
        assert_eq!(fetcher().fetch_bytes(&untyped).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_fetch_data_uri_rejects_non_image_mime() {
        let url = Url::parse("data:text/plain;base64,aGVsbG8=").unwrap();
        let err = fetcher().fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidDataUri(m) if m.contains("text/plain")));
    }

    #[tokio::test]
    async fn test_fetch_http_chunked_body_is_limited() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
                .await
                .unwrap();
            for _ in 0..8 {
                // Peer may hang up once the limit is hit.
                if socket.write_all(b"a\r\n0123456789\r\n").await.is_err() {
                    return;
                }
            }
            let _ = socket.write_all(b"0\r\n\r\n").await;
        });

        let fetcher = UrlFetcher::new(FetchConfig {
            max_bytes: 16,
            ..FetchConfig::default()
        })
        .unwrap();
        let url = Url::parse(&format!("http://{addr}/stream.png")).unwrap();
        let err = fetcher.fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { size, limit: 16 } if size > 16));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/cat.png").unwrap();
        let err = fetcher().fetch_bytes(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "ftp"));
    }
}

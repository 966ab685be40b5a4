//! Fetching from HTTP(S) URLs and the local filesystem.

use super::Fetch;
use crate::error::{FailureReason, LoadFailure};
use crate::models::{Artifact, FetchOutcome, Identifier};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Settings for [`SourceFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout for remote resources.
    pub timeout_seconds: u64,
    /// User agent sent with HTTP requests.
    pub user_agent: String,
    /// Largest accepted payload in bytes.
    pub max_bytes: u64,
    /// Reject payloads that are not a recognised image format.
    pub require_image: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("preloader/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: 32 * 1024 * 1024, // 32MB
            require_image: true,
        }
    }
}

impl From<&crate::config::FetchConfig> for FetchOptions {
    fn from(config: &crate::config::FetchConfig) -> Self {
        Self {
            timeout_seconds: config.timeout_seconds,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            require_image: config.require_image,
        }
    }
}

type Payload = (Option<String>, Vec<u8>);

/// Loads `http://` and `https://` identifiers over the network and
/// everything else (optionally prefixed with `file://`) from disk.
pub struct SourceFetcher {
    options: FetchOptions,
    http_client: reqwest::Client,
}

impl SourceFetcher {
    /// Create a fetcher with the given options.
    pub fn new(options: FetchOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(options.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            options,
            http_client,
        })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    async fn load(&self, identifier: &Identifier) -> Result<Artifact, FailureReason> {
        let (content_type, data) = if identifier.is_remote() {
            self.fetch_remote(identifier).await?
        } else {
            self.fetch_local(identifier).await?
        };

        self.check_size(data.len() as u64)?;

        let artifact = Artifact::new(identifier.clone(), content_type, data);
        if self.options.require_image && !artifact.kind.is_image() {
            return Err(FailureReason::NotAnImage);
        }

        Ok(artifact)
    }

    async fn fetch_remote(&self, identifier: &Identifier) -> Result<Payload, FailureReason> {
        let response = self
            .http_client
            .get(identifier.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            self.check_size(length)?;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        // Content-Length is optional, so the limit is enforced while reading.
        let mut response = response;
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            self.check_size((body.len() + chunk.len()) as u64)?;
            body.extend_from_slice(&chunk);
        }

        Ok((content_type, body))
    }

    async fn fetch_local(&self, identifier: &Identifier) -> Result<Payload, FailureReason> {
        let raw = identifier.as_str();
        let path = raw.strip_prefix("file://").unwrap_or(raw);

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FailureReason::Io(e.to_string()))?;
        if !metadata.is_file() {
            return Err(FailureReason::Io(format!("not a file: {}", path)));
        }
        self.check_size(metadata.len())?;

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| FailureReason::Io(e.to_string()))?;

        Ok((None, data))
    }

    fn check_size(&self, size: u64) -> Result<(), FailureReason> {
        if size > self.options.max_bytes {
            return Err(FailureReason::TooLarge {
                size,
                limit: self.options.max_bytes,
            });
        }
        Ok(())
    }

    fn classify(&self, e: reqwest::Error) -> FailureReason {
        if e.is_timeout() {
            FailureReason::Timeout(self.options.timeout_seconds)
        } else if e.is_connect() {
            FailureReason::Transport(format!("cannot connect: {}", e))
        } else {
            FailureReason::Transport(e.to_string())
        }
    }
}

impl Fetch for SourceFetcher {
    fn fetch(&self, identifier: Identifier) -> BoxFuture<'_, FetchOutcome> {
        async move {
            match self.load(&identifier).await {
                Ok(artifact) => {
                    debug!("Loaded {} ({} bytes, {})", identifier, artifact.len(), artifact.kind);
                    FetchOutcome::Loaded(Arc::new(artifact))
                }
                Err(reason) => {
                    warn!("Failed to load {}: {}", identifier, reason);
                    FetchOutcome::Failed(LoadFailure::new(identifier, reason))
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::PNG_BYTES;
    use crate::models::ArtifactKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(options: FetchOptions) -> SourceFetcher {
        SourceFetcher::new(options).expect("failed to create fetcher")
    }

    fn expect_failure(outcome: FetchOutcome) -> LoadFailure {
        match outcome {
            FetchOutcome::Failed(failure) => failure,
            FetchOutcome::Loaded(artifact) => panic!("expected failure, loaded {:?}", artifact.identifier),
        }
    }

    #[tokio::test]
    async fn test_fetch_remote_image() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/images/nujji.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PNG_BYTES.to_vec())
                    .insert_header("content-type", "image/png"),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/images/nujji.png", mock_server.uri());
        let outcome = fetcher(FetchOptions::default())
            .fetch(Identifier::new(url.clone()))
            .await;

        let artifact = outcome.into_result().expect("expected image to load");
        assert_eq!(artifact.identifier.as_str(), url);
        assert_eq!(artifact.kind, ArtifactKind::Png);
        assert_eq!(artifact.content_type.as_deref(), Some("image/png"));
        assert_eq!(artifact.data, PNG_BYTES);
    }

    #[tokio::test]
    async fn test_fetch_remote_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/images/other.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/images/other.jpg", mock_server.uri());
        let failure = expect_failure(
            fetcher(FetchOptions::default())
                .fetch(Identifier::new(url.clone()))
                .await,
        );

        assert_eq!(failure.identifier.as_str(), url);
        assert_eq!(failure.reason, FailureReason::Status(404));
    }

    #[tokio::test]
    async fn test_fetch_remote_rejects_non_image() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let id = Identifier::new(format!("{}/page.html", mock_server.uri()));

        let failure = expect_failure(fetcher(FetchOptions::default()).fetch(id.clone()).await);
        assert_eq!(failure.reason, FailureReason::NotAnImage);

        let relaxed = FetchOptions {
            require_image: false,
            ..FetchOptions::default()
        };
        let artifact = fetcher(relaxed).fetch(id).await.into_result().unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Other);
    }

    #[tokio::test]
    async fn test_fetch_remote_too_large() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&mock_server)
            .await;

        let options = FetchOptions {
            max_bytes: 16,
            ..FetchOptions::default()
        };
        let failure = expect_failure(
            fetcher(options)
                .fetch(Identifier::new(format!("{}/big.png", mock_server.uri())))
                .await,
        );

        assert_eq!(
            failure.reason,
            FailureReason::TooLarge {
                size: 64,
                limit: 16
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_remote_chunked_body_over_limit() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // A chunked response with no Content-Length whose body never ends.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: image/png\r\n\
                      Transfer-Encoding: chunked\r\n\r\n\
                      40\r\n",
                )
                .await
                .unwrap();
            socket.write_all(&[0u8; 64]).await.unwrap();
            socket.write_all(b"\r\n").await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let options = FetchOptions {
            max_bytes: 16,
            timeout_seconds: 20,
            ..FetchOptions::default()
        };
        let started = std::time::Instant::now();
        let failure = expect_failure(
            fetcher(options)
                .fetch(Identifier::new(format!("http://{}/stream.png", addr)))
                .await,
        );
        server.abort();

        match failure.reason {
            FailureReason::TooLarge { size, limit } => {
                assert!(size > 16, "size {} should exceed the limit", size);
                assert_eq!(limit, 16);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("local.png");
        std::fs::write(&file, PNG_BYTES).unwrap();

        let plain = Identifier::new(file.to_string_lossy().to_string());
        let artifact = fetcher(FetchOptions::default())
            .fetch(plain)
            .await
            .into_result()
            .unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Png);
        assert_eq!(artifact.content_type, None);

        let prefixed = Identifier::new(format!("file://{}", file.display()));
        let outcome = fetcher(FetchOptions::default()).fetch(prefixed).await;
        assert!(outcome.is_loaded());
    }

    #[tokio::test]
    async fn test_fetch_local_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");

        let failure = expect_failure(
            fetcher(FetchOptions::default())
                .fetch(Identifier::new(missing.to_string_lossy().to_string()))
                .await,
        );

        assert!(matches!(failure.reason, FailureReason::Io(_)));
    }

    #[tokio::test]
    async fn test_fetch_local_directory_is_failure() {
        let dir = tempfile::tempdir().unwrap();

        let failure = expect_failure(
            fetcher(FetchOptions::default())
                .fetch(Identifier::new(dir.path().to_string_lossy().to_string()))
                .await,
        );

        assert!(matches!(failure.reason, FailureReason::Io(_)));
    }

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout_seconds, 30);
        assert!(options.require_image);
        assert!(options.user_agent.starts_with("preloader/"));
    }
}

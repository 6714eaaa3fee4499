//! HTTP fetching for page documents.
//!
//! The document cache talks to the network through the [`PageFetcher`]
//! trait so tests (and embedders with their own transport) can inject a
//! fetcher. [`HttpFetcher`] is the real implementation over `reqwest`.
//!
//! Non-success HTTP statuses are not transport errors here: the response is
//! returned with its status, and the cache decides that a non-success page
//! must not be stored. Only transport-level failures (DNS, TLS, timeout)
//! surface as [`Error::Network`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::{Error, Result};

/// A fetched page document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code of the response.
    pub status: u16,
    /// Raw response body text.
    pub body: String,
}

impl FetchedPage {
    /// Whether the status indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport abstraction for fetching page documents.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the document at `url`, returning the response status and body.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// HTTP client for fetching page documents.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a new fetcher with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a new fetcher with a custom request timeout (primarily for tests).
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagehop/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        info!("Fetched {} bytes from {} ({})", body.len(), url, status);
        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetch_returns_body_and_status() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        let content = "<html><body>Hello</body></html>";
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(content))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()?;
        let url = format!("{}/page.html", mock_server.uri());
        let page = fetcher.fetch(&url).await?;

        assert_eq!(page.status, 200);
        assert!(page.is_success());
        assert_eq!(page.body, content);
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_not_a_transport_error() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()?;
        let url = format!("{}/missing", mock_server.uri());
        let page = fetcher.fetch(&url).await?;

        assert_eq!(page.status, 404);
        assert!(!page.is_success());
        Ok(())
    }

    #[tokio::test]
    async fn slow_responses_time_out() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(100))?;
        let url = format!("{}/slow", mock_server.uri());
        let result = fetcher.fetch(&url).await;

        assert!(result.is_err(), "slow request should time out");
        assert!(matches!(result, Err(Error::Network(_))));
        Ok(())
    }
}

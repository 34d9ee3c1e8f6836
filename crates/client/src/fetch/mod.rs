//! Outbound HTTP for the cache: conditional probes and full fetches.
//!
//! ### Contract
//! - `probe` issues HEAD, `fetch_body` issues GET.
//! - Only status 200 succeeds; anything else is [`FetchError::Status`].
//! - Timeouts, DNS and connection failures map to [`FetchError::Timeout`] or
//!   [`FetchError::Transport`]. Nothing is retried.
//! - Bodies are returned byte-for-byte: response decompression is disabled,
//!   so a `Content-Encoding: gzip` body stays gzipped.
//! - Redirects follow the client's limited policy (default: 10).

pub mod headers;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, ClientBuilder, Method, Response, StatusCode, Url};
use std::time::{Duration, Instant};

pub use headers::HeaderSnapshot;

use urlcache_core::{AppConfig, FetchError};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "url-cache/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "url-cache/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 10 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), max_redirects: config.max_redirects }
    }
}

/// Response from a full fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code (always 200 on success)
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderSnapshot,
    /// Undecoded response body
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Origin access used by the cache engine.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// HEAD `url` and return its headers.
    async fn probe(&self, url: &str) -> Result<HeaderSnapshot, FetchError>;

    /// GET `url` and return its headers and raw body.
    async fn fetch_body(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

/// Client builder with the fetch policy applied.
pub(crate) fn client_builder(config: &FetchConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .use_rustls_tls()
        .no_gzip()
        .no_brotli()
        .no_deflate()
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = client_builder(&config)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Wrap an already configured client.
    pub fn with_client(http: Client, config: FetchConfig) -> Self {
        Self { http, config }
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn send(&self, method: Method, url_str: &str) -> Result<(Url, Response), FetchError> {
        let url = parse_url(url_str)?;

        let response = self
            .http
            .request(method, url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url_str, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { url: url_str.to_string(), status: status.as_u16() });
        }

        Ok((url, response))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn probe(&self, url: &str) -> Result<HeaderSnapshot, FetchError> {
        let (_, response) = self.send(Method::HEAD, url).await?;
        let headers = HeaderSnapshot::from_header_map(response.headers());

        tracing::debug!("probed {} ({} headers)", url, headers.len());

        Ok(headers)
    }

    async fn fetch_body(&self, url_str: &str) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let (url, response) = self.send(Method::GET, url_str).await?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = HeaderSnapshot::from_header_map(response.headers());

        let bytes = response.bytes().await.map_err(|e| transport_error(url_str, &e))?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, final_url, status, headers, bytes, fetch_ms })
    }
}

fn parse_url(url_str: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl { url: url_str.to_string(), reason };

    let url = url::Url::parse(url_str).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(invalid(format!("unsupported scheme: {scheme}"))),
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Transport { url: url.to_string(), reason: err.to_string() }
    }
}

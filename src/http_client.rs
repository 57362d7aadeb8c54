//! Outbound HTTP.
//!
//! Providers and extractors only see the [`Fetch`] trait; [`AcceleratedClient`]
//! is the reqwest implementation used outside of tests.
//!
//! Features:
//! - HTTP/2 with adaptive flow control, TLS 1.3 via rustls
//! - Brotli, Zstd, Gzip compression (auto-negotiated)
//! - Cookie store (scraped sites hand out session cookies on the first page)
//! - Browser header profiles from [`crate::fingerprint`]

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::{Client, Response};
use tracing::{debug, instrument};

use crate::config::HttpConfig;
use crate::fingerprint::{random_profile, BrowserProfile, RequestKind};

/// GET-and-read-body capability.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` and return the body as text. Non-2xx responses are errors.
    async fn get_text(&self, url: &str, kind: RequestKind, referer: Option<&str>)
        -> Result<String>;
}

/// HTTP client with all acceleration features
pub struct AcceleratedClient {
    client: Client,
    profile: BrowserProfile,
}

impl AcceleratedClient {
    /// Client with default timeouts and a random browser profile.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Client built from configuration.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        let profile = config
            .user_agent
            .as_deref()
            .map_or_else(random_profile, BrowserProfile::with_user_agent);

        let client = Client::builder()
            // Let the server negotiate HTTP/2
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, profile })
    }

    /// Fetch a URL with the profile's headers for `kind`.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(
        &self,
        url: &str,
        kind: RequestKind,
        referer: Option<&str>,
    ) -> Result<Response> {
        let mut request = self
            .client
            .get(url)
            .headers(self.profile.to_headers(kind)?);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?;
        debug!(
            status = %response.status(),
            version = ?response.version(),
            "Response received"
        );

        response
            .error_for_status()
            .with_context(|| format!("unexpected status from {url}"))
    }

    /// Browser profile this client sends.
    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }
}

#[async_trait]
impl Fetch for AcceleratedClient {
    async fn get_text(
        &self,
        url: &str,
        kind: RequestKind,
        referer: Option<&str>,
    ) -> Result<String> {
        let response = self.fetch(url, kind, referer).await?;
        let text = response.text().await?;
        Ok(text)
    }
}

impl Default for AcceleratedClient {
    fn default() -> Self {
        Self::new().expect("Failed to create default client")
    }
}

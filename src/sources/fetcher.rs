//! HTTP fetcher implementation
//!
//! This module handles all outbound requests, including:
//! - Building the shared HTTP client with the browser user agent
//! - GET requests with a per-call timeout
//! - Classification of transport errors
//!
//! HTTP status codes are reported as-is; deciding whether a status is
//! acceptable is up to the caller.

use crate::model::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// A response received from a source
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value (empty when absent)
    pub content_type: String,
    /// Response body decoded as text
    pub body: String,
}

/// The fetch capability used by every adapter
///
/// Implementations must be shareable across sequential or concurrent
/// adapter runs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET request
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - A response was received, whatever its status
    /// * `Err(SourceError::TransportFailure)` - No response (timeout, DNS,
    ///   connection refused, TLS, body read failure)
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, SourceError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use condo_harvest::sources::build_http_client;
/// use condo_harvest::config::DEFAULT_USER_AGENT;
///
/// let client = build_http_client(DEFAULT_USER_AGENT).unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher sending the given user agent
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchResponse, SourceError> {
        tracing::debug!("GET {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, &e))?;

        tracing::debug!("{} -> HTTP {} ({} bytes)", url, status_code, body.len());

        Ok(FetchResponse {
            final_url,
            status_code,
            content_type,
            body,
        })
    }
}

/// Maps a client error onto a transport failure with a readable message
fn classify_error(url: &str, error: &reqwest::Error) -> SourceError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else {
        error.to_string()
    };

    SourceError::TransportFailure {
        url: url.to_string(),
        message,
    }
}

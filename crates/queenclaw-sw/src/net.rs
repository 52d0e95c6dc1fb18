//! Network seam: request/response types and the reqwest-backed fetcher.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use queenclaw_common::{QueenClawError, Result};
use tracing::{debug, trace};
use url::Url;

use crate::cache::CachedResponse;
use crate::config::NetworkConfig;

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Request method.
    pub method: Method,

    /// Request URL.
    pub url: Url,

    /// Request headers.
    pub headers: HeaderMap,
}

impl FetchRequest {
    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Create a request with an explicit method.
    pub fn with_method(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// The request's canonical cache key.
    ///
    /// Only GET requests are ever cached, so the key is the exact URL.
    pub fn key(&self) -> String {
        self.url.to_string()
    }
}

/// A response flowing back to the caller.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Status code.
    pub status: StatusCode,

    /// Status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HeaderMap,

    /// Response body.
    pub body: Bytes,

    /// Whether the body came from a cache generation.
    pub served_from_cache: bool,
}

impl FetchResponse {
    /// Check if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Whether the response may be written to a cache generation.
    ///
    /// Only success-status responses are eligible. Redirects arrive here
    /// already resolved to their final response, and error bodies must
    /// never shadow a good snapshot.
    pub fn is_cacheable(&self) -> bool {
        self.status.is_success()
    }

    /// Synthesize the terminal offline fallback.
    pub fn offline_fallback(body: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            status_text: "Service Unavailable".to_string(),
            headers,
            body: Bytes::from(body.to_string()),
            served_from_cache: false,
        }
    }

    /// Rehydrate a response from a stored snapshot.
    pub fn from_snapshot(snapshot: &CachedResponse) -> Self {
        Self {
            status: snapshot.status,
            status_text: snapshot.status_text.clone(),
            headers: snapshot.headers.clone(),
            body: snapshot.body.clone(),
            served_from_cache: true,
        }
    }

    /// Copy the response into a storable snapshot.
    pub fn to_snapshot(&self) -> CachedResponse {
        CachedResponse {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }

    /// Get the body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| QueenClawError::InvalidArgument(format!("non-utf8 body: {e}")))
    }
}

/// Async seam to the network.
///
/// The coordinator never talks to the wire directly; install, miss handling,
/// and revalidation all go through this trait so tests can script it.
#[async_trait]
pub trait RemoteFetch: Send + Sync + 'static {
    /// Fetch a request from the network.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Production fetcher over a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher from network configuration.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QueenClawError::network_with_source("client setup failed", e))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!(method = %request.method, url = %request.url, "fetching");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| QueenClawError::network_with_source("request failed", e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| QueenClawError::network_with_source("body read failed", e))?;

        trace!(url = %request.url, status = %status, body_len = body.len(), "response received");

        Ok(FetchResponse {
            status,
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
            served_from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_exact_url() {
        let url = Url::parse("https://queenclaw.app/en?tab=feed").unwrap();
        let request = FetchRequest::get(url);
        assert_eq!(request.key(), "https://queenclaw.app/en?tab=feed");
    }

    #[test]
    fn test_offline_fallback_shape() {
        let fallback = FetchResponse::offline_fallback("down for now");

        assert_eq!(fallback.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(fallback.status_text, "Service Unavailable");
        assert_eq!(fallback.text().unwrap(), "down for now");
        assert!(!fallback.served_from_cache);
        assert!(!fallback.is_cacheable());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html"),
        );
        let response = FetchResponse {
            status: StatusCode::OK,
            status_text: "OK".to_string(),
            headers,
            body: Bytes::from("<html>"),
            served_from_cache: false,
        };

        let rehydrated = FetchResponse::from_snapshot(&response.to_snapshot());
        assert_eq!(rehydrated.status, response.status);
        assert_eq!(rehydrated.body, response.body);
        assert!(rehydrated.served_from_cache);
    }

    #[test]
    fn test_cacheable_statuses() {
        let mut response = FetchResponse::offline_fallback("x");
        assert!(!response.is_cacheable());

        response.status = StatusCode::OK;
        assert!(response.is_cacheable());

        response.status = StatusCode::NOT_FOUND;
        assert!(!response.is_cacheable());

        response.status = StatusCode::FOUND;
        assert!(!response.is_cacheable());
    }
}

//! Remote coupon source
//!
//! This module defines the `CouponSource` trait the cache fetches through and
//! the reqwest-backed `HttpCouponSource` implementation. The source returns
//! the raw response (status, content type, body text) rather than parsed
//! JSON: classification of gateway error pages and malformed payloads is the
//! cache's job, not the transport's.

use reqwest::Client;
use thiserror::Error;

/// Errors that can occur while talking to the coupon source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure (connection refused, timeout, DNS)
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Raw response from the coupon source before any classification
#[derive(Debug, Clone)]
pub struct RawPayload {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header, if the response carried one
    pub content_type: Option<String>,
    /// Response body as text
    pub body: String,
}

impl RawPayload {
    /// Returns true for 2xx statuses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the response looks like JSON rather than an HTML
    /// error page served with a success status.
    ///
    /// A body starting with `<` is treated as HTML regardless of the
    /// Content-Type header, since misconfigured gateways routinely label
    /// error pages as JSON. A missing header is given the benefit of the
    /// doubt and judged by the body alone.
    pub fn looks_like_json(&self) -> bool {
        if self.body.trim_start().starts_with('<') {
            return false;
        }
        match &self.content_type {
            Some(content_type) => content_type.contains("json"),
            None => true,
        }
    }
}

/// A remote source of raw coupon payloads
///
/// Implemented by `HttpCouponSource` for production and by scripted fakes in
/// tests. A source performs exactly one request per `fetch` call; retry
/// policy lives in the cache.
pub trait CouponSource: Send + Sync {
    /// Performs one request against the coupon endpoint
    fn fetch(&self) -> impl std::future::Future<Output = Result<RawPayload, SourceError>> + Send;
}

// A shared source behind an Arc fetches through the inner source, so one
// source can back several cache instances.
impl<S: CouponSource> CouponSource for std::sync::Arc<S> {
    async fn fetch(&self) -> Result<RawPayload, SourceError> {
        (**self).fetch().await
    }
}

/// HTTP implementation of `CouponSource` over a configured endpoint
#[derive(Debug, Clone)]
pub struct HttpCouponSource {
    client: Client,
    endpoint: String,
}

impl HttpCouponSource {
    /// Creates a source for the given coupon-listing endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates a source with a custom HTTP client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the configured endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CouponSource for HttpCouponSource {
    async fn fetch(&self) -> Result<RawPayload, SourceError> {
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(RawPayload {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(status: u16, content_type: Option<&str>, body: &str) -> RawPayload {
        RawPayload {
            status,
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_success_statuses() {
        assert!(payload(200, None, "[]").is_success());
        assert!(payload(204, None, "").is_success());
        assert!(!payload(404, None, "").is_success());
        assert!(!payload(500, None, "").is_success());
    }

    #[test]
    fn test_json_content_type_looks_like_json() {
        assert!(payload(200, Some("application/json"), "[]").looks_like_json());
        assert!(payload(200, Some("application/json; charset=utf-8"), "[]").looks_like_json());
    }

    #[test]
    fn test_html_body_never_looks_like_json() {
        // Gateways sometimes serve HTML error pages with a JSON content type
        let html = "<html><body>502 Bad Gateway</body></html>";
        assert!(!payload(200, Some("application/json"), html).looks_like_json());
        assert!(!payload(200, Some("text/html"), html).looks_like_json());
    }

    #[test]
    fn test_leading_whitespace_before_html_is_still_html() {
        assert!(!payload(200, None, "  \n<!DOCTYPE html>").looks_like_json());
    }

    #[test]
    fn test_html_content_type_is_not_json() {
        assert!(!payload(200, Some("text/html"), "[]").looks_like_json());
    }

    #[test]
    fn test_missing_content_type_is_judged_by_body() {
        assert!(payload(200, None, "[{\"id\":\"c1\"}]").looks_like_json());
        assert!(!payload(200, None, "<p>error</p>").looks_like_json());
    }

    #[test]
    fn test_http_source_stores_endpoint() {
        let source = HttpCouponSource::new("http://localhost:8080/api/coupons");
        assert_eq!(source.endpoint(), "http://localhost:8080/api/coupons");
    }
}

//! Asset provider that forwards pass-through requests to another origin.
//!
//! Used when the site is rendered by a separate process (a static host, a
//! dev server, an SSR renderer). The request path and query are appended
//! to the configured origin, hop-by-hop headers are stripped in both
//! directions, and the upstream response body is streamed back as-is.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::response::Response;
use http_body_util::Full;
use url::Url;

use super::AssetProvider;
use crate::error::FriendgateError;
use crate::server::HttpClient;

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Request headers for the upstream: client headers minus hop-by-hop,
/// `Host` rewritten to the upstream, original host kept in
/// `X-Forwarded-Host`.
#[must_use]
pub fn upstream_headers(original: &HeaderMap, origin: &Url) -> HeaderMap {
    let mut headers = original.clone();
    strip_hop_by_hop(&mut headers);

    if let Some(host) = origin.host_str() {
        let host_value = origin
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert(header::HOST, val);
        }
    }

    if let Some(original_host) = original.get(header::HOST) {
        headers.insert("x-forwarded-host", original_host.clone());
    }

    headers
}

/// `origin` with the request's path and query appended to its own path.
#[must_use]
pub fn upstream_uri(origin: &Url, path_and_query: &str) -> String {
    format!("{}{}", origin.as_str().trim_end_matches('/'), path_and_query)
}

pub struct UpstreamAssets {
    origin: Url,
    client: HttpClient,
    timeout: Duration,
    max_body: usize,
}

impl UpstreamAssets {
    #[must_use]
    pub const fn new(origin: Url, client: HttpClient, timeout: Duration, max_body: usize) -> Self {
        Self {
            origin,
            client,
            timeout,
            max_body,
        }
    }
}

#[async_trait]
impl AssetProvider for UpstreamAssets {
    fn name(&self) -> &'static str {
        "upstream"
    }

    async fn serve(&self, request: Request) -> Result<Response, FriendgateError> {
        let (parts, body) = request.into_parts();

        let body = axum::body::to_bytes(body, self.max_body)
            .await
            .map_err(|e| FriendgateError::HttpRequest {
                source: Box::new(e),
            })?;

        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or("/", axum::http::uri::PathAndQuery::as_str);
        let uri: hyper::Uri = upstream_uri(&self.origin, path_and_query)
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| FriendgateError::UriParse {
                source: Box::new(e),
            })?;

        let mut builder = hyper::Request::builder().method(parts.method).uri(uri);
        for (key, value) in &upstream_headers(&parts.headers, &self.origin) {
            builder = builder.header(key, value);
        }
        let upstream_request = builder
            .body(Full::new(body))
            .map_err(|e| FriendgateError::HttpRequest {
                source: Box::new(e),
            })?;

        let response = tokio::time::timeout(self.timeout, self.client.request(upstream_request))
            .await
            .map_err(|_| FriendgateError::HttpRequest {
                source: format!(
                    "upstream {} timed out after {}ms",
                    self.origin,
                    self.timeout.as_millis()
                )
                .into(),
            })?
            .map_err(|e| FriendgateError::HttpRequest {
                source: Box::new(e),
            })?;

        let mut response = response.map(Body::new);
        strip_hop_by_hop(response.headers_mut());
        Ok(response)
    }
}

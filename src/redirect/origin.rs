//! Extraction of the caller's declared origin host.
//!
//! `Referer` and `Origin` are client-controlled and often junk (`null`,
//! relative paths, opaque schemes). Anything that does not parse as an
//! absolute URL with a host yields `None`; nothing here returns an error.

use axum::http::{header, HeaderMap, HeaderValue};
use url::Url;

/// The `Referer` header, falling back to the `Referrer` spelling when it is
/// missing or empty. Only the first value of a repeated header is considered.
#[must_use]
pub fn referer(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers
        .get(header::REFERER)
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get("referrer"))
}

#[must_use]
pub fn origin(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers.get(header::ORIGIN)
}

/// Host of a header value parsed as an absolute URL.
#[must_use]
pub fn declared_host(value: Option<&HeaderValue>) -> Option<String> {
    let raw = value?.to_str().ok()?;
    if raw.is_empty() {
        return None;
    }
    let parsed = Url::parse(raw).ok()?;
    parsed.host_str().map(str::to_owned)
}

//! Redirect location construction.
//!
//! Locations are built by setting the path and query on a parsed base URL
//! rather than resolving the request path against it. A request for
//! `//elsewhere.test/x` therefore stays on the base host instead of being
//! read as a protocol-relative reference.

use std::net::IpAddr;
use std::sync::LazyLock;

use url::Url;

use crate::friends::CANONICAL_ORIGIN;

static CANONICAL: LazyLock<Result<Url, url::ParseError>> =
    LazyLock::new(|| Url::parse(CANONICAL_ORIGIN));

fn with_path_and_query(mut base: Url, path: &str, query: Option<&str>) -> Url {
    base.set_path(path);
    base.set_query(query.filter(|q| !q.is_empty()));
    base
}

/// The canonical origin with the original path and query.
pub fn friend_location(path: &str, query: Option<&str>) -> Result<Url, url::ParseError> {
    let base = (*CANONICAL).clone()?;
    Ok(with_path_and_query(base, path, query))
}

/// `<scheme>://www.<host><path>?<query>`. `host` may carry a port.
pub fn www_location(
    scheme: &str,
    host: &str,
    path: &str,
    query: Option<&str>,
) -> Result<Url, url::ParseError> {
    let base = Url::parse(&format!("{scheme}://www.{host}"))?;
    Ok(with_path_and_query(base, path, query))
}

/// Whether a `Host` header value should be moved to its `www.` form.
///
/// Hosts already under `www.` and anything starting with `localhost` are
/// left alone. IP literals are too: `www.203.0.113.5` is not a host name
/// and does not parse as one.
#[must_use]
pub fn wants_www(host: &str) -> bool {
    if host.is_empty() || host.starts_with("www.") || host.starts_with("localhost") {
        return false;
    }
    !is_ip_literal(host)
}

fn is_ip_literal(host: &str) -> bool {
    if host.starts_with('[') {
        return true;
    }
    let name = host.rsplit_once(':').map_or(host, |(name, _port)| name);
    name.parse::<IpAddr>().is_ok()
}

/// Scheme for a www redirect: `X-Forwarded-Proto` when it names http or
/// https, plain `http` otherwise.
#[must_use]
pub fn forwarded_scheme(forwarded_proto: Option<&str>) -> &'static str {
    let first = forwarded_proto
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    match first {
        Some(p) if p.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

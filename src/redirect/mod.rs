//! Friend-link interception at the edge.
//!
//! [`evaluate`] turns one request into a [`Decision`]; [`edge_handler`] is
//! the Axum fallback that acts on it. Submodules handle asset
//! classification ([`classify`]), origin header parsing ([`origin`]), and
//! redirect location construction ([`target`]).
//!
//! Evaluation is pure: it reads the URI and headers, the [`RuleSet`], and
//! the friend set, and touches nothing else.

pub mod classify;
pub mod origin;
pub mod target;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::config::model::RuleSet;
use crate::friends::{FriendHosts, FRIENDS};
use crate::server::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Static asset; handed to the asset provider without a friend check.
    Asset,
    /// `Referer` or `Origin` named a friend: 302 to the canonical origin.
    FriendRedirect { location: Url, matched: String },
    /// Bare host: 301 to its `www.` form.
    CanonicalHost { location: Url },
    /// Ordinary page request for the asset provider.
    PassThrough,
}

impl Decision {
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::FriendRedirect { .. } => Some(StatusCode::FOUND),
            Self::CanonicalHost { .. } => Some(StatusCode::MOVED_PERMANENTLY),
            Self::Asset | Self::PassThrough => None,
        }
    }

    #[must_use]
    pub const fn location(&self) -> Option<&Url> {
        match self {
            Self::FriendRedirect { location, .. } | Self::CanonicalHost { location } => {
                Some(location)
            }
            Self::Asset | Self::PassThrough => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::FriendRedirect { .. } => "friend-redirect",
            Self::CanonicalHost { .. } => "www-redirect",
            Self::PassThrough => "pass-through",
        }
    }
}

/// The friend host named by `Referer` or, failing that, `Origin`.
#[must_use]
pub fn friend_match(
    headers: &HeaderMap,
    friends: &FriendHosts,
    www_insensitive: bool,
) -> Option<String> {
    [origin::referer(headers), origin::origin(headers)]
        .into_iter()
        .filter_map(origin::declared_host)
        .find(|host| friends.matches(host, www_insensitive))
}

#[must_use]
pub fn evaluate(uri: &Uri, headers: &HeaderMap, rules: &RuleSet, friends: &FriendHosts) -> Decision {
    let path = uri.path();
    let query = uri.query();

    if rules.static_asset_bypass && classify::is_static_asset(path) {
        return Decision::Asset;
    }

    if let Some(matched) = friend_match(headers, friends, rules.www_insensitive_match) {
        match target::friend_location(path, query) {
            Ok(location) => return Decision::FriendRedirect { location, matched },
            Err(e) => {
                tracing::error!(error = %e, "canonical origin does not parse, skipping friend redirect");
            }
        }
    }

    if rules.www_canonicalization {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if target::wants_www(host) {
            let proto = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok());
            let scheme = target::forwarded_scheme(proto);
            match target::www_location(scheme, host, path, query) {
                Ok(location) => return Decision::CanonicalHost { location },
                Err(e) => {
                    tracing::debug!(host = %host, error = %e, "host not usable for www redirect");
                }
            }
        }
    }

    Decision::PassThrough
}

fn header_str<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| addr.ip().to_string(), String::from)
}

fn redirect_response(status: StatusCode, location: &Url, correlation_id: &str) -> Response {
    Response::builder()
        .status(status)
        .header(header::LOCATION, location.as_str())
        .header("x-correlation-id", correlation_id)
        .body(Body::empty())
        .unwrap_or_else(|e| {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "failed to build redirect response"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

pub async fn edge_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let headers = request.headers();
    let correlation_id = headers
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let decision = evaluate(request.uri(), headers, &state.rules, &FRIENDS);

    match decision {
        Decision::FriendRedirect {
            ref location,
            ref matched,
        } => {
            tracing::info!(
                correlation_id = %correlation_id,
                friend = %matched,
                referer = header_str(headers, header::REFERER),
                origin = header_str(headers, header::ORIGIN),
                to = %location,
                user_agent = header_str(headers, header::USER_AGENT),
                ip = %client_ip(headers, addr),
                "friend redirect"
            );
            state.stats.friend_redirects.fetch_add(1, Ordering::Relaxed);
            return redirect_response(StatusCode::FOUND, location, &correlation_id);
        }
        Decision::CanonicalHost { ref location } => {
            tracing::info!(
                correlation_id = %correlation_id,
                host = header_str(headers, header::HOST),
                to = %location,
                user_agent = header_str(headers, header::USER_AGENT),
                ip = %client_ip(headers, addr),
                "www redirect"
            );
            state.stats.www_redirects.fetch_add(1, Ordering::Relaxed);
            return redirect_response(StatusCode::MOVED_PERMANENTLY, location, &correlation_id);
        }
        Decision::Asset | Decision::PassThrough => {
            tracing::debug!(
                correlation_id = %correlation_id,
                decision = decision.label(),
                method = %request.method(),
                path = %request.uri().path(),
                "passing through"
            );
        }
    }

    match state.assets.serve(request).await {
        Ok(response) => {
            state.stats.passed_through.fetch_add(1, Ordering::Relaxed);
            response
        }
        Err(e) => {
            tracing::error!(
                correlation_id = %correlation_id,
                provider = state.assets.name(),
                error = %e,
                "asset provider failed"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::Variant;
    use axum::http::HeaderValue;

    fn request(uri: &str, pairs: &[(&'static str, &'static str)]) -> (Uri, HeaderMap) {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.append(*name, HeaderValue::from_static(value));
        }
        (uri.parse().unwrap(), headers)
    }

    fn eval(variant: Variant, uri: &str, pairs: &[(&'static str, &'static str)]) -> Decision {
        let (uri, headers) = request(uri, pairs);
        evaluate(&uri, &headers, &variant.rules(), &FRIENDS)
    }

    #[test]
    fn friend_referer_redirects_with_path_and_query() {
        let decision = eval(
            Variant::EdgeIndex,
            "/posts/42?ref=x",
            &[("referer", "https://innei.in/foo")],
        );
        assert_eq!(decision.status(), Some(StatusCode::FOUND));
        assert_eq!(
            decision.location().unwrap().as_str(),
            "https://www.tnxg.moe/posts/42?ref=x"
        );
        assert!(matches!(decision, Decision::FriendRedirect { ref matched, .. } if matched == "innei.in"));
    }

    #[test]
    fn friend_origin_alone_redirects() {
        let decision = eval(Variant::EdgeIndex, "/", &[("origin", "https://zwh.moe")]);
        assert_eq!(decision.location().unwrap().as_str(), "https://www.tnxg.moe/");
    }

    #[test]
    fn malformed_referer_falls_back_to_origin() {
        let decision = eval(
            Variant::EdgeIndex,
            "/a",
            &[("referer", "::not a url::"), ("origin", "https://xxu.do")],
        );
        assert!(matches!(decision, Decision::FriendRedirect { ref matched, .. } if matched == "xxu.do"));
    }

    #[test]
    fn no_headers_pass_through() {
        for variant in [Variant::Middleware, Variant::EdgeCatchAll, Variant::EdgeIndex] {
            let decision = eval(variant, "/", &[("host", "www.tnxg.moe")]);
            assert_eq!(decision, Decision::PassThrough, "{variant}");
        }
    }

    #[test]
    fn stranger_referer_passes_through() {
        let decision = eval(
            Variant::EdgeCatchAll,
            "/posts/1",
            &[("referer", "https://search.example/?q=tnxg")],
        );
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn malformed_headers_never_match() {
        let decision = eval(
            Variant::EdgeIndex,
            "/",
            &[("referer", "null"), ("origin", "innei.in")],
        );
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn assets_bypass_friend_check_when_enabled() {
        let pairs = [("referer", "https://innei.in/")];
        assert_eq!(
            eval(Variant::EdgeCatchAll, "/_nuxt/app.js", &pairs),
            Decision::Asset
        );
        // Without the bypass the same request is friend-checked.
        assert!(matches!(
            eval(Variant::EdgeIndex, "/_nuxt/app.js", &pairs),
            Decision::FriendRedirect { .. }
        ));
    }

    #[test]
    fn html_pages_are_friend_checked() {
        let decision = eval(
            Variant::EdgeCatchAll,
            "/about.html",
            &[("referer", "https://innei.in/")],
        );
        assert_eq!(
            decision.location().unwrap().as_str(),
            "https://www.tnxg.moe/about.html"
        );
    }

    #[test]
    fn www_insensitive_match_only_in_middleware() {
        let pairs = [("referer", "https://www.innei.in/")];
        assert!(matches!(
            eval(Variant::Middleware, "/", &pairs),
            Decision::FriendRedirect { .. }
        ));
        assert_eq!(eval(Variant::EdgeCatchAll, "/", &pairs), Decision::PassThrough);
    }

    #[test]
    fn bare_host_gets_www_redirect_in_middleware() {
        let decision = eval(
            Variant::Middleware,
            "/posts/7?page=2",
            &[("host", "tnxg.moe"), ("x-forwarded-proto", "https")],
        );
        assert_eq!(decision.status(), Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(
            decision.location().unwrap().as_str(),
            "https://www.tnxg.moe/posts/7?page=2"
        );
    }

    #[test]
    fn www_redirect_defaults_to_http() {
        let decision = eval(Variant::Middleware, "/", &[("host", "tnxg.moe")]);
        assert_eq!(decision.location().unwrap().as_str(), "http://www.tnxg.moe/");
    }

    #[test]
    fn friend_redirect_wins_over_www_redirect() {
        let decision = eval(
            Variant::Middleware,
            "/",
            &[("host", "tnxg.moe"), ("referer", "https://innei.in/")],
        );
        assert_eq!(decision.status(), Some(StatusCode::FOUND));
    }

    #[test]
    fn localhost_and_www_hosts_are_not_canonicalized() {
        for host in ["localhost:3000", "www.tnxg.moe", "127.0.0.1:3000", "203.0.113.5"] {
            let (uri, mut headers) = request("/", &[]);
            headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
            let decision = evaluate(&uri, &headers, &Variant::Middleware.rules(), &FRIENDS);
            assert_eq!(decision, Decision::PassThrough, "{host}");
        }
    }

    #[test]
    fn www_canonicalization_off_in_edge_variants() {
        let decision = eval(Variant::EdgeCatchAll, "/", &[("host", "tnxg.moe")]);
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn assets_skip_www_redirect_too() {
        let decision = eval(Variant::Middleware, "/logo.png", &[("host", "tnxg.moe")]);
        assert_eq!(decision, Decision::Asset);
    }

    #[test]
    fn custom_friend_set() {
        let friends = FriendHosts::new(["mirror.test"]);
        let (uri, headers) = request("/x", &[("origin", "https://mirror.test")]);
        let decision = evaluate(&uri, &headers, &Variant::EdgeIndex.rules(), &friends);
        assert!(matches!(decision, Decision::FriendRedirect { .. }));

        let (uri, headers) = request("/x", &[("origin", "https://innei.in")]);
        let decision = evaluate(&uri, &headers, &Variant::EdgeIndex.rules(), &friends);
        assert_eq!(decision, Decision::PassThrough);
    }

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, addr), "10.1.2.3");
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        assert_eq!(client_ip(&headers, addr), "1.2.3.4");
    }
}

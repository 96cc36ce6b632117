//! `friendgate check` — evaluate one request offline.
//!
//! Builds a request from the given path and header values, runs it
//! through the same [`evaluate`] the server uses, and prints the decision.
//! Handy for confirming a new friend host or a variant change before
//! deploying.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Uri};

use crate::cli::CheckArgs;
use crate::config::model::RuleSet;
use crate::config::sources::parse_config_str;
use crate::error::FriendgateError;
use crate::friends::FRIENDS;
use crate::redirect::{evaluate, Decision};

pub fn execute(args: &CheckArgs) -> Result<(), FriendgateError> {
    let rules = resolve_rules(args)?;
    let (uri, headers) = build_request(args)?;
    let decision = evaluate(&uri, &headers, &rules, &FRIENDS);

    if args.json {
        println!("{}", decision_json(&decision));
    } else {
        println!("{}", decision_text(&uri, &decision));
    }
    Ok(())
}

fn resolve_rules(args: &CheckArgs) -> Result<RuleSet, FriendgateError> {
    if let Some(ref path) = args.config {
        if !path.exists() {
            return Err(FriendgateError::ConfigFileNotFound { path: path.clone() });
        }
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = parse_config_str(ext, &content, &path.display().to_string())?;
        return Ok(config.rules());
    }
    Ok(args.variant.unwrap_or_default().rules())
}

pub fn build_request(args: &CheckArgs) -> Result<(Uri, HeaderMap), FriendgateError> {
    let path = if args.path.starts_with('/') {
        args.path.clone()
    } else {
        format!("/{}", args.path)
    };
    let uri: Uri = path
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| FriendgateError::UriParse {
            source: Box::new(e),
        })?;

    let mut headers = HeaderMap::new();
    let pairs: [(&'static str, HeaderName, &Option<String>); 4] = [
        ("Referer", header::REFERER, &args.referer),
        ("Origin", header::ORIGIN, &args.origin),
        ("Host", header::HOST, &args.host),
        (
            "X-Forwarded-Proto",
            HeaderName::from_static("x-forwarded-proto"),
            &args.proto,
        ),
    ];
    for (label, name, value) in pairs {
        if let Some(value) = value {
            let value = HeaderValue::from_str(value).map_err(|e| FriendgateError::InvalidHeader {
                name: label,
                source: Box::new(e),
            })?;
            headers.insert(name, value);
        }
    }

    Ok((uri, headers))
}

#[must_use]
pub fn decision_json(decision: &Decision) -> serde_json::Value {
    let friend = match decision {
        Decision::FriendRedirect { matched, .. } => Some(matched.as_str()),
        _ => None,
    };
    serde_json::json!({
        "decision": decision.label(),
        "status": decision.status().map(|s| s.as_u16()),
        "location": decision.location().map(url::Url::as_str),
        "friend": friend,
    })
}

#[must_use]
pub fn decision_text(uri: &Uri, decision: &Decision) -> String {
    match decision {
        Decision::FriendRedirect { location, matched } => format!(
            "{uri} -> 302 Found\n  Location: {location}\n  friend:   {matched}"
        ),
        Decision::CanonicalHost { location } => {
            format!("{uri} -> 301 Moved Permanently\n  Location: {location}")
        }
        Decision::Asset => format!("{uri} -> static asset, served without a friend check"),
        Decision::PassThrough => format!("{uri} -> passed through to the asset provider"),
    }
}

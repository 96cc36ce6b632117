//! `friendgate health` — probe a running instance.
//!
//! Sends `GET /_friendgate/health` to the given base URL and prints the
//! payload as a short summary or as raw JSON.

use http_body_util::BodyExt;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::FriendgateError;
use crate::health::{HealthResponse, HEALTH_PATH};

const PROBE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), FriendgateError> {
    let uri = health_uri(&args.url)?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(http_body_util::Full::new(bytes::Bytes::new()))
        .map_err(|e| FriendgateError::HttpRequest {
            source: Box::new(e),
        })?;

    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(req))
        .await
        .map_err(|_| FriendgateError::HttpRequest {
            source: format!("health check timed out after {}s", PROBE_TIMEOUT.as_secs()).into(),
        })?
        .map_err(|e| FriendgateError::HttpRequest {
            source: Box::new(e),
        })?;

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| FriendgateError::HttpRequest {
            source: Box::new(e),
        })?
        .to_bytes();

    if !status.is_success() {
        return Err(FriendgateError::HealthCheckFailed(status));
    }

    let body_str = String::from_utf8_lossy(&body);
    if args.json {
        println!("{body_str}");
        return Ok(());
    }

    match serde_json::from_str::<HealthResponse>(&body_str) {
        Ok(health) => println!("{}", summary(&args.url, &health)),
        Err(e) => {
            eprintln!("Failed to parse health response: {e}");
            println!("{body_str}");
        }
    }

    Ok(())
}

fn health_uri(base: &str) -> Result<hyper::Uri, FriendgateError> {
    format!("{}{HEALTH_PATH}", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| FriendgateError::UriParse {
            source: Box::new(e),
        })
}

fn summary(url: &str, health: &HealthResponse) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let rules = &health.config.rules;
    let stats = &health.stats;
    [
        format!(
            "\u{2713} friendgate {} ({}) is healthy at {url}",
            health.version, health.commit
        ),
        format!("  uptime:         {}", format_uptime(health.uptime_seconds)),
        format!(
            "  config:         {} @ {} (loaded {}s ago)",
            health.config.source, health.config.version, health.config.loaded_ago_seconds
        ),
        format!("  variant:        {}", health.config.variant),
        format!(
            "  rules:          asset bypass {}, www match {}, www redirect {}",
            on_off(rules.static_asset_bypass),
            on_off(rules.www_insensitive_match),
            on_off(rules.www_canonicalization)
        ),
        format!("  assets:         {}", health.config.assets),
        format!(
            "  friends:        {} hosts -> {}",
            health.friends.hosts, health.friends.canonical_origin
        ),
        format!(
            "  requests:       {} friend, {} www, {} passed, {} failed",
            stats.friend_redirects, stats.www_redirects, stats.passed_through, stats.failed
        ),
    ]
    .join("\n")
}

fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

//! `GET /_friendgate/health` endpoint handler.
//!
//! The path sits under a prefix of its own so every site page, `/health`
//! included, stays reachable through the edge handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the server version and
//! build, uptime, which config is loaded and the rules it produced, the
//! friend list size, and cumulative decision counters.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::model::{RuleSet, Variant};
use crate::friends::{CANONICAL_ORIGIN, FRIENDS};
use crate::server::AppState;

pub const HEALTH_PATH: &str = "/_friendgate/health";

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub commit: String,
    pub uptime_seconds: u64,
    pub config: ConfigHealth,
    pub friends: FriendsHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ConfigHealth {
    pub source: String,
    pub version: String,
    pub loaded_ago_seconds: u64,
    pub variant: Variant,
    pub rules: RuleSet,
    pub assets: String,
}

#[derive(Serialize, Deserialize)]
pub struct FriendsHealth {
    pub hosts: usize,
    pub canonical_origin: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub friend_redirects: u64,
    pub www_redirects: u64,
    pub passed_through: u64,
    pub failed: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = &state.loaded;
    let stats = &state.stats;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("FRIENDGATE_GIT_SHORT").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        config: ConfigHealth {
            source: loaded.source_name.clone(),
            version: loaded.version.short().to_string(),
            loaded_ago_seconds: loaded.loaded_at.elapsed().as_secs(),
            variant: loaded.config.variant,
            rules: state.rules,
            assets: loaded.config.assets.describe(),
        },
        friends: FriendsHealth {
            hosts: FRIENDS.len(),
            canonical_origin: CANONICAL_ORIGIN.to_string(),
        },
        stats: StatsResponse {
            friend_redirects: stats.friend_redirects.load(Ordering::Relaxed),
            www_redirects: stats.www_redirects.load(Ordering::Relaxed),
            passed_through: stats.passed_through.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
        },
    })
}

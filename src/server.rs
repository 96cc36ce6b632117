//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the loaded
//! config, effective rules, asset provider, counters and uptime),
//! [`build_router`] for constructing the Axum router with middleware
//! layers, [`build_http_client`] for the connection-pooled hyper client
//! used by the upstream provider, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::assets::AssetProvider;
use crate::config::model::{Config, RuleSet};
use crate::config::ConfigVersion;
use crate::health::{health_handler, HEALTH_PATH};
use crate::redirect;

/// Config as loaded at startup. Never replaced while the server runs.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub version: ConfigVersion,
    pub source_name: String,
    pub loaded_at: Instant,
}

#[derive(Debug)]
pub struct Stats {
    pub friend_redirects: AtomicU64,
    pub www_redirects: AtomicU64,
    pub passed_through: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            friend_redirects: AtomicU64::new(0),
            www_redirects: AtomicU64::new(0),
            passed_through: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

pub struct AppState {
    pub loaded: LoadedConfig,
    pub rules: RuleSet,
    pub assets: Arc<dyn AssetProvider>,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(loaded: LoadedConfig, assets: Arc<dyn AssetProvider>) -> Self {
        let rules = loaded.config.rules();
        Self {
            loaded,
            rules,
            assets,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // With more than one rustls crypto provider compiled in, rustls cannot
    // pick one on its own.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .fallback(redirect::edge_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}

//! Integration tests for the edge server: redirects, pass-through, health,
//! and graceful shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::header;
use axum::Router;

use friendgate::assets::{AssetProvider, DirectoryAssets, UpstreamAssets};
use friendgate::config::model::{AssetsConfig, Config, Variant};
use friendgate::config::ConfigVersion;
use friendgate::health::{HealthResponse, HEALTH_PATH};
use friendgate::server::{self, AppState, LoadedConfig};

const FRIEND: &str = "https://innei.in/friends";

fn site_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("friendgate-test-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(dir.join("posts")).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();
    std::fs::write(dir.join("posts/index.html"), "<h1>posts</h1>").unwrap();
    dir
}

async fn start_server(
    variant: Variant,
    assets: AssetsConfig,
    provider: Arc<dyn AssetProvider>,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>, Arc<AppState>) {
    let loaded = LoadedConfig {
        config: Config {
            variant,
            assets,
            ..Config::default()
        },
        version: ConfigVersion::Hash("test-hash".into()),
        source_name: "test".into(),
        loaded_at: Instant::now(),
    };
    let state = Arc::new(AppState::new(loaded, provider));
    let router = server::build_router(Arc::clone(&state), 1_048_576);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, shutdown_tx, state)
}

async fn start_directory_server(
    variant: Variant,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>, Arc<AppState>) {
    let root = site_dir();
    let assets = AssetsConfig {
        directory: Some(root.clone()),
        ..AssetsConfig::default()
    };
    start_server(variant, assets, Arc::new(DirectoryAssets::new(root, None))).await
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn friend_referer_is_redirected_with_path_and_query() {
    let (addr, shutdown, _) = start_directory_server(Variant::Middleware).await;

    let resp = client()
        .get(format!("http://{addr}/posts/hello?from=friends&page=2"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(
        location(&resp),
        "https://www.tnxg.moe/posts/hello?from=friends&page=2"
    );
    assert!(resp.headers().contains_key("x-correlation-id"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn friend_origin_is_redirected_when_referer_absent() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeIndex).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header(header::ORIGIN, "https://blog.xlenco.top")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "https://www.tnxg.moe/");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn stranger_gets_the_page() {
    let (addr, shutdown, _) = start_directory_server(Variant::Middleware).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header(header::REFERER, "https://stranger.example/")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "<h1>home</h1>");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn malformed_referer_falls_through() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeIndex).await;

    let resp = client()
        .get(format!("http://{addr}/posts/"))
        .header(header::REFERER, "not a url")
        .header(header::ORIGIN, "null")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "<h1>posts</h1>");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn static_assets_bypass_friend_check_when_enabled() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeCatchAll).await;

    let resp = client()
        .get(format!("http://{addr}/app.js"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "console.log(1)");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn static_assets_are_redirected_without_bypass() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeIndex).await;

    let resp = client()
        .get(format!("http://{addr}/app.js"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "https://www.tnxg.moe/app.js");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn www_prefixed_friend_matches_in_middleware() {
    let (addr, shutdown, _) = start_directory_server(Variant::Middleware).await;

    let resp = client()
        .get(format!("http://{addr}/about"))
        .header(header::REFERER, "https://www.innei.in/")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn bare_host_is_moved_to_www() {
    let (addr, shutdown, _) = start_directory_server(Variant::Middleware).await;

    let resp = client()
        .get(format!("http://{addr}/posts/?a=1"))
        .header(header::HOST, "tnxg.moe")
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 301);
    assert_eq!(location(&resp), "https://www.tnxg.moe/posts/?a=1");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn edge_variants_do_not_touch_host() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeCatchAll).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header(header::HOST, "tnxg.moe")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn site_page_named_health_is_still_redirected() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeIndex).await;

    let resp = client()
        .get(format!("http://{addr}/health"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);
    assert_eq!(location(&resp), "https://www.tnxg.moe/health");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn empty_referer_uses_referrer_spelling() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeIndex).await;

    let resp = client()
        .get(format!("http://{addr}/"))
        .header(header::REFERER, "")
        .header("referrer", FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_reports_rules_and_counters() {
    let (addr, shutdown, _) = start_directory_server(Variant::EdgeCatchAll).await;
    let http = client();

    http.get(format!("http://{addr}/x"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    http.get(format!("http://{addr}/")).send().await.unwrap();

    let health: HealthResponse = http
        .get(format!("http://{addr}{HEALTH_PATH}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(health.config.source, "test");
    assert_eq!(health.config.variant, Variant::EdgeCatchAll);
    assert!(health.config.rules.static_asset_bypass);
    assert!(!health.config.rules.www_canonicalization);
    assert_eq!(health.friends.canonical_origin, "https://www.tnxg.moe");
    assert!(health.friends.hosts > 0);
    assert_eq!(health.stats.friend_redirects, 1);
    assert_eq!(health.stats.passed_through, 1);
    assert_eq!(health.stats.failed, 0);

    let _ = shutdown.send(());
}

async fn start_upstream() -> SocketAddr {
    let app = Router::new().fallback(|req: Request| async move {
        let host = req
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let target = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_default();
        format!("{host} {target}")
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn start_upstream_server(
    upstream: SocketAddr,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>, Arc<AppState>) {
    let origin = url::Url::parse(&format!("http://{upstream}")).unwrap();
    let provider = UpstreamAssets::new(
        origin.clone(),
        server::build_http_client(),
        Duration::from_secs(5),
        1_048_576,
    );
    let assets = AssetsConfig {
        upstream: Some(origin.to_string()),
        ..AssetsConfig::default()
    };
    start_server(Variant::EdgeIndex, assets, Arc::new(provider)).await
}

#[tokio::test]
async fn upstream_receives_pass_through_requests() {
    let upstream = start_upstream().await;
    let (addr, shutdown, _) = start_upstream_server(upstream).await;

    let resp = client()
        .get(format!("http://{addr}/posts/1?q=rust"))
        .header(header::REFERER, "https://stranger.example/")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), format!("{upstream} /posts/1?q=rust"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let (addr, shutdown, state) = start_upstream_server(closed).await;

    let resp = client().get(format!("http://{addr}/")).send().await.unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(
        state.stats.failed.load(std::sync::atomic::Ordering::Relaxed),
        1
    );

    // Friends are still redirected while the upstream is down.
    let resp = client()
        .get(format!("http://{addr}/"))
        .header(header::REFERER, FRIEND)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 302);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown, _) = start_directory_server(Variant::Middleware).await;

    let url = format!("http://{addr}{HEALTH_PATH}");
    assert!(reqwest::get(&url).await.is_ok());

    let _ = shutdown.send(());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(reqwest::get(&url).await.is_err());
}

//! `friendgate run` — start the edge server.
//!
//! Loads configuration from a file or from flags alone, layers flag
//! overrides on top, builds the asset provider, and serves the Axum
//! router until SIGTERM / Ctrl+C.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::assets;
use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::sources::file_source::{FileSource, SUPPORTED_EXTENSIONS};
use crate::config::sources::inline::InlineSource;
use crate::config::validation::validate;
use crate::config::ConfigSource;
use crate::error::FriendgateError;
use crate::friends::{CANONICAL_ORIGIN, FRIENDS};
use crate::logging;
use crate::server::{self, AppState, LoadedConfig};

pub async fn execute(args: RunArgs) -> Result<(), FriendgateError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let loaded = load_config(&args).await?;
    let provider = assets::from_config(
        &loaded.config.assets,
        server::build_http_client(),
        args.max_body,
    )?;

    let variant = loaded.config.variant;
    let assets_desc = loaded.config.assets.describe();
    let source_name = loaded.source_name.clone();
    let state = Arc::new(AppState::new(loaded, provider));
    let rules = state.rules;

    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        config = %source_name,
        variant = %variant,
        static_asset_bypass = rules.static_asset_bypass,
        www_insensitive_match = rules.www_insensitive_match,
        www_canonicalization = rules.www_canonicalization,
        friends = FRIENDS.len(),
        canonical = CANONICAL_ORIGIN,
        assets = %assets_desc,
        "friendgate started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("friendgate stopped");
    Ok(())
}

/// Resolve the config source, apply flag overrides, and validate.
pub async fn load_config(args: &RunArgs) -> Result<LoadedConfig, FriendgateError> {
    let source: Box<dyn ConfigSource> = match resolve_file_source(args.config.as_deref()).await? {
        Some(file) => Box::new(file),
        None if has_asset_flags(args) => {
            let mut config = Config::default();
            apply_overrides(args, &mut config);
            Box::new(InlineSource::new(config))
        }
        None => {
            return Err(FriendgateError::NoConfigSource {
                hint: "Provide --config <file>, --assets-dir <dir> or --upstream <url>.\n  \
                       Run 'friendgate init' to create a config file."
                    .into(),
            })
        }
    };

    let (mut config, version) = source.read().await?;
    apply_overrides(args, &mut config);

    if let Err(errors) = validate(&config) {
        return Err(FriendgateError::ConfigValidation { errors });
    }

    Ok(LoadedConfig {
        config,
        version,
        source_name: source.name().to_string(),
        loaded_at: Instant::now(),
    })
}

const fn has_asset_flags(args: &RunArgs) -> bool {
    args.assets_dir.is_some() || args.upstream.is_some()
}

/// Flags win over the file. Choosing one asset provider clears the other.
pub fn apply_overrides(args: &RunArgs, config: &mut Config) {
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(ref dir) = args.assets_dir {
        config.assets.directory = Some(dir.clone());
        config.assets.upstream = None;
    }
    if let Some(ref page) = args.not_found {
        config.assets.not_found = Some(page.clone());
    }
    if let Some(ref upstream) = args.upstream {
        config.assets.upstream = Some(upstream.clone());
        config.assets.directory = None;
        config.assets.not_found = None;
    }
    if let Some(timeout) = args.timeout {
        config.assets.timeout = timeout;
    }
}

async fn resolve_file_source(explicit: Option<&Path>) -> Result<Option<FileSource>, FriendgateError> {
    if let Some(path) = explicit {
        return FileSource::for_path(path).map(Some);
    }

    for ext in SUPPORTED_EXTENSIONS {
        let path = PathBuf::from(format!("friendgate.{ext}"));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return FileSource::for_path(&path).map(Some);
        }
    }

    Ok(None)
}

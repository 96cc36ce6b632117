//! Pass-through collaborators that actually serve the site.
//!
//! The redirector never renders anything itself. Requests it lets through
//! go to an [`AssetProvider`], picked at startup from [`AssetsConfig`]:
//!
//! - [`DirectoryAssets`] serves a build output directory from disk.
//! - [`UpstreamAssets`] forwards to another HTTP origin.
//!
//! Either way the provider's response reaches the client unmodified.

pub mod directory;
pub mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::Response;

pub use directory::DirectoryAssets;
pub use upstream::UpstreamAssets;

use crate::config::model::AssetsConfig;
use crate::error::{FriendgateError, ValidationError};
use crate::server::HttpClient;

#[async_trait]
pub trait AssetProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn serve(&self, request: Request) -> Result<Response, FriendgateError>;
}

/// Build the provider named by a validated [`AssetsConfig`].
pub fn from_config(
    assets: &AssetsConfig,
    client: HttpClient,
    max_body: usize,
) -> Result<Arc<dyn AssetProvider>, FriendgateError> {
    if let Some(ref root) = assets.directory {
        if !root.is_dir() {
            tracing::warn!(root = %root.display(), "asset directory does not exist yet");
        }
        return Ok(Arc::new(DirectoryAssets::new(
            root.clone(),
            assets.not_found.clone(),
        )));
    }

    if let Some(ref upstream) = assets.upstream {
        let origin = url::Url::parse(upstream).map_err(|e| FriendgateError::UriParse {
            source: Box::new(e),
        })?;
        return Ok(Arc::new(UpstreamAssets::new(
            origin,
            client,
            std::time::Duration::from_millis(assets.timeout),
            max_body,
        )));
    }

    Err(FriendgateError::ConfigValidation {
        errors: vec![ValidationError {
            section: "assets".into(),
            field: "directory".into(),
            message: "no asset provider configured".into(),
            suggestion: Some("set assets.directory or assets.upstream".into()),
        }],
    })
}

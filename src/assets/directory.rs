//! Asset provider backed by a local build output directory.

use std::convert::Infallible;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use super::AssetProvider;
use crate::error::FriendgateError;

/// Serves files under `root`, appending `index.html` to directory paths so
/// prerendered pages resolve. With `not_found` set, misses get that page
/// with status 404.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
    not_found: Option<PathBuf>,
}

impl DirectoryAssets {
    #[must_use]
    pub const fn new(root: PathBuf, not_found: Option<PathBuf>) -> Self {
        Self { root, not_found }
    }
}

fn unwrap_infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

#[async_trait]
impl AssetProvider for DirectoryAssets {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn serve(&self, request: Request) -> Result<Response, FriendgateError> {
        let serve_dir = ServeDir::new(&self.root).append_index_html_on_directories(true);
        let response = match self.not_found {
            Some(ref page) => unwrap_infallible(
                serve_dir
                    .not_found_service(ServeFile::new(page))
                    .oneshot(request)
                    .await,
            )
            .map(Body::new),
            None => unwrap_infallible(serve_dir.oneshot(request).await).map(Body::new),
        };
        Ok(response)
    }
}

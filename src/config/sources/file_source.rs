//! Async file-based config source with SHA256 versioning.
//!
//! [`FileSource`] implements [`ConfigSource`] for every file format the
//! build supports. The format is picked from the file extension when the
//! source is created, so an unsupported extension fails before any I/O.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{parse_config_str, sha256_hex};
use crate::config::model::Config;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::FriendgateError;

/// Extensions accepted by this build, in auto-detection order.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    #[cfg(feature = "yaml")]
    "yaml",
    #[cfg(feature = "yaml")]
    "yml",
    #[cfg(feature = "json")]
    "json",
    #[cfg(feature = "toml")]
    "toml",
];

#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    format: &'static str,
}

impl FileSource {
    pub fn for_path(path: &Path) -> Result<Self, FriendgateError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = match ext {
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => "yaml",
            #[cfg(feature = "json")]
            "json" => "json",
            #[cfg(feature = "toml")]
            "toml" => "toml",
            other => return Err(FriendgateError::UnsupportedFormat(other.to_string())),
        };
        Ok(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_content(&self) -> Result<String, FriendgateError> {
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FriendgateError::ConfigFileNotFound {
                    path: self.path.clone(),
                }
            } else {
                FriendgateError::Io(e)
            }
        })
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        self.format
    }

    async fn read(&self) -> Result<(Config, ConfigVersion), FriendgateError> {
        let content = self.read_content().await?;
        let config = parse_config_str(self.format, &content, &self.path.display().to_string())?;
        let hash = sha256_hex(content.as_bytes());
        Ok((config, ConfigVersion::Hash(hash)))
    }
}

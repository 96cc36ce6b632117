//! Concrete [`ConfigSource`](super::ConfigSource) implementations.
//!
//! Provides file-based sources (YAML, JSON, TOML) gated by feature flags,
//! the [`inline`] source built from command-line flags, and the
//! [`parse_config_str`] helper for format-specific deserialization.

pub mod file_source;
pub mod inline;

use sha2::{Digest, Sha256};

use crate::config::model::Config;
use crate::error::FriendgateError;

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, FriendgateError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| FriendgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| FriendgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| FriendgateError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(FriendgateError::UnsupportedFormat(other.to_string())),
    }
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

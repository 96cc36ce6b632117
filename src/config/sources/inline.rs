//! Config source for deployments that pass everything on the command line.
//!
//! [`InlineSource`] wraps a [`Config`] assembled from flags. Its version
//! is the SHA256 of the config's JSON form so `/health` can still tell
//! two deployments apart.

use async_trait::async_trait;

use super::sha256_hex;
use crate::config::model::Config;
use crate::config::{ConfigSource, ConfigVersion};
use crate::error::FriendgateError;

#[derive(Debug, Clone)]
pub struct InlineSource {
    config: Config,
}

impl InlineSource {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigSource for InlineSource {
    fn name(&self) -> &'static str {
        "flags"
    }

    async fn read(&self) -> Result<(Config, ConfigVersion), FriendgateError> {
        let json = serde_json::to_string(&self.config).map_err(|e| FriendgateError::ConfigParse {
            path: "(flags)".into(),
            source: Box::new(e),
        })?;
        Ok((self.config.clone(), ConfigVersion::Hash(sha256_hex(json.as_bytes()))))
    }
}

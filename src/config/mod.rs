//! Configuration loading and validation.
//!
//! Defines the [`ConfigSource`] trait for pluggable config origins and
//! the [`ConfigVersion`] content hash reported by `/health`. Config is
//! read once at startup and never reloaded: the friend list and rules are
//! deploy-time constants. Submodules provide the data model, validation
//! logic, and concrete source implementations.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::FriendgateError;
use model::Config;
use validation::validate;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// First eight hex digits of the hash.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parse the config without validating it, so callers can layer
    /// overrides on top first.
    async fn read(&self) -> Result<(Config, ConfigVersion), FriendgateError>;

    async fn load(&self) -> Result<(Config, ConfigVersion), FriendgateError> {
        let (config, version) = self.read().await?;
        if let Err(errors) = validate(&config) {
            return Err(FriendgateError::ConfigValidation { errors });
        }
        Ok((config, version))
    }
}

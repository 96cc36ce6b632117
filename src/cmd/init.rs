//! `friendgate init` — generate a starter configuration file.
//!
//! The minimal config is serialized from a [`Config`] value so it always
//! matches the model. `--full` writes a commented template instead.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::config::model::{AssetsConfig, Config};
use crate::error::FriendgateError;

pub fn execute(args: &InitArgs) -> Result<(), FriendgateError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("friendgate.{}", args.format.extension())));

    if output.exists() {
        return Err(FriendgateError::FileExists { path: output });
    }

    let content = if args.full {
        full_template(&args.format).to_string()
    } else {
        serialize_config(&starter_config(), &args.format)?
    };

    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub fn starter_config() -> Config {
    Config {
        assets: AssetsConfig {
            directory: Some(".output/public".into()),
            ..AssetsConfig::default()
        },
        ..Config::default()
    }
}

/// Serialize a `Config` to a formatted string in the given format.
pub fn serialize_config(config: &Config, format: &ConfigFormat) -> Result<String, FriendgateError> {
    match format {
        #[cfg(feature = "yaml")]
        ConfigFormat::Yaml => serde_yml::to_string(config)
            .map_err(|e| FriendgateError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "yaml"))]
        ConfigFormat::Yaml => Err(FriendgateError::UnsupportedFormat("yaml".into())),

        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| FriendgateError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(feature = "toml")]
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| FriendgateError::Io(std::io::Error::other(e.to_string()))),

        #[cfg(not(feature = "toml"))]
        ConfigFormat::Toml => Err(FriendgateError::UnsupportedFormat("toml".into())),
    }
}

const fn full_template(format: &ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => YAML_FULL,
        ConfigFormat::Json => JSON_FULL,
        ConfigFormat::Toml => TOML_FULL,
    }
}

const YAML_FULL: &str = r#"# friendgate config
#
# The friend list and canonical origin are compiled in (src/friends.rs).
# This file only decides which rules apply and where pages come from.

# Rule preset:
#   middleware      asset bypass + www-insensitive matching + www redirect
#   edge-catch-all  asset bypass only
#   edge-index      every request is friend-checked
variant: middleware

# Per-rule overrides on top of the preset.
# rules:
#   static_asset_bypass: true
#   www_insensitive_match: true
#   www_canonicalization: true

# Exactly one of `directory` or `upstream`.
assets:
  directory: ".output/public"
  # not_found: ".output/public/404.html"
  # upstream: "http://127.0.0.1:4000"
  # timeout: 5000                      # upstream timeout in ms
"#;

const JSON_FULL: &str = r#"{
  "variant": "middleware",
  "rules": {
    "static_asset_bypass": true,
    "www_insensitive_match": true,
    "www_canonicalization": true
  },
  "assets": {
    "directory": ".output/public",
    "timeout": 5000
  }
}
"#;

const TOML_FULL: &str = r#"# friendgate config
#
# The friend list and canonical origin are compiled in (src/friends.rs).
# This file only decides which rules apply and where pages come from.

# middleware | edge-catch-all | edge-index
variant = "middleware"

# [rules]
# static_asset_bypass = true
# www_insensitive_match = true
# www_canonicalization = true

# Exactly one of `directory` or `upstream`.
[assets]
directory = ".output/public"
# not_found = ".output/public/404.html"
# upstream = "http://127.0.0.1:4000"
# timeout = 5000
"#;

//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors: a missing or doubled asset provider, an upstream URL that is
//! not http(s), a `not_found` page without a directory, a zero timeout.
//! Returns a list of [`ValidationError`] values with suggestions.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;
use crate::friends::{CANONICAL_ORIGIN, FRIENDS};

/// Validate an upstream origin URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{url}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let assets = &config.assets;

    match (&assets.directory, &assets.upstream) {
        (None, None) => errors.push(ValidationError {
            section: "assets".into(),
            field: "directory".into(),
            message: "no asset provider configured".into(),
            suggestion: Some("set assets.directory or assets.upstream".into()),
        }),
        (Some(_), Some(_)) => errors.push(ValidationError {
            section: "assets".into(),
            field: "upstream".into(),
            message: "directory and upstream are mutually exclusive".into(),
            suggestion: Some("keep exactly one of them".into()),
        }),
        _ => {}
    }

    if let Some(ref dir) = assets.directory {
        if dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                section: "assets".into(),
                field: "directory".into(),
                message: "directory cannot be empty".into(),
                suggestion: Some("use '.' for the current directory".into()),
            });
        }
    }

    if assets.not_found.is_some() && assets.directory.is_none() {
        errors.push(ValidationError {
            section: "assets".into(),
            field: "not_found".into(),
            message: "not_found only applies to a directory provider".into(),
            suggestion: None,
        });
    }

    if let Some(ref upstream) = assets.upstream {
        if let Err(msg) = validate_upstream_url(upstream) {
            errors.push(ValidationError {
                section: "assets".into(),
                field: "upstream".into(),
                message: msg,
                suggestion: if upstream.contains("://") {
                    None
                } else {
                    Some(format!("did you mean 'http://{upstream}'?"))
                },
            });
        }
    }

    if assets.timeout == 0 {
        errors.push(ValidationError {
            section: "assets".into(),
            field: "timeout".into(),
            message: "timeout must be greater than zero".into(),
            suggestion: None,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let rules = config.rules();
    let on_off = |b: bool| if b { "on" } else { "off" };

    let lines = [
        format!("  variant: {}", config.variant),
        format!("    static asset bypass:   {}", on_off(rules.static_asset_bypass)),
        format!("    www-insensitive match: {}", on_off(rules.www_insensitive_match)),
        format!("    www canonicalization:  {}", on_off(rules.www_canonicalization)),
        format!("  assets: {}", config.assets.describe()),
        format!("  friends: {} hosts -> {CANONICAL_ORIGIN}", FRIENDS.len()),
    ];

    format!("{} is valid\n{}", path, lines.join("\n"))
}

//! Serde data structures for the friendgate configuration file.
//!
//! Contains [`Config`] (the root), the deployment [`Variant`] presets,
//! per-flag [`RuleOverrides`], the merged [`RuleSet`], and
//! [`AssetsConfig`]. All sections derive `Serialize` and `Deserialize`
//! with `deny_unknown_fields` for strict parsing.
//!
//! The friend list and canonical origin are not part of the file: they
//! are compiled in from [`crate::friends`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const fn default_timeout() -> u64 {
    5000
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_default_variant(v: &Variant) -> bool {
    *v == Variant::default()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "is_default_variant")]
    pub variant: Variant,

    #[serde(default, skip_serializing_if = "RuleOverrides::is_default")]
    pub rules: RuleOverrides,

    #[serde(default)]
    pub assets: AssetsConfig,
}

impl Config {
    /// The variant preset with any per-flag overrides applied.
    #[must_use]
    pub fn rules(&self) -> RuleSet {
        self.rules.apply(self.variant.rules())
    }
}

/// Which of the deployed interception rules to reproduce.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Server-side middleware: asset bypass, `www.`-insensitive matching,
    /// and `www.` host canonicalization.
    #[default]
    Middleware,
    /// Catch-all edge function: asset bypass only.
    EdgeCatchAll,
    /// Index edge function: every request is friend-checked.
    EdgeIndex,
}

impl Variant {
    #[must_use]
    pub const fn rules(self) -> RuleSet {
        match self {
            Self::Middleware => RuleSet {
                static_asset_bypass: true,
                www_insensitive_match: true,
                www_canonicalization: true,
            },
            Self::EdgeCatchAll => RuleSet {
                static_asset_bypass: true,
                www_insensitive_match: false,
                www_canonicalization: false,
            },
            Self::EdgeIndex => RuleSet {
                static_asset_bypass: false,
                www_insensitive_match: false,
                www_canonicalization: false,
            },
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Middleware => "middleware",
            Self::EdgeCatchAll => "edge-catch-all",
            Self::EdgeIndex => "edge-index",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The effective behaviour flags of the redirector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleSet {
    /// Paths with a `.` that do not end in `.html` skip the friend check.
    pub static_asset_bypass: bool,
    /// `www.example.com` and `example.com` are treated as the same friend.
    pub www_insensitive_match: bool,
    /// Bare hosts (not `localhost`) get a 301 to their `www.` form.
    pub www_canonicalization: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Variant::default().rules()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_asset_bypass: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub www_insensitive_match: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub www_canonicalization: Option<bool>,
}

impl RuleOverrides {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn apply(&self, base: RuleSet) -> RuleSet {
        RuleSet {
            static_asset_bypass: self.static_asset_bypass.unwrap_or(base.static_asset_bypass),
            www_insensitive_match: self
                .www_insensitive_match
                .unwrap_or(base.www_insensitive_match),
            www_canonicalization: self
                .www_canonicalization
                .unwrap_or(base.www_canonicalization),
        }
    }
}

/// Where pass-through requests are served from. Exactly one of
/// `directory` or `upstream` must be set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Build output directory served as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Page served with status 404 when `directory` has no match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found: Option<PathBuf>,

    /// Origin that pass-through requests are forwarded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// Upstream timeout in milliseconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            not_found: None,
            upstream: None,
            timeout: default_timeout(),
        }
    }
}

impl AssetsConfig {
    /// Short description for logs and `/health`.
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.directory, &self.upstream) {
            (Some(dir), _) => format!("directory {}", dir.display()),
            (None, Some(url)) => format!("upstream {url}"),
            (None, None) => "none".to_string(),
        }
    }
}

//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate, check, health), and their associated
//! argument structs. Server flags have environment variable equivalents
//! for container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::model::Variant;

#[derive(Parser)]
#[command(
    name = "friendgate",
    version,
    about = "Edge redirector that sends friend-link visitors to the canonical site",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        friendgate init                          Create a starter config\n  \
        friendgate run                           Start with ./friendgate.yaml\n  \
        friendgate run --assets-dir .output/public  Serve a build directory, no config file\n  \
        friendgate check /posts/42 --referer https://innei.in/"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the edge server
    Run(Box<RunArgs>),

    /// Generate a starter config file
    Init(InitArgs),

    /// Validate a config file without starting
    Validate(ValidateArgs),

    /// Show what the redirector would do with one request
    Check(CheckArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        friendgate run                                       Auto-detect config\n  \
        friendgate run -c friendgate.toml                    Specific config file\n  \
        friendgate run --upstream http://127.0.0.1:4000      Forward to a renderer\n  \
        friendgate run --variant edge-catch-all -p 8080 --pretty")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Rules --
    /// Deployment variant (overrides the config file)
    #[arg(long, env = "FRIENDGATE_VARIANT", help_heading = "Rules")]
    pub variant: Option<Variant>,

    // -- Assets --
    /// Serve pass-through requests from this directory
    #[arg(
        long,
        env = "ASSETS_DIR",
        conflicts_with = "upstream",
        help_heading = "Assets"
    )]
    pub assets_dir: Option<PathBuf>,

    /// Page served with 404 when the directory has no match
    #[arg(long, env = "NOT_FOUND_PAGE", requires = "assets_dir", help_heading = "Assets")]
    pub not_found: Option<PathBuf>,

    /// Forward pass-through requests to this origin
    #[arg(long, env = "UPSTREAM_URL", help_heading = "Assets")]
    pub upstream: Option<String>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Upstream timeout in milliseconds (overrides the config file)
    #[arg(long, env = "REQUEST_TIMEOUT_MS", help_heading = "Tuning")]
    pub timeout: Option<u64>,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        friendgate init                           Minimal config (yaml)\n  \
        friendgate init --full                    Documented template\n  \
        friendgate init -f toml -o edge.toml      TOML format")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include full documentation as comments
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "friendgate.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        friendgate check '/posts/42?ref=x' --referer https://innei.in/foo\n  \
        friendgate check / --host tnxg.moe --variant middleware\n  \
        friendgate check /app.js --origin https://zwh.moe --json")]
pub struct CheckArgs {
    /// Request path, optionally with a query string
    #[arg(default_value = "/")]
    pub path: String,

    /// `Referer` header value
    #[arg(long)]
    pub referer: Option<String>,

    /// `Origin` header value
    #[arg(long)]
    pub origin: Option<String>,

    /// `Host` header value
    #[arg(long)]
    pub host: Option<String>,

    /// `X-Forwarded-Proto` header value
    #[arg(long)]
    pub proto: Option<String>,

    /// Take the variant and rule overrides from this config file
    #[arg(short, long, conflicts_with = "variant")]
    pub config: Option<PathBuf>,

    /// Variant to evaluate with
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

//! Friendgate is a small edge server for a personal blog.
//!
//! Visitors who arrive from a friend's site (their `Referer` or `Origin`
//! host is on a compiled-in allow-list) are sent with a `302` to the same
//! path and query on `https://www.tnxg.moe`. Everyone else falls through
//! to an asset provider: a static directory or an upstream origin.
//!
//! Three rule presets mirror the places the rule has been deployed:
//! a site-wide middleware, an edge catch-all, and an edge index handler.
//! See [`config::model::Variant`].
//!
//! # Architecture
//!
//! - [`friends`] -- The friend allow-list and canonical origin.
//! - [`redirect`] -- Request classification, header host extraction, and
//!   the redirect decision; also the Axum fallback handler.
//! - [`assets`] -- The [`AssetProvider`](assets::AssetProvider) trait with
//!   directory and upstream implementations.
//! - [`config`] -- Config model, validation, and the
//!   [`ConfigSource`](config::ConfigSource) trait.
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommands: run, init, validate, check, health.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /_friendgate/health` handler.
//! - [`logging`] -- Structured tracing setup with JSON and pretty output.
//! - [`server`] -- Shared state, router, HTTP client, graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file formats |
//! | `full` | All features |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod assets;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod friends;
pub mod health;
pub mod logging;
pub mod redirect;
pub mod server;

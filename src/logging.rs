//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output (for
//! production) or pretty-printed output (for TTY / local dev). Format
//! is auto-detected from the terminal but can be forced via `--json`
//! or `--pretty`.
//!
//! Connection-level chatter from `hyper_util` and `rustls` is held at
//! `warn` unless the requested level is `trace`.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

const NOISY_TARGETS: &[&str] = &["hyper_util", "rustls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[must_use]
pub fn filter_for(level: &LogLevel) -> Targets {
    let tracing_level = level.to_tracing_level();
    let mut filter = Targets::new().with_default(tracing_level);
    if tracing_level < Level::TRACE {
        for target in NOISY_TARGETS {
            filter = filter.with_target(*target, Level::WARN.min(tracing_level));
        }
    }
    filter
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter_for(level);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
    }

    #[test]
    fn pretty_flag_forces_pretty() {
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn noisy_targets_capped_below_trace() {
        let filter = filter_for(&LogLevel::Debug);
        assert!(filter.would_enable("friendgate::redirect", &Level::DEBUG));
        assert!(!filter.would_enable("hyper_util::client", &Level::DEBUG));
        assert!(filter.would_enable("hyper_util::client", &Level::WARN));
    }

    #[test]
    fn trace_enables_everything() {
        let filter = filter_for(&LogLevel::Trace);
        assert!(filter.would_enable("rustls::conn", &Level::TRACE));
    }

    #[test]
    fn error_level_stays_quiet_everywhere() {
        let filter = filter_for(&LogLevel::Error);
        assert!(!filter.would_enable("hyper_util::client", &Level::WARN));
        assert!(filter.would_enable("hyper_util::client", &Level::ERROR));
    }
}

//! Unified error types for friendgate.
//!
//! Defines [`FriendgateError`] (the main crate error enum) and
//! [`ValidationError`] for config validation failures. Error messages
//! include contextual hints to guide the user toward a fix.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub section: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}.{}: {}", self.section, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FriendgateError {
    #[error("No config source found.\n\n  {hint}")]
    NoConfigSource { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid {name} header value: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

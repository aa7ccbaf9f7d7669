// Infrastructure: logging
// Global tracing subscriber set up from the [logging] settings table

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Log level filter and output format (`pretty` or `json`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Install a global tracing subscriber
    ///
    /// `RUST_LOG` takes precedence over `level`. Returns `false` when a
    /// subscriber is already installed
    pub fn init(&self) -> bool {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => fmt().json().with_env_filter(filter).try_init().is_ok(),
            _ => fmt().with_env_filter(filter).try_init().is_ok(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

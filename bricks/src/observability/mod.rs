//! Tracing subscriber setup.
//!
//! Components in this crate only emit `tracing` events; installing a
//! subscriber is left to the application. [`init_tracing`] is a convenience
//! for binaries, benches and tests that want the crate's events on stderr.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset, e.g. `"bricks=debug"`.
    pub default_directive: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_directive: "bricks=info".to_string(),
        }
    }
}

impl TracingConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the fallback filter directive.
    #[must_use]
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Builds the filter: `RUST_LOG` if set, the default directive otherwise.
    pub fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .with_context(|| format!("invalid filter directive {:?}", self.default_directive)),
        }
    }
}

/// Installs a global `fmt` subscriber for `config`.
///
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> anyhow::Result<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TracingConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_directive, "bricks=info");
    }

    #[test]
    fn test_second_install_fails() {
        let config = TracingConfig::new().with_default_directive("bricks=debug");

        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}

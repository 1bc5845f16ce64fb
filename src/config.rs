//! # Configuration
//!
//! Explicit configuration objects for the client and server transports.
//!
//! Settings are passed into constructors rather than read from process-wide
//! state, so multiple instances with independent settings can coexist in
//! one process. This core owns no config files or environment variables;
//! the surrounding services decide where values come from.

use std::time::Duration;

use tracing::Level;

/// Client-side transport settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for connection attempts.
    pub connect_timeout: Duration,

    /// Whether to enable `SO_KEEPALIVE` on dialed sockets. The probe
    /// interval is left to the operating system.
    pub keepalive: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            keepalive: true,
        }
    }
}

impl ClientConfig {
    /// Validate the configuration for common issues.
    ///
    /// Returns a list of validation errors. Empty list means the
    /// configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.connect_timeout.as_millis() < 100 {
            errors.push("Connect timeout too short (minimum: 100ms)".to_string());
        } else if self.connect_timeout.as_secs() > 300 {
            errors.push("Connect timeout too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// Server-side transport settings.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// How long `stop()` keeps waiting for in-flight handlers. `None`
    /// waits until every handler has finished; a bounded wait stops
    /// waiting but never aborts the handlers themselves.
    pub shutdown_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Validate the configuration for common issues.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(timeout) = self.shutdown_timeout {
            if timeout.as_millis() < 100 {
                errors.push("Shutdown timeout too short (minimum: 100ms)".to_string());
            }
        }

        errors
    }
}

/// Logging settings consumed by [`crate::utils::logging::init`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` does not override it.
    pub log_level: Level,

    /// Whether to emit JSON-formatted log lines.
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

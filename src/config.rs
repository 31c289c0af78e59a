//! Engine configuration.
//!
//! Controls page-size limits, the snippet projection, and the auth-redirect
//! policy. All fields have defaults so a host config file can set only what it
//! overrides.

use serde::Deserialize;

// Default values for engine configuration
const DEFAULT_MAX_PAGE_LIMIT: u32 = 50;
const DEFAULT_SNIPPET_LEN: usize = 50;
const DEFAULT_AUTH_ERROR_MARKER: &str = "not authenticated";
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Feed engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on a single page fetch, applied regardless of the requested
    /// limit.
    pub max_page_limit: u32,
    /// Length of the derived text snippet, in characters.
    pub snippet_len: usize,
    /// Substring that marks an operation error as an authentication failure.
    pub auth_error_marker: String,
    /// Route the client is redirected to on an authentication failure.
    pub login_route: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            snippet_len: DEFAULT_SNIPPET_LEN,
            auth_error_marker: DEFAULT_AUTH_ERROR_MARKER.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Compact,
}

/// Logging settings consumed by `infra::telemetry::init`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

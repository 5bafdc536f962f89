//! DispatcherBlueprint - Config Loader output
//!
//! Describes the full dispatcher setup: rate window, outbound transport and
//! failure reporting.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Default document-creation endpoint
pub const DEFAULT_ENDPOINT: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Config file version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherBlueprint {
    /// Config file version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Rate window
    #[validate(nested)]
    pub rate: RateSettings,

    /// Outbound transport
    #[serde(default)]
    #[validate(nested)]
    pub transport: TransportSettings,

    /// Failure event reporting
    #[serde(default)]
    #[validate(nested)]
    pub failures: FailureSettings,
}

/// Rate window settings
///
/// `max_per_window` is signed so that a negative value in a config file is
/// reported as a validation error instead of a type error.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateSettings {
    /// Window length in milliseconds
    #[validate(range(min = 1, message = "window_ms must be > 0"))]
    pub window_ms: u64,

    /// Maximum dispatch attempts started per window
    #[validate(range(min = 1, message = "max_per_window must be >= 1"))]
    pub max_per_window: i64,
}

impl RateSettings {
    /// Window length as a `Duration`
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Transport kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// HTTP POST to `url`
    #[default]
    Http,
    /// Log payloads only (dry runs)
    Log,
}

/// Outbound transport settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportSettings {
    #[serde(default)]
    pub kind: TransportKind,

    /// Target URL (required for `http`)
    #[serde(default = "default_endpoint")]
    #[validate(url(message = "url must be an absolute URL"))]
    pub url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1, message = "timeout_ms must be > 0"))]
    pub timeout_ms: u64,

    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl TransportSettings {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            url: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            content_type: default_content_type(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Failure event channel settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FailureSettings {
    /// Capacity of the failure event channel
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1, message = "channel_capacity must be >= 1"))]
    pub channel_capacity: usize,
}

impl Default for FailureSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    64
}

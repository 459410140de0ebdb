//! Settings schema.

use extdev_core::Extension;
use serde::{Deserialize, Serialize};

/// Top-level server settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Public URL the host reaches the server through (usually a tunnel).
    pub public_url: Option<String>,
    /// Development store domain.
    pub store: Option<String>,
    /// Parent app.
    pub app: AppSettings,
    /// Manifest version tag.
    pub version: String,
    /// Build directory polling interval.
    pub watch_interval_ms: u64,
    /// Upper bound on waiting for push channels to close during shutdown.
    pub shutdown_timeout_ms: u64,
    /// Extensions served, in declaration order.
    pub extensions: Vec<Extension>,
}

impl Default for DevSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            public_url: None,
            store: None,
            app: AppSettings::default(),
            version: env!("CARGO_PKG_VERSION").into(),
            watch_interval_ms: 500,
            shutdown_timeout_ms: 5000,
            extensions: Vec::new(),
        }
    }
}

/// Parent app of the extensions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// App API key.
    pub api_key: Option<String>,
}

//! Server configuration.

use std::time::Duration;

use extdev_settings::DevSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the development server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Build directory polling interval in milliseconds.
    pub watch_interval_ms: u64,
    /// How long shutdown waits for push channels to finish, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl ServerConfig {
    /// Build directory polling interval.
    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    /// Push channel drain timeout.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// `host:port` as passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&DevSettings::default())
    }
}

impl From<&DevSettings> for ServerConfig {
    fn from(settings: &DevSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            watch_interval_ms: settings.watch_interval_ms,
            shutdown_timeout_ms: settings.shutdown_timeout_ms,
        }
    }
}

//! Settings error types.

use thiserror::Error;

/// Errors that can occur when loading or parsing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the config document.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The config document is not valid YAML (or JSON).
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The merged document does not match the settings schema.
    #[error("invalid config structure: {0}")]
    Json(#[from] serde_json::Error),
    /// A settings value was invalid (e.g., duplicate extension UUID).
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

//! Payloads sent to clients: push-channel status updates and the manifest.

use serde::{Deserialize, Serialize};

use crate::extension::Extension;

/// Well-known status update kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// First message on every push channel.
    Connected,
    /// Build output changed on disk.
    Update,
}

impl UpdateKind {
    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Update => "update",
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rebuild-status notification, pushed to every registered client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Update kind (`"connected"`, `"update"`, or any producer-defined tag).
    #[serde(rename = "type")]
    pub kind: String,
    /// Extensions the update refers to.
    pub extensions: Vec<Extension>,
}

impl StatusUpdate {
    /// Create an update with an arbitrary kind.
    pub fn new(kind: impl Into<String>, extensions: Vec<Extension>) -> Self {
        Self {
            kind: kind.into(),
            extensions,
        }
    }

    /// The initial update each push channel receives.
    pub fn connected(extensions: Vec<Extension>) -> Self {
        Self::new(UpdateKind::Connected.as_str(), extensions)
    }
}

/// One-shot manifest served on plain `GET /extensions/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestResponse {
    /// Current extensions, in configuration order.
    pub extensions: Vec<Extension>,
    /// Version tag of the manifest.
    pub version: String,
}

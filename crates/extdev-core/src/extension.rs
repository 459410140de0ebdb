//! Extension records as declared in the developer configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One UI extension known to the server.
///
/// Only `uuid` and the `development` directories are interpreted here. Every
/// other field (title, type, entries, renderer, ...) is carried through
/// untouched so the host receives exactly what the developer declared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    /// Unique identifier; also the path segment for asset URLs.
    pub uuid: String,
    /// Local development layout, if the extension is built locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development: Option<Development>,
    /// Remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where an extension lives on disk and where its build output goes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Development {
    /// Extension root, relative to the working directory.
    #[serde(default)]
    pub root_dir: String,
    /// Build output directory, relative to `root_dir`.
    #[serde(default)]
    pub build_dir: String,
    /// Remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Extension {
    /// Create an extension with only an identifier.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            development: None,
            extra: Map::new(),
        }
    }

    /// Attach a development layout.
    #[must_use]
    pub fn with_build_dir(mut self, root_dir: impl Into<String>, build_dir: impl Into<String>) -> Self {
        self.development = Some(Development {
            root_dir: root_dir.into(),
            build_dir: build_dir.into(),
            extra: Map::new(),
        });
        self
    }

    /// Whether the uuid can be used as a single route path segment: ASCII
    /// letters, digits, `-` and `_` only.
    pub fn has_path_safe_uuid(&self) -> bool {
        !self.uuid.is_empty()
            && self
                .uuid
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    /// Build output directory (`./<root_dir>/<build_dir>`), if configured.
    pub fn build_path(&self) -> Option<PathBuf> {
        self.development
            .as_ref()
            .map(|dev| PathBuf::from(".").join(&dev.root_dir).join(&dev.build_dir))
    }
}

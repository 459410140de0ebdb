//! Read-only source of the extension list.

use crate::extension::Extension;

/// Supplies the current ordered extension list and the manifest version.
///
/// The server only reads from a provider; it never mutates it.
pub trait ExtensionProvider: Send + Sync {
    /// Current extensions, in declaration order.
    fn extensions(&self) -> Vec<Extension>;

    /// Manifest version tag.
    fn version(&self) -> String;
}

/// Provider over a fixed list, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct StaticExtensionProvider {
    extensions: Vec<Extension>,
    version: String,
}

impl StaticExtensionProvider {
    /// Create a provider.
    pub fn new(extensions: Vec<Extension>, version: impl Into<String>) -> Self {
        Self {
            extensions,
            version: version.into(),
        }
    }
}

impl ExtensionProvider for StaticExtensionProvider {
    fn extensions(&self) -> Vec<Extension> {
        self.extensions.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }
}

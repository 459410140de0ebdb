//! One-shot manifest responder.

use axum::Json;
use extdev_core::{ExtensionProvider, ManifestResponse};

/// Snapshot the provider into a manifest.
pub fn build_manifest(provider: &dyn ExtensionProvider) -> ManifestResponse {
    ManifestResponse {
        extensions: provider.extensions(),
        version: provider.version(),
    }
}

/// `200 OK` with the manifest as `application/json`.
pub fn respond(provider: &dyn ExtensionProvider) -> Json<ManifestResponse> {
    Json(build_manifest(provider))
}

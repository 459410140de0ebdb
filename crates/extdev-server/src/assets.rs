//! Static build artifacts under `/extensions/{uuid}/assets/`.

use axum::Router;
use extdev_core::Extension;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

/// Route prefix for an extension's assets.
pub fn assets_prefix(uuid: &str) -> String {
    format!("/extensions/{uuid}/assets")
}

/// One `ServeDir` per extension with a build directory.
///
/// Unknown UUIDs fall through to the router's 404; missing files get a 404
/// from `ServeDir` itself. Extensions whose uuid would be read as route
/// syntax are skipped.
pub fn asset_router<S>(extensions: &[Extension]) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    extensions.iter().fold(Router::new(), |router, ext| {
        if !ext.has_path_safe_uuid() {
            warn!(uuid = %ext.uuid, "extension uuid is not path-safe, skipping assets");
            return router;
        }
        let Some(build_dir) = ext.build_path() else {
            debug!(uuid = %ext.uuid, "extension has no build directory, skipping assets");
            return router;
        };
        debug!(uuid = %ext.uuid, build_dir = %build_dir.display(), "serving extension assets");
        router.nest_service(&assets_prefix(&ext.uuid), ServeDir::new(build_dir))
    })
}

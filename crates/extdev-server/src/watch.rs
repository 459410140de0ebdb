//! Build directory polling that feeds the broadcaster.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use extdev_core::{Extension, ExtensionProvider, StatusUpdate, UpdateKind};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::websocket::broadcast::Broadcaster;

/// Summary of a build directory's contents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fingerprint {
    /// Number of regular files.
    pub files: usize,
    /// Total size of regular files in bytes.
    pub bytes: u64,
    /// Latest modification time among them.
    pub modified: Option<SystemTime>,
}

/// Fingerprint `dir`, or `None` if it does not exist.
pub fn fingerprint(dir: &Path) -> Option<Fingerprint> {
    if !dir.is_dir() {
        return None;
    }
    let mut print = Fingerprint::default();
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        print.files += 1;
        print.bytes += meta.len();
        if let Ok(modified) = meta.modified() {
            print.modified = print.modified.max(Some(modified));
        }
    }
    Some(print)
}

/// Polls every extension's build directory and broadcasts an `update` with
/// the extensions whose output changed.
pub struct BuildWatcher {
    provider: Arc<dyn ExtensionProvider>,
    broadcaster: Arc<Broadcaster>,
    interval: Duration,
}

impl BuildWatcher {
    /// Create a watcher.
    pub fn new(
        provider: Arc<dyn ExtensionProvider>,
        broadcaster: Arc<Broadcaster>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            broadcaster,
            interval,
        }
    }

    /// Poll until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut seen: Option<HashMap<String, Option<Fingerprint>>> = None;
        info!(interval_ms = self.interval.as_millis(), "build watcher started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let extensions = self.provider.extensions();
            let current = match scan(&extensions).await {
                Ok(current) => current,
                Err(error) => {
                    warn!(%error, "build directory scan failed");
                    continue;
                }
            };

            if let Some(previous) = &seen {
                let changed: Vec<Extension> = extensions
                    .into_iter()
                    .filter(|ext| previous.get(&ext.uuid) != current.get(&ext.uuid))
                    .collect();
                if !changed.is_empty() {
                    debug!(changed = changed.len(), "build output changed");
                    let _ = self
                        .broadcaster
                        .notify(StatusUpdate::new(UpdateKind::Update.as_str(), changed));
                }
            }
            seen = Some(current);
        }
        info!("build watcher stopped");
    }
}

/// Fingerprint all build directories off the async runtime.
async fn scan(
    extensions: &[Extension],
) -> Result<HashMap<String, Option<Fingerprint>>, tokio::task::JoinError> {
    let dirs: Vec<(String, Option<PathBuf>)> = extensions
        .iter()
        .map(|ext| (ext.uuid.clone(), ext.build_path()))
        .collect();
    tokio::task::spawn_blocking(move || {
        dirs.into_iter()
            .map(|(uuid, dir)| (uuid, dir.as_deref().and_then(fingerprint)))
            .collect()
    })
    .await
}

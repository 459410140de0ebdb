//! Registry of live push channels and their notification callbacks.

use std::collections::HashMap;
use std::sync::Arc;

use extdev_core::StatusUpdate;
use metrics::gauge;
use parking_lot::RwLock;
use tracing::debug;

use super::connection::{Connection, ConnectionId};
use crate::metrics::WS_CONNECTIONS_ACTIVE;

/// Callback invoked with every broadcast update; must not block.
pub type NotifyCallback = Arc<dyn Fn(Arc<StatusUpdate>) + Send + Sync>;

struct Entry {
    connection: Arc<Connection>,
    notify: NotifyCallback,
}

/// Concurrent map from connection to notification callback.
///
/// A connection appears at most once. Traversal runs over a snapshot taken
/// under the read lock, so visitors may register or unregister freely.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with its callback. Always succeeds.
    pub fn register(&self, connection: Arc<Connection>, notify: NotifyCallback) -> bool {
        let id = connection.id().clone();
        let replaced = self.entries.write().insert(
            id.clone(),
            Entry {
                connection: Arc::clone(&connection),
                notify,
            },
        );
        match replaced {
            Some(previous) if !Arc::ptr_eq(&previous.connection, &connection) => {
                let _ = previous.connection.close();
            }
            Some(_) => {}
            None => gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0),
        }
        debug!(conn_id = %id, "push channel registered");
        true
    }

    /// Close `connection` and remove it if it is still the registered entry.
    ///
    /// Idempotent: unregistering an absent (or already replaced) connection
    /// only closes the handle. Returns whether an entry was removed.
    pub fn unregister(&self, connection: &Connection) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            let is_current = entries
                .get(connection.id())
                .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(&entry.connection), connection));
            if is_current {
                entries.remove(connection.id())
            } else {
                None
            }
        };
        let _ = connection.close();
        if removed.is_some() {
            gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
            debug!(conn_id = %connection.id(), "push channel unregistered");
            true
        } else {
            false
        }
    }

    /// Visit every connection registered at the time of the call.
    pub fn for_each(&self, mut visitor: impl FnMut(&Arc<Connection>, &NotifyCallback)) {
        let snapshot: Vec<(Arc<Connection>, NotifyCallback)> = self
            .entries
            .read()
            .values()
            .map(|entry| (Arc::clone(&entry.connection), Arc::clone(&entry.notify)))
            .collect();
        for (connection, notify) in &snapshot {
            visitor(connection, notify);
        }
    }

    /// Close and unregister every connection. Returns how many were removed.
    pub fn close_all(&self) -> usize {
        let mut connections = Vec::new();
        self.for_each(|connection, _| connections.push(Arc::clone(connection)));
        connections
            .iter()
            .filter(|connection| self.unregister(connection))
            .count()
    }

    #[cfg(test)]
    fn contains(&self, connection: &Connection) -> bool {
        self.entries
            .read()
            .get(connection.id())
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(&entry.connection), connection))
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

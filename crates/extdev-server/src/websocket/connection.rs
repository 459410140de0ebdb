//! Push channel handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Unique connection identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh, time-ordered identifier.
    pub fn new() -> Self {
        Self(format!("conn_{}", Uuid::now_v7()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live push channel.
///
/// The socket itself is owned by the channel's tasks; the handle only carries
/// the close signal they watch. Closing is idempotent and may race freely
/// between a peer-initiated close, a failed write and a server shutdown.
pub struct Connection {
    id: ConnectionId,
    connected_at: Instant,
    closing: AtomicBool,
    closed: CancellationToken,
}

impl Connection {
    /// Create a new open connection handle.
    pub fn new() -> Self {
        Self {
            id: ConnectionId::new(),
            connected_at: Instant::now(),
            closing: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    /// Connection identifier.
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Signal the channel tasks to close the socket.
    ///
    /// Returns `true` only for the call that actually closed the connection.
    pub fn close(&self) -> bool {
        if self.closing.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.closed.cancel();
        true
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Resolves once the connection is closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn ids_are_unique_and_prefixed() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conn_"));
        assert_eq!(a.to_string(), a.as_str());
    }

    #[test]
    fn new_connection_is_open() {
        let conn = Connection::new();
        assert!(!conn.is_closed());
    }

    #[test]
    fn close_is_idempotent() {
        let conn = Connection::new();
        assert!(conn.close());
        assert!(!conn.close());
        assert!(!conn.close());
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn closed_future_resolves_after_close() {
        let conn = Arc::new(Connection::new());
        let waiter = Arc::clone(&conn);
        let handle = tokio::spawn(async move {
            waiter.closed().await;
            true
        });
        let _ = conn.close();
        assert!(handle.await.unwrap());
    }

    #[test]
    fn concurrent_close_has_single_winner() {
        let conn = Arc::new(Connection::new());
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let conn = Arc::clone(&conn);
                    s.spawn(move || usize::from(conn.close()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });
        assert_eq!(winners, 1);
    }

    #[test]
    fn debug_shows_id() {
        let conn = Connection::new();
        assert!(format!("{conn:?}").contains("conn_"));
    }
}

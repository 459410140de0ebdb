//! Server error types.

use thiserror::Error;

/// Listener-level failures. Per-connection failures never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound (e.g., port already in use).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested `host:port`.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },
    /// The server loop stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
    /// The server task panicked or was aborted.
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

//! Status update fan-out to registered push channels.

use std::sync::Arc;

use extdev_core::StatusUpdate;
use metrics::counter;
use tracing::debug;

use super::registry::ConnectionRegistry;
use crate::metrics::{BROADCAST_DELIVERIES_TOTAL, BROADCASTS_TOTAL};

/// Delivers status updates to every registered callback.
///
/// The broadcaster only sees callbacks, never sockets: each callback enqueues
/// onto its own connection's delivery queue, so one stalled client cannot
/// hold up the others.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over `registry`.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Hand `update` to every connection registered at the time of the call.
    ///
    /// Returns the number of recipients.
    pub fn notify(&self, update: StatusUpdate) -> usize {
        let update = Arc::new(update);
        let mut recipients = 0usize;
        self.registry.for_each(|_, notify| {
            notify(Arc::clone(&update));
            recipients += 1;
        });
        counter!(BROADCASTS_TOTAL).increment(1);
        counter!(BROADCAST_DELIVERIES_TOTAL).increment(recipients as u64);
        debug!(kind = %update.kind, recipients, "broadcast status update");
        recipients
    }
}

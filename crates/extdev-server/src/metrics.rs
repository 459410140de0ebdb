//! Metric names recorded through the `metrics` facade.
//!
//! No exporter is installed by this crate; embedders may install any
//! `metrics` recorder to collect these.

/// Push channels opened (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// Push channels closed (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Registered push channels (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Failed writes to a push channel (counter).
pub const WS_WRITE_FAILURES_TOTAL: &str = "ws_write_failures_total";
/// Status updates broadcast (counter).
pub const BROADCASTS_TOTAL: &str = "broadcasts_total";
/// Status updates handed to push channel queues (counter).
pub const BROADCAST_DELIVERIES_TOTAL: &str = "broadcast_deliveries_total";

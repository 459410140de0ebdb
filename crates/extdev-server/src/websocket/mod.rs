//! Push channels: connection handles, the registry, broadcasting, and the
//! per-connection handler.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Opaque handle with an idempotent close signal |
//! | `registry` | Concurrent map of live connections to their notify callbacks |
//! | `broadcast` | Fan-out of one status update to every registered callback |
//! | `channel` | Upgrade handling, delivery queue, read loop, unregistration |

pub mod broadcast;
pub mod channel;
pub mod connection;
pub mod registry;

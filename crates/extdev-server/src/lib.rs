//! # extdev-server
//!
//! Axum HTTP + `WebSocket` server for local UI-extension development.
//!
//! - `GET /` redirects to `/extensions/`
//! - `GET /extensions/` serves the JSON manifest, or upgrades to a push channel
//! - `GET /extensions/{uuid}/assets/*` serves files from the extension's build directory
//! - Status updates fan out to every push channel through the connection registry
//! - Cancellation closes every push channel before the listener is released

#![deny(unsafe_code)]

pub mod assets;
pub mod config;
pub mod errors;
pub mod manifest;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod watch;
pub mod websocket;

pub use config::ServerConfig;
pub use errors::ServerError;
pub use server::DevServer;

//! # extdev-core
//!
//! Shared types for the extension development server.
//!
//! - [`Extension`]: one UI extension as described by the developer config
//! - [`ExtensionProvider`]: read-only source of the extension list and version
//! - [`StatusUpdate`] / [`ManifestResponse`]: the two payloads clients receive
//! - [`logging`]: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod extension;
pub mod logging;
pub mod provider;
pub mod status;

pub use extension::{Development, Extension};
pub use provider::{ExtensionProvider, StaticExtensionProvider};
pub use status::{ManifestResponse, StatusUpdate, UpdateKind};

//! # extdev-settings
//!
//! Configuration for the extension development server.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`DevSettings::default()`]
//! 2. **Config document**: YAML or JSON, from a file or stdin (deep-merged over defaults)
//! 3. **Environment variables**: `EXTDEV_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_reader, load_settings_from_str};
pub use types::{AppSettings, DevSettings};

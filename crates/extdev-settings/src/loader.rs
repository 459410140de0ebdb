//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`DevSettings::default()`]
//! 2. Parse the config document (YAML; JSON is accepted as YAML) and
//!    deep-merge it over the defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate extension identifiers
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::DevSettings;

/// Load settings from a config file, or from stdin when `path` is `-`.
pub fn load_settings(path: &Path) -> Result<DevSettings> {
    if path.as_os_str() == "-" {
        debug!("reading config from stdin");
        load_settings_from_reader(std::io::stdin().lock())
    } else {
        debug!(?path, "reading config file");
        let content = std::fs::read_to_string(path)?;
        load_settings_from_str(&content)
    }
}

/// Load settings from any reader.
pub fn load_settings_from_reader(mut reader: impl Read) -> Result<DevSettings> {
    let mut content = String::new();
    let _ = reader.read_to_string(&mut content)?;
    load_settings_from_str(&content)
}

/// Load settings from a YAML or JSON document, applying env overrides.
pub fn load_settings_from_str(content: &str) -> Result<DevSettings> {
    let mut settings = parse_document(content)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Merge a document over the compiled defaults, without env overrides.
fn parse_document(content: &str) -> Result<DevSettings> {
    let defaults = serde_json::to_value(DevSettings::default())?;
    if content.trim().is_empty() {
        debug!("empty config document, using defaults");
        return Ok(serde_json::from_value(defaults)?);
    }
    let user: Value = serde_yaml::from_str(content)?;
    let merged = if user.is_null() {
        defaults
    } else {
        deep_merge(defaults, user)
    };
    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `EXTDEV_*` overrides, reading variables through `lookup`.
///
/// Invalid values are ignored with a warning (file/default value wins).
pub fn apply_env_overrides(settings: &mut DevSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read_string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(val) = lookup("EXTDEV_PORT") {
        match parse_u16_range(&val, 1, 65535) {
            Some(port) => settings.port = port,
            None => warn!(key = "EXTDEV_PORT", value = %val, "invalid port env var, ignoring"),
        }
    }
    if let Some(host) = read_string("EXTDEV_HOST") {
        settings.host = host;
    }
    if let Some(url) = read_string("EXTDEV_PUBLIC_URL") {
        settings.public_url = Some(url);
    }
    if let Some(val) = lookup("EXTDEV_WATCH_INTERVAL_MS") {
        match parse_u64_range(&val, 50, 60_000) {
            Some(ms) => settings.watch_interval_ms = ms,
            None => {
                warn!(key = "EXTDEV_WATCH_INTERVAL_MS", value = %val, "invalid interval env var, ignoring");
            }
        }
    }
}

/// Extension UUIDs must be non-empty, unique and path-safe; they key asset
/// routes.
pub fn validate(settings: &DevSettings) -> Result<()> {
    let mut seen = HashSet::new();
    for ext in &settings.extensions {
        if ext.uuid.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "extension uuid must not be empty".into(),
            ));
        }
        if !ext.has_path_safe_uuid() {
            return Err(SettingsError::InvalidValue(format!(
                "extension uuid {:?} may only contain ASCII letters, digits, '-' and '_'",
                ext.uuid
            )));
        }
        if !seen.insert(ext.uuid.as_str()) {
            return Err(SettingsError::InvalidValue(format!(
                "duplicate extension uuid: {}",
                ext.uuid
            )));
        }
    }
    Ok(())
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

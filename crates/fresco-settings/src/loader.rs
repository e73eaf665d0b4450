//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`FrescoSettings::default()`]
//! 2. If `~/.fresco/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{CredentialsMode, FrescoSettings, TransportPreference};

/// Resolve the path to the settings file (`~/.fresco/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fresco").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<FrescoSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<FrescoSettings> {
    let defaults = serde_json::to_value(FrescoSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: FrescoSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
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

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut FrescoSettings) {
    if let Some(v) = read_env_string("FRESCO_EVENTS_URL") {
        settings.events.base_url = v;
    }
    if let Some(v) = read_env_string("FRESCO_BEARER_TOKEN") {
        settings.events.credentials = CredentialsMode::Include;
        settings.events.bearer_token = Some(v);
    }
    if let Some(v) = read_env_string("FRESCO_TRANSPORT") {
        if let Ok(pref) = serde_json::from_value::<TransportPreference>(Value::String(v)) {
            settings.events.transport = pref;
        }
    }
    if let Some(v) = read_env_u64("FRESCO_POLL_INTERVAL_MS", 100, 600_000) {
        settings.events.poll_interval_ms = v;
    }
    if let Some(v) = read_env_usize("FRESCO_CHANNEL_CAPACITY", 1, 65_536) {
        settings.events.channel_capacity = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_u64_range(&v, min, max))
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_usize_range(&v, min, max))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn deep_merge_objects_recursively() {
        let target = serde_json::json!({"events": {"baseUrl": "a", "pollIntervalMs": 3000}});
        let source = serde_json::json!({"events": {"baseUrl": "b"}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["events"]["baseUrl"], "b");
        assert_eq!(merged["events"]["pollIntervalMs"], 3000);
    }

    #[test]
    fn deep_merge_null_preserves_target() {
        let target = serde_json::json!({"events": {"baseUrl": "a"}});
        let source = serde_json::json!({"events": {"baseUrl": null}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["events"]["baseUrl"], "a");
    }

    #[test]
    fn deep_merge_arrays_replaced() {
        let target = serde_json::json!({"list": [1, 2, 3]});
        let source = serde_json::json!({"list": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["list"], serde_json::json!([4]));
    }

    #[test]
    fn deep_merge_adds_new_keys() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let settings =
            load_settings_from_path(Path::new("/nonexistent/fresco/settings.json")).unwrap();
        assert_eq!(settings.events.base_url, "http://127.0.0.1:4620");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let result = load_settings_from_path(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"events":{{"baseUrl":"https://shop.example.com","credentials":"include"}}}}"#
        )
        .unwrap();
        let settings = load_settings_from_path(file.path()).unwrap();
        assert_eq!(settings.events.base_url, "https://shop.example.com");
        assert_eq!(settings.events.credentials, CredentialsMode::Include);
        // Untouched fields keep defaults
        assert_eq!(settings.events.poll_interval_ms, 3000);
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("100", 100, 600_000), Some(100));
        assert_eq!(parse_u64_range("600000", 100, 600_000), Some(600_000));
        assert_eq!(parse_u64_range("99", 100, 600_000), None);
        assert_eq!(parse_u64_range("600001", 100, 600_000), None);
        assert_eq!(parse_u64_range("abc", 100, 600_000), None);
        assert_eq!(parse_u64_range("-5", 100, 600_000), None);
    }

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("256", 1, 65_536), Some(256));
        assert_eq!(parse_usize_range("0", 1, 65_536), None);
        assert_eq!(parse_usize_range("", 1, 65_536), None);
    }
}

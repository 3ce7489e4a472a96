//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `AMIS_ADMIN_DEBUG` | `debug` |
//! | `AMIS_ADMIN_LOG_LEVEL` | `log_level` |
//! | `AMIS_ADMIN_SITE_TITLE` | `site_title` |
//! | `AMIS_ADMIN_API_PREFIX` | `api_prefix` |
//! | `AMIS_ADMIN_MEDIA_URL` | `media_url` |
//! | `AMIS_ADMIN_LIST_PER_PAGE` | `list_per_page` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use amis_admin_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("admin.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::AdminError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys missing from the document keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, AdminError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| AdminError::Configuration(format!("Failed to parse TOML: {e}")))?;
    from_toml_value(toml_value)
}

/// Loads settings from an already-parsed TOML table, e.g. the
/// `[settings]` section of a larger document.
pub fn from_toml_value(value: toml::Value) -> Result<Settings, AdminError> {
    merge_over_defaults(toml_to_json(value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, AdminError> {
    from_toml_str(&read_file(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, AdminError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, AdminError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| AdminError::Configuration(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, AdminError> {
    from_json_str(&read_file(path.as_ref(), "JSON")?)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `AMIS_ADMIN_*` environment variable overrides.
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("AMIS_ADMIN_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Ok(val) = std::env::var("AMIS_ADMIN_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("AMIS_ADMIN_SITE_TITLE") {
        settings.site_title = val;
    }

    if let Ok(val) = std::env::var("AMIS_ADMIN_API_PREFIX") {
        settings.api_prefix = val;
    }

    if let Ok(val) = std::env::var("AMIS_ADMIN_MEDIA_URL") {
        settings.media_url = val;
    }

    if let Ok(val) = std::env::var("AMIS_ADMIN_LIST_PER_PAGE") {
        if let Ok(n) = val.parse::<usize>() {
            settings.list_per_page = n;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_file(path: &Path, kind: &str) -> Result<String, AdminError> {
    std::fs::read_to_string(path).map_err(|e| {
        AdminError::Configuration(format!(
            "Failed to read {kind} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, kind: &str) -> Result<Settings, AdminError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        AdminError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        AdminError::Configuration(format!("Failed to deserialize settings from {kind}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
pub fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            site_title = "Shop admin"
            list_per_page = 25
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.site_title, "Shop admin");
        assert_eq!(settings.list_per_page, 25);
        // Defaults preserved
        assert_eq!(settings.media_url, "/media/");
        assert_eq!(settings.max_per_page, 100);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.api_prefix, "/admin");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = from_toml_str("debug = = true").unwrap_err();
        assert!(matches!(err, AdminError::Configuration(_)));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let err = from_toml_str("list_per_page = \"many\"").unwrap_err();
        assert!(err.to_string().contains("deserialize"));
    }

    #[test]
    fn test_from_toml_str_extra() {
        let toml = r#"
            [extra]
            theme = "dark"
        "#;
        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.extra.get("theme"), Some(&serde_json::json!("dark")));
    }

    #[test]
    fn test_from_json_str() {
        let settings =
            from_json_str(r#"{"media_url": "https://cdn.example.com/", "debug": false}"#).unwrap();
        assert_eq!(settings.media_url, "https://cdn.example.com/");
        assert!(!settings.debug);
        assert_eq!(settings.list_per_page, 10);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = from_toml_file("/nonexistent/admin.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read TOML file"));
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        let over = serde_json::json!({"a": {"b": 10}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"b": 10, "c": 2}, "d": 3}));
    }

    #[test]
    fn test_toml_to_json_array() {
        let value: toml::Value = toml::from_str("xs = [1, 2]").unwrap();
        assert_eq!(toml_to_json(value), serde_json::json!({"xs": [1, 2]}));
    }
}

//! Settings for an admin site.
//!
//! [`Settings`] holds everything the engines and the router read at runtime:
//! the API prefix, media URL used by file fields, pagination limits, and the
//! logging level. Values come from defaults, then a TOML/JSON document, then
//! environment overrides (see [`settings_loader`](crate::settings_loader)).

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The complete set of admin settings.
///
/// # Examples
///
/// ```
/// use amis_admin_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.api_prefix, "/admin");
/// assert_eq!(settings.list_per_page, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// Title shown on the site index.
    pub site_title: String,
    /// Path prefix under which the admin API is mounted.
    pub api_prefix: String,

    // ── Media ────────────────────────────────────────────────────────

    /// URL prefix prepended to stored file and image paths on the wire.
    pub media_url: String,
    /// Directory holding uploaded files, if served by this process.
    pub media_root: Option<PathBuf>,

    // ── Pagination ───────────────────────────────────────────────────

    /// Default page size for list and option queries.
    pub list_per_page: usize,
    /// Upper bound for a client-requested page size.
    pub max_per_page: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "amis_admin=trace").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            site_title: "Admin".to_string(),
            api_prefix: "/admin".to_string(),
            media_url: "/media/".to_string(),
            media_root: None,
            list_per_page: 10,
            max_per_page: 100,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Clamps a client-supplied page size into `1..=max_per_page`.
    pub fn clamp_per_page(&self, per_page: Option<usize>) -> usize {
        per_page
            .unwrap_or(self.list_per_page)
            .clamp(1, self.max_per_page.max(1))
    }
}

//! The `check` management command.
//!
//! Builds every configured resource and reports configuration problems
//! without starting a server.

use async_trait::async_trait;

use amis_admin_core::AdminError;

use crate::command::{ManagementCommand, Project};

/// Validates the site document.
pub struct CheckCommand;

/// The result of a single check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// Severity.
    pub level: CheckLevel,
    /// What is wrong.
    pub msg: String,
    /// How to fix it, if known.
    pub hint: Option<String>,
    /// Stable identifier, e.g. `"site.E001"`.
    pub id: String,
}

/// Severity levels for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// Informational message.
    Info,
    /// Suspicious but servable.
    Warning,
    /// The site cannot be served.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl CheckMessage {
    fn new(level: CheckLevel, id: &str, msg: impl Into<String>, hint: Option<&str>) -> Self {
        Self {
            level,
            msg: msg.into(),
            hint: hint.map(str::to_string),
            id: id.to_string(),
        }
    }
}

/// Runs every check against `project`.
pub fn run_checks(project: &Project) -> Vec<CheckMessage> {
    let mut messages = Vec::new();
    let settings = &project.settings;

    if let Err(e) = project.build_in_memory() {
        messages.push(CheckMessage::new(
            CheckLevel::Error,
            "site.E001",
            e.to_string(),
            None,
        ));
    }

    if !settings.api_prefix.starts_with('/') {
        messages.push(CheckMessage::new(
            CheckLevel::Error,
            "settings.E001",
            format!("api_prefix '{}' is not an absolute path", settings.api_prefix),
            Some("Start api_prefix with '/', e.g. \"/admin\""),
        ));
    }

    if settings.list_per_page > settings.max_per_page {
        messages.push(CheckMessage::new(
            CheckLevel::Warning,
            "settings.W001",
            format!(
                "list_per_page ({}) exceeds max_per_page ({})",
                settings.list_per_page, settings.max_per_page
            ),
            Some("Pages are clamped to max_per_page"),
        ));
    }

    for resource in &project.config.resources {
        if resource.operations.is_empty() {
            messages.push(CheckMessage::new(
                CheckLevel::Warning,
                "resources.W001",
                format!("Resource '{}' enables no operations", resource.resource),
                Some("Add at least \"list\" to operations"),
            ));
        }
    }

    let has_media = project
        .config
        .models
        .iter()
        .flat_map(|m| &m.fields)
        .any(|f| matches!(f.kind.as_str(), "file" | "image"));
    if has_media && settings.media_root.is_none() {
        messages.push(CheckMessage::new(
            CheckLevel::Info,
            "media.I001",
            "File fields are declared but media_root is unset",
            Some("Uploaded paths are stored relative to media_url"),
        ));
    }

    messages
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Validate the site document"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, project: &Project) -> Result<(), AdminError> {
        let messages = run_checks(project);

        if messages.is_empty() {
            tracing::info!("System check identified no issues");
            return Ok(());
        }

        let errors = messages.iter().filter(|m| m.level >= CheckLevel::Error).count();
        let warnings = messages.iter().filter(|m| m.level == CheckLevel::Warning).count();

        for msg in &messages {
            let hint_text = msg
                .hint
                .as_ref()
                .map_or(String::new(), |h| format!("\n\tHINT: {h}"));
            tracing::warn!("{} ({}): {}{}", msg.level, msg.id, msg.msg, hint_text);
        }

        tracing::info!(
            "System check identified {} issue(s) ({} error(s), {} warning(s))",
            messages.len(),
            errors,
            warnings
        );

        if errors > 0 {
            return Err(AdminError::Configuration(format!(
                "System check found {errors} error(s)"
            )));
        }
        Ok(())
    }
}

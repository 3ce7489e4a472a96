//! Field label parsing.
//!
//! A field's descriptive text may follow the template
//! `label(description):placeholder`, where both the parenthesised
//! description and the `:placeholder` suffix are optional. Text that does
//! not fit the template (unbalanced parentheses, an empty label) is ignored
//! and the field name is used instead.

use once_cell::sync::Lazy;
use regex::Regex;

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<label>[^():]+?)\s*(?:\((?P<description>[^()]*)\))?\s*(?::\s*(?P<placeholder>.*?))?\s*$",
    )
    .expect("valid regex")
});

/// The display texts of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLabel {
    /// Shown next to the control and as the column header.
    pub label: String,
    /// Help text shown under the control.
    pub description: Option<String>,
    /// Placeholder inside an empty control.
    pub placeholder: Option<String>,
}

impl FieldLabel {
    /// Parses `text`; returns `None` when it does not fit the template.
    ///
    /// # Examples
    ///
    /// ```
    /// use amis_admin::label::FieldLabel;
    ///
    /// let parsed = FieldLabel::parse("Title(Shown on the front page):Enter a title").unwrap();
    /// assert_eq!(parsed.label, "Title");
    /// assert_eq!(parsed.description.as_deref(), Some("Shown on the front page"));
    /// assert_eq!(parsed.placeholder.as_deref(), Some("Enter a title"));
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let caps = LABEL_RE.captures(text)?;
        let non_empty = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Some(Self {
            label: non_empty("label")?,
            description: non_empty("description"),
            placeholder: non_empty("placeholder"),
        })
    }

    /// Resolves the texts for a field from its declared description.
    ///
    /// The label falls back to the field name and the placeholder to the
    /// label.
    pub fn resolve(field_name: &str, description: &str) -> Self {
        let mut resolved = Self::parse(description).unwrap_or_else(|| Self {
            label: field_name.to_string(),
            description: None,
            placeholder: None,
        });
        if resolved.placeholder.is_none() {
            resolved.placeholder = Some(resolved.label.clone());
        }
        resolved
    }
}

//! Per-resource admin configuration.
//!
//! [`ModelAdmin`] is what an integrator writes (in code or in a site TOML
//! file) to expose a model: which fields the list, the create form, the
//! update form and the inline quick-edit cells show, how rows are searched
//! and ordered, and which operations are enabled. It is plain data; the
//! [`ModelAdminEngine`](crate::engine::ModelAdminEngine) checks it against
//! the model when it is built.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An operation a resource can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Paginated listing and single-row reads.
    List,
    /// Creating rows.
    Create,
    /// Full and inline updates.
    Update,
    /// Deleting rows.
    Delete,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 4] = [Self::List, Self::Create, Self::Update, Self::Delete];

    /// Lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

fn all_operations() -> BTreeSet<Operation> {
    Operation::ALL.into_iter().collect()
}

/// Configuration for one admin resource.
///
/// Field lists left unset fall back to defaults computed from the model:
/// the list shows the primary key and every field, the create form every
/// field except a store-generated key, and the update form the create
/// fields minus the key.
///
/// # Examples
///
/// ```
/// use amis_admin::model_admin::{ModelAdmin, Operation};
///
/// let admin = ModelAdmin::new("article")
///     .title("Articles")
///     .list_display(vec!["pk", "title", "category"])
///     .inline_fields(vec!["title"])
///     .search_fields(vec!["title"])
///     .ordering(vec!["-pk"])
///     .operations(vec![Operation::List, Operation::Update]);
/// assert_eq!(admin.model, "article");
/// assert!(!admin.allows(Operation::Delete));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAdmin {
    /// The URL segment and registry key; defaults to the model name.
    #[serde(default)]
    pub resource: String,
    /// The model served; defaults to the resource name.
    #[serde(default)]
    pub model: String,
    /// Page title; defaults to the model's verbose name.
    #[serde(default)]
    pub title: Option<String>,
    /// Columns of the list table.
    #[serde(default)]
    pub list_display: Option<Vec<String>>,
    /// Fields of the create form.
    #[serde(default)]
    pub create_fields: Option<Vec<String>>,
    /// Fields of the update form.
    #[serde(default)]
    pub update_fields: Option<Vec<String>>,
    /// List columns editable in place.
    #[serde(default)]
    pub inline_fields: Vec<String>,
    /// Fields matched by the `keywords` filter.
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Default ordering, `-` prefix for descending.
    #[serde(default)]
    pub ordering: Vec<String>,
    /// Page size; defaults to the site setting.
    #[serde(default)]
    pub list_per_page: Option<usize>,
    /// Enabled operations.
    #[serde(default = "all_operations")]
    pub operations: BTreeSet<Operation>,
}

impl ModelAdmin {
    /// Creates a resource named after its model, with every operation enabled.
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            resource: model.clone(),
            model,
            title: None,
            list_display: None,
            create_fields: None,
            update_fields: None,
            inline_fields: Vec::new(),
            search_fields: Vec::new(),
            ordering: Vec::new(),
            list_per_page: None,
            operations: all_operations(),
        }
    }

    /// Serves the model under a different resource name.
    #[must_use]
    pub fn resource(mut self, name: impl Into<String>) -> Self {
        self.resource = name.into();
        self
    }

    /// Sets the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the list columns.
    #[must_use]
    pub fn list_display(mut self, fields: Vec<&str>) -> Self {
        self.list_display = Some(fields.into_iter().map(String::from).collect());
        self
    }

    /// Sets the create form fields.
    #[must_use]
    pub fn create_fields(mut self, fields: Vec<&str>) -> Self {
        self.create_fields = Some(fields.into_iter().map(String::from).collect());
        self
    }

    /// Sets the update form fields.
    #[must_use]
    pub fn update_fields(mut self, fields: Vec<&str>) -> Self {
        self.update_fields = Some(fields.into_iter().map(String::from).collect());
        self
    }

    /// Sets the inline-editable columns.
    #[must_use]
    pub fn inline_fields(mut self, fields: Vec<&str>) -> Self {
        self.inline_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the searched fields.
    #[must_use]
    pub fn search_fields(mut self, fields: Vec<&str>) -> Self {
        self.search_fields = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, fields: Vec<&str>) -> Self {
        self.ordering = fields.into_iter().map(String::from).collect();
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn list_per_page(mut self, n: usize) -> Self {
        self.list_per_page = Some(n);
        self
    }

    /// Replaces the enabled operations.
    #[must_use]
    pub fn operations(mut self, ops: Vec<Operation>) -> Self {
        self.operations = ops.into_iter().collect();
        self
    }

    /// Returns `true` if `op` is enabled.
    pub fn allows(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    /// Fills whichever of `resource` and `model` was left empty from the
    /// other. Fails when both are empty.
    pub fn with_names_resolved(mut self) -> Result<Self, String> {
        match (self.resource.is_empty(), self.model.is_empty()) {
            (true, true) => return Err("a resource needs a 'resource' or 'model' name".to_string()),
            (true, false) => self.resource.clone_from(&self.model),
            (false, true) => self.model.clone_from(&self.resource),
            (false, false) => {}
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let admin = ModelAdmin::new("article");
        assert_eq!(admin.resource, "article");
        assert!(admin.list_display.is_none());
        assert!(admin.inline_fields.is_empty());
        assert!(Operation::ALL.iter().all(|op| admin.allows(*op)));
    }

    #[test]
    fn test_builder() {
        let admin = ModelAdmin::new("article")
            .resource("posts")
            .create_fields(vec!["title"])
            .list_per_page(25)
            .operations(vec![Operation::List]);
        assert_eq!(admin.resource, "posts");
        assert_eq!(admin.model, "article");
        assert_eq!(admin.create_fields, Some(vec!["title".to_string()]));
        assert_eq!(admin.list_per_page, Some(25));
        assert!(admin.allows(Operation::List));
        assert!(!admin.allows(Operation::Create));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let admin: ModelAdmin = serde_json::from_value(serde_json::json!({
            "resource": "articles",
            "model": "article",
            "operations": ["list", "delete"]
        }))
        .unwrap();
        assert_eq!(admin.model, "article");
        assert!(admin.search_fields.is_empty());
        assert!(admin.allows(Operation::Delete));
        assert!(!admin.allows(Operation::Update));

        let full: ModelAdmin =
            serde_json::from_value(serde_json::json!({"resource": "a", "model": "a"})).unwrap();
        assert_eq!(full.operations.len(), 4);
    }

    #[test]
    fn test_names_resolved() {
        let by_model: ModelAdmin =
            serde_json::from_value(serde_json::json!({"model": "article"})).unwrap();
        let by_model = by_model.with_names_resolved().unwrap();
        assert_eq!(by_model.resource, "article");

        let by_resource: ModelAdmin =
            serde_json::from_value(serde_json::json!({"resource": "tag"})).unwrap();
        assert_eq!(by_resource.with_names_resolved().unwrap().model, "tag");

        let nameless: ModelAdmin = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(nameless.with_names_resolved().is_err());
    }
}

//! amis schema descriptors.
//!
//! Typed builders for the parts of the amis JSON vocabulary the admin emits
//! per field: form items, table columns and select options. Page-level
//! containers are assembled in [`schema`](crate::schema). Keys the admin
//! does not model explicitly go into each descriptor's flattened `extra` map.

use serde::Serialize;
use serde_json::{Map, Value as Json};

/// An amis form item, e.g. `{"type": "input-text", "name": "title", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormItem {
    /// The amis control type.
    #[serde(rename = "type")]
    pub kind: String,
    /// The submitted field name.
    pub name: String,
    /// The visible label.
    pub label: String,
    /// Help text under the control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder inside the empty control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Whether the form refuses to submit without a value.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Initial value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Json>,
    /// Control-specific properties.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl FormItem {
    /// Creates a form item of the given amis type.
    pub fn new(kind: impl Into<String>, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            label: label.into(),
            description: None,
            placeholder: None,
            required: false,
            value: None,
            extra: Map::new(),
        }
    }

    /// Sets a control-specific property.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Serializes to a JSON object.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

/// An amis table column, optionally quick-editable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// The row key shown in this column.
    pub name: String,
    /// Column header.
    pub label: String,
    /// The amis cell type; plain text when absent.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Whether the column header offers sorting.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,
    /// The editor opened when the cell is quick-edited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_edit: Option<Json>,
    /// Cell-specific properties.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl TableColumn {
    /// Creates a plain text column.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: None,
            sortable: false,
            quick_edit: None,
            extra: Map::new(),
        }
    }

    /// Sets the cell type.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Enables sorting on this column.
    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Sets a cell-specific property.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Serializes to a JSON object.
    pub fn to_json(&self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

/// One `{label, value}` entry of a select or picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    /// Text shown to the user.
    pub label: String,
    /// Submitted value.
    pub value: Json,
}

impl SelectOption {
    /// Creates an option.
    pub fn new(label: impl Into<String>, value: impl Into<Json>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

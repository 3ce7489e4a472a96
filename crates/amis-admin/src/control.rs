//! Per-field controls.
//!
//! A [`FieldControl`] bundles everything the admin knows about one field of
//! one resource: its [`ControlKind`], its [`ValueCodec`], its display texts,
//! and, for relations, its [`RelationResolver`]. It builds three amis
//! descriptors on demand (the edit-form item, the read-only list column, and
//! the inline quick-edit column) and memoizes each in a `OnceCell`, so every
//! descriptor is built at most once and never changes afterwards.

use once_cell::sync::OnceCell;
use serde_json::{json, Value as Json};

use amis_admin_core::{AdminError, AdminResult, FieldError};
use amis_admin_db::{FieldDef, Record, Store, Value};

use crate::amis::{FormItem, SelectOption, TableColumn};
use crate::codec::{decimal_hints, ValueCodec, NONE_SENTINEL};
use crate::label::FieldLabel;
use crate::relation::RelationResolver;

/// The presentation kind of a field; one per amis control family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    /// Single-line text input.
    Text,
    /// Multi-line text area.
    TextArea,
    /// Whole-number input.
    Integer,
    /// Floating-point input.
    Float,
    /// Fixed-point input with precision hints.
    Decimal,
    /// On/off switch for booleans with a default.
    Switch,
    /// Yes/No/Unknown select for booleans without a default.
    TriStateSelect,
    /// Date picker.
    Date,
    /// Date-time picker.
    DateTime,
    /// Time picker.
    Time,
    /// Select over enum members.
    EnumSelect,
    /// JSON editor.
    JsonEditor,
    /// File upload.
    File,
    /// Image upload.
    Image,
    /// Rich-text editor.
    RichText,
    /// Searchable select over a foreign key's target rows.
    ForeignKeySelect,
    /// Paginated picker over a many-to-many target.
    ManyToManyPicker,
}

impl ControlKind {
    /// Returns a stable tag naming this kind.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Switch => "switch",
            Self::TriStateSelect => "tristate",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::EnumSelect => "enum",
            Self::JsonEditor => "json",
            Self::File => "file",
            Self::Image => "image",
            Self::RichText => "richtext",
            Self::ForeignKeySelect => "foreign_key",
            Self::ManyToManyPicker => "many_to_many",
        }
    }

    /// Returns `true` for relation kinds.
    pub const fn is_relation(self) -> bool {
        matches!(self, Self::ForeignKeySelect | Self::ManyToManyPicker)
    }
}

/// One field of one resource, with memoized amis descriptors.
#[derive(Debug)]
pub struct FieldControl {
    name: String,
    column: String,
    field: FieldDef,
    kind: ControlKind,
    codec: ValueCodec,
    texts: FieldLabel,
    prefix: String,
    relation: Option<RelationResolver>,
    edit: OnceCell<FormItem>,
    read: OnceCell<TableColumn>,
    inline: OnceCell<TableColumn>,
}

impl FieldControl {
    /// Assembles a control.
    ///
    /// `name` is the key used on the wire and `field.name` the storage key;
    /// they differ only for the primary-key pseudo-field. `prefix` is the
    /// resource's API base, used to build option lookup URLs.
    pub fn new(
        name: impl Into<String>,
        field: FieldDef,
        kind: ControlKind,
        codec: ValueCodec,
        prefix: impl Into<String>,
        relation: Option<RelationResolver>,
    ) -> Self {
        let name = name.into();
        let texts = FieldLabel::resolve(&name, &field.description);
        Self {
            column: field.name.clone(),
            name,
            field,
            kind,
            codec,
            texts,
            prefix: prefix.into(),
            relation,
            edit: OnceCell::new(),
            read: OnceCell::new(),
            inline: OnceCell::new(),
        }
    }

    /// The wire name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The storage key.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The underlying field definition.
    pub const fn field(&self) -> &FieldDef {
        &self.field
    }

    /// The presentation kind.
    pub const fn kind(&self) -> ControlKind {
        self.kind
    }

    /// The value codec.
    pub const fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// The display texts.
    pub const fn texts(&self) -> &FieldLabel {
        &self.texts
    }

    /// The relation resolver, for foreign keys and many-to-many fields.
    pub const fn relation(&self) -> Option<&RelationResolver> {
        self.relation.as_ref()
    }

    /// Whether the edit form must submit a value.
    pub fn is_required(&self) -> bool {
        self.field.is_required()
    }

    /// URL of this field's options endpoint.
    pub fn options_url(&self) -> String {
        format!("{}/options/{}", self.prefix, self.name)
    }

    // ── Descriptors ────────────────────────────────────────────────

    /// The edit-form item, built once.
    pub fn edit_control(&self) -> &FormItem {
        self.edit.get_or_init(|| self.build_edit_control())
    }

    /// The read-only list column, built once.
    pub fn read_column(&self) -> &TableColumn {
        self.read.get_or_init(|| self.build_read_column())
    }

    /// The quick-edit list column, built once.
    ///
    /// Relations cannot be edited inline and always yield
    /// [`AdminError::Structural`].
    pub fn inline_column(&self) -> AdminResult<&TableColumn> {
        if self.kind.is_relation() {
            return Err(AdminError::Structural(format!(
                "Field '{}' is a relation and cannot be edited inline",
                self.name
            )));
        }
        Ok(self.inline.get_or_init(|| self.build_inline_column()))
    }

    fn build_edit_control(&self) -> FormItem {
        let mut item = FormItem::new(self.amis_form_type(), &self.name, &self.texts.label);
        item.description.clone_from(&self.texts.description);
        item.placeholder.clone_from(&self.texts.placeholder);
        item.required = self.is_required();
        item.value = self
            .field
            .default
            .as_ref()
            .and_then(|d| d.literal())
            .map(|v| self.codec.to_wire(v));

        match (&self.codec, self.kind) {
            (ValueCodec::Text { max_length: Some(max) }, _) => item.with("maxLength", *max),
            (ValueCodec::Integer, _) => item.with("precision", 0),
            (
                ValueCodec::Decimal {
                    max_digits,
                    decimal_places,
                },
                _,
            ) => {
                let (precision, max) = decimal_hints(*max_digits, *decimal_places);
                item.with("precision", precision)
                    .with("max", max)
                    .with("min", -max)
            }
            (ValueCodec::TriState, _) => item
                .with(
                    "options",
                    json!([
                        SelectOption::new("Yes", "True"),
                        SelectOption::new("No", "False"),
                        SelectOption::new("Unknown", NONE_SENTINEL),
                    ]),
                )
                .with("clearable", false),
            (ValueCodec::Enum { members, sentinel }, _) => {
                let mut options: Vec<SelectOption> = members
                    .iter()
                    .map(|m| SelectOption::new(&m.label, m.name.clone()))
                    .collect();
                if *sentinel && self.field.null {
                    options.push(SelectOption::new("-", NONE_SENTINEL));
                }
                item.with("options", json!(options))
                    .with("clearable", self.field.null)
            }
            (ValueCodec::Date, _) => item
                .with("format", "YYYY-MM-DD")
                .with("valueFormat", "YYYY-MM-DD"),
            (ValueCodec::DateTime, _) => item
                .with("format", "YYYY-MM-DD HH:mm:ss")
                .with("valueFormat", "YYYY-MM-DD HH:mm:ss"),
            (ValueCodec::Time, _) => item
                .with("format", "HH:mm:ss")
                .with("valueFormat", "HH:mm:ss"),
            (_, ControlKind::ForeignKeySelect) => item
                .with("source", format!("get:{}?term=${{term}}", self.options_url()))
                .with("searchable", true)
                .with("clearable", self.field.null)
                .with("labelField", "label")
                .with("valueField", "value")
                .with("extractValue", true),
            (_, ControlKind::ManyToManyPicker) => item
                .with(
                    "source",
                    format!(
                        "get:{}?page=${{page}}&perPage=${{perPage}}&term=${{term}}",
                        self.options_url()
                    ),
                )
                .with("multiple", true)
                .with("labelField", "label")
                .with("valueField", "value")
                .with("extractValue", true)
                .with("joinValues", false)
                .with(
                    "pickerSchema",
                    json!({
                        "mode": "table",
                        "name": format!("{}_picker", self.name),
                        "quickSaveApi": Json::Null,
                        "columns": [{"name": "label", "label": self.texts.label}],
                    }),
                ),
            _ => item,
        }
    }

    fn build_read_column(&self) -> TableColumn {
        let col = TableColumn::new(&self.name, &self.texts.label);
        let col = if self.kind.is_relation() { col } else { col.sortable() };
        match (&self.codec, self.kind) {
            (ValueCodec::Boolean, _) => col.kind("status"),
            (ValueCodec::TriState, _) => col.kind("mapping").with(
                "map",
                json!({"True": "Yes", "False": "No", NONE_SENTINEL: "-", "*": "-"}),
            ),
            (ValueCodec::Enum { members, .. }, _) => {
                let mut map = serde_json::Map::new();
                for m in members {
                    map.insert(m.name.clone(), Json::String(m.label.clone()));
                }
                map.insert("*".to_string(), Json::String("-".to_string()));
                col.kind("mapping").with("map", Json::Object(map))
            }
            (ValueCodec::Date, _) => col.kind("date").with("format", "YYYY-MM-DD").with("valueFormat", "YYYY-MM-DD"),
            (ValueCodec::DateTime, _) => col
                .kind("datetime")
                .with("format", "YYYY-MM-DD HH:mm:ss")
                .with("valueFormat", "YYYY-MM-DD HH:mm:ss"),
            (ValueCodec::Json, _) => col.kind("json"),
            (_, ControlKind::Image) => col.kind("image").with("enlargeAble", true),
            (_, ControlKind::File) => col
                .kind("link")
                .with("href", format!("${{{}}}", self.name))
                .with("blank", true),
            (_, ControlKind::RichText) => col.kind("html"),
            (_, ControlKind::ForeignKeySelect) => {
                col.kind("tpl").with("tpl", format!("${{{}.label}}", self.name))
            }
            (_, ControlKind::ManyToManyPicker) => col.kind("each").with(
                "items",
                json!({"type": "tpl", "tpl": "<span class='label label-default m-l-sm'>${label}</span>"}),
            ),
            _ => col,
        }
    }

    fn build_inline_column(&self) -> TableColumn {
        let mut col = self.read_column().clone();
        let mut editor = self.edit_control().to_json();
        if let Json::Object(map) = &mut editor {
            map.remove("label");
            map.remove("description");
            map.insert("mode".to_string(), json!("inline"));
            map.insert("saveImmediately".to_string(), json!(true));
        }
        col.quick_edit = Some(editor);
        col
    }

    fn amis_form_type(&self) -> &'static str {
        match self.kind {
            ControlKind::Text => "input-text",
            ControlKind::TextArea => "textarea",
            ControlKind::Integer | ControlKind::Float | ControlKind::Decimal => "input-number",
            ControlKind::Switch => "switch",
            ControlKind::TriStateSelect | ControlKind::EnumSelect | ControlKind::ForeignKeySelect => {
                "select"
            }
            ControlKind::Date => "input-date",
            ControlKind::DateTime => "input-datetime",
            ControlKind::Time => "input-time",
            ControlKind::JsonEditor => "json-editor",
            ControlKind::File => "input-file",
            ControlKind::Image => "input-image",
            ControlKind::RichText => "input-rich-text",
            ControlKind::ManyToManyPicker => "picker",
        }
    }

    // ── Values ─────────────────────────────────────────────────────

    /// Renders this field of a stored row for the wire. Never writes.
    pub fn to_wire(&self, row: &Record) -> Json {
        self.relation.as_ref().map_or_else(
            || self.codec.to_wire(row.value(&self.column)),
            |relation| relation.to_wire(row),
        )
    }

    /// Converts a submitted value into its storage form.
    ///
    /// `wire` is `None` when the payload omits the field. Blank input takes
    /// the field default on creation, then NULL if the field is nullable,
    /// and is otherwise a "required" error. Relation keys are checked
    /// against the store; a many-to-many field yields [`Value::List`].
    pub async fn to_storage(
        &self,
        store: &dyn Store,
        wire: Option<&Json>,
        creating: bool,
    ) -> AdminResult<Result<Value, FieldError>> {
        let value = match wire.filter(|w| !self.codec.is_blank(w)) {
            None => return Ok(self.blank_value(creating)),
            Some(w) => match self.codec.to_storage(w) {
                Ok(Value::Null) => return Ok(self.blank_value(false)),
                Ok(v) => v,
                Err(e) => return Ok(Err(e)),
            },
        };
        if let Some(relation) = &self.relation {
            if let Err(e) = relation.verify(store, &value).await? {
                return Ok(Err(e));
            }
        }
        Ok(Ok(value))
    }

    fn blank_value(&self, creating: bool) -> Result<Value, FieldError> {
        if creating {
            if let Some(default) = &self.field.default {
                return Ok(default.produce());
            }
        }
        if self.field.is_many_to_many() {
            Ok(Value::List(Vec::new()))
        } else if self.field.null {
            Ok(Value::Null)
        } else {
            Err(FieldError::required())
        }
    }
}

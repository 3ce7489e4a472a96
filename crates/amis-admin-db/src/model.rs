//! Model metadata and records.
//!
//! [`ModelMeta`] describes one persistent model: its name, primary key,
//! label field, and ordered field definitions. [`ModelCatalog`] holds every
//! model known to a site so relation targets can be resolved by name.
//! [`Record`] is one row as exchanged with a [`Store`](crate::store::Store).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use amis_admin_core::{AdminError, AdminResult};

use crate::fields::{FieldDef, FieldType};
use crate::value::Value;

/// Name of the primary key when a model declares none.
pub const DEFAULT_PK: &str = "id";

/// Metadata for one model.
///
/// # Examples
///
/// ```
/// use amis_admin_db::fields::{FieldDef, FieldType};
/// use amis_admin_db::model::ModelMeta;
///
/// let meta = ModelMeta::new("category")
///     .field(FieldDef::new("name", FieldType::ShortText).max_length(50))
///     .label_field("name");
/// assert_eq!(meta.pk, "id");
/// assert!(meta.get_field("name").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ModelMeta {
    /// Unique model name, e.g. "article".
    pub name: String,
    /// Human-readable name.
    pub verbose_name: String,
    /// Name of the primary key field.
    pub pk: String,
    /// Field whose value labels a row in selects and relation cells.
    pub label_field: Option<String>,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates a model with an implicit integer primary key named `id`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            verbose_name: name.replace('_', " "),
            name,
            pk: DEFAULT_PK.to_string(),
            label_field: None,
            fields: Vec::new(),
        }
    }

    /// Adds a field. A field marked as primary key replaces the implicit one.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        if field.primary_key {
            self.pk.clone_from(&field.name);
        }
        self.fields.push(field);
        self
    }

    /// Sets the field used to label rows.
    #[must_use]
    pub fn label_field(mut self, name: impl Into<String>) -> Self {
        self.label_field = Some(name.into());
        self
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Looks up a field definition by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the declared primary key field, if any.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.get_field(&self.pk)
    }

    /// Returns `true` when the store generates primary keys for new rows.
    pub fn auto_pk(&self) -> bool {
        self.pk_field()
            .map_or(true, |f| matches!(f.field_type, FieldType::Integer))
    }

    /// Returns the field used to label rows: the declared label field, else
    /// the first short-text field, else the primary key.
    pub fn label_field_name(&self) -> &str {
        self.label_field
            .as_deref()
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|f| matches!(f.field_type, FieldType::ShortText) && !f.primary_key)
                    .map(|f| f.name.as_str())
            })
            .unwrap_or(&self.pk)
    }

    /// Iterates over the many-to-many fields.
    pub fn many_to_many_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_many_to_many())
    }

    /// Checks internal consistency: unique field names and a known label field.
    pub fn check(&self) -> AdminResult<()> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AdminError::Configuration(format!(
                    "Model '{}' declares field '{}' twice",
                    self.name, field.name
                )));
            }
        }
        if let Some(label) = &self.label_field {
            if label != &self.pk && self.get_field(label).is_none() {
                return Err(AdminError::Configuration(format!(
                    "Model '{}' has unknown label field '{label}'",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Every model known to a site, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, Arc<ModelMeta>>,
}

impl ModelCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model. Names must be unique.
    pub fn register(&mut self, meta: ModelMeta) -> AdminResult<Arc<ModelMeta>> {
        meta.check()?;
        if self.models.contains_key(&meta.name) {
            return Err(AdminError::Configuration(format!(
                "Model '{}' is already registered",
                meta.name
            )));
        }
        let meta = Arc::new(meta);
        self.models.insert(meta.name.clone(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Looks up a model by name.
    pub fn get(&self, name: &str) -> Option<Arc<ModelMeta>> {
        self.models.get(name).cloned()
    }

    /// Looks up a model by name, failing with a configuration error.
    pub fn require(&self, name: &str) -> AdminResult<Arc<ModelMeta>> {
        self.get(name)
            .ok_or_else(|| AdminError::Configuration(format!("Unknown model '{name}'")))
    }

    /// Returns the model names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Checks that every relation points at a registered model.
    pub fn check_relations(&self) -> AdminResult<()> {
        for meta in self.models.values() {
            for field in &meta.fields {
                if let Some(target) = field.related_model() {
                    if !self.models.contains_key(target) {
                        return Err(AdminError::Configuration(format!(
                            "Field '{}.{}' points at unknown model '{target}'",
                            meta.name, field.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Related rows loaded alongside a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// The target of a foreign key, if it exists.
    One(Option<Box<Record>>),
    /// The members of a many-to-many link set.
    Many(Vec<Record>),
}

static NULL: Value = Value::Null;

/// One stored row.
///
/// Field values are kept by name. Relations requested through
/// `select_related`/`prefetch_related` are attached under the relation's
/// field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
    related: BTreeMap<String, Related>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(field, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            related: BTreeMap::new(),
        }
    }

    /// Returns the value of `field`, if set.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns the value of `field`, or NULL when unset.
    pub fn value(&self, field: &str) -> &Value {
        self.values.get(field).unwrap_or(&NULL)
    }

    /// Sets the value of `field`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Returns `true` if `field` is set.
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterates over the stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Returns the primary key according to `meta`.
    pub fn pk(&self, meta: &ModelMeta) -> &Value {
        self.value(&meta.pk)
    }

    /// Returns the label used for this row in selects and relation cells.
    pub fn label(&self, meta: &ModelMeta) -> String {
        match self.value(meta.label_field_name()) {
            Value::Null => self.pk(meta).to_string(),
            v => v.to_string(),
        }
    }

    /// Returns rows loaded for a relation field.
    pub fn related(&self, field: &str) -> Option<&Related> {
        self.related.get(field)
    }

    /// Attaches rows loaded for a relation field.
    pub fn set_related(&mut self, field: impl Into<String>, related: Related) {
        self.related.insert(field.into(), related);
    }

    /// Copies `other`'s values over this record's, leaving unset ones alone.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }
}

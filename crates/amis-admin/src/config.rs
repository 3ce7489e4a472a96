//! Site configuration files.
//!
//! A site TOML document declares the models, the resources exposing them,
//! and optionally a `[settings]` table:
//!
//! ```toml
//! [settings]
//! site_title = "Blog"
//!
//! [[models]]
//! name = "category"
//! label_field = "name"
//!
//! [[models.fields]]
//! name = "name"
//! type = "short_text"
//! max_length = 50
//!
//! [[models]]
//! name = "article"
//!
//! [[models.fields]]
//! name = "category"
//! type = "foreign_key"
//! to = "category"
//! null = true
//!
//! [[resources]]
//! resource = "articles"
//! model = "article"
//! search_fields = ["title"]
//! ```
//!
//! Every problem (an unknown type tag, a relation to a missing model, a
//! resource naming a missing field) surfaces as
//! [`AdminError::Configuration`] from [`SiteConfig::build`], before any
//! request is served.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use amis_admin_core::settings_loader::{self, toml_to_json};
use amis_admin_core::{AdminError, AdminResult, Settings};
use amis_admin_db::{EnumMember, FieldDef, FieldType, ModelCatalog, ModelMeta, Store, Value};

use crate::codec::ValueCodec;
use crate::engine::ModelAdminEngine;
use crate::model_admin::ModelAdmin;
use crate::site::AdminSite;

/// A parsed site document.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Overrides of the default settings.
    #[serde(default)]
    pub settings: Option<toml::Value>,
    /// Model declarations.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Resource declarations; one default resource per model when empty.
    #[serde(default)]
    pub resources: Vec<ModelAdmin>,
}

/// One `[[models]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    pub name: String,
    /// Human-readable name.
    #[serde(default)]
    pub verbose_name: Option<String>,
    /// Field labelling rows in selects.
    #[serde(default)]
    pub label_field: Option<String>,
    /// Field declarations.
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One `[[models.fields]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConfig {
    /// Field name.
    pub name: String,
    /// Type tag, e.g. `"short_text"` or `"many_to_many"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Marks the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Allows NULL.
    #[serde(default)]
    pub null: bool,
    /// Maximum text length.
    #[serde(default)]
    pub max_length: Option<usize>,
    /// `label(description):placeholder` text.
    #[serde(default)]
    pub description: Option<String>,
    /// Literal default.
    #[serde(default)]
    pub default: Option<toml::Value>,
    /// Named server-side default: `now`, `today` or `current_time`.
    #[serde(default)]
    pub default_factory: Option<String>,
    /// Enum members.
    #[serde(default)]
    pub choices: Vec<ChoiceConfig>,
    /// Relation target.
    #[serde(default)]
    pub to: Option<String>,
    /// Decimal total digits.
    #[serde(default)]
    pub max_digits: Option<u32>,
    /// Decimal fractional digits.
    #[serde(default)]
    pub decimal_places: Option<u32>,
}

/// One enum member.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceConfig {
    /// Member name, used on the wire.
    pub name: String,
    /// Stored value.
    pub value: toml::Value,
    /// Display label; defaults to the name.
    #[serde(default)]
    pub label: Option<String>,
}

impl SiteConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> AdminResult<Self> {
        let mut config: Self = toml::from_str(text)
            .map_err(|e| AdminError::Configuration(format!("Failed to parse site config: {e}")))?;
        config.resources = config
            .resources
            .into_iter()
            .map(ModelAdmin::with_names_resolved)
            .collect::<Result<_, _>>()
            .map_err(AdminError::Configuration)?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AdminResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdminError::Configuration(format!(
                "Failed to read site config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolves settings: defaults, then `[settings]`, then environment.
    pub fn settings(&self) -> AdminResult<Settings> {
        let mut settings = match &self.settings {
            Some(table) => settings_loader::from_toml_value(table.clone())?,
            None => Settings::default(),
        };
        settings_loader::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    /// Builds the model catalog and checks its relations.
    pub fn catalog(&self) -> AdminResult<ModelCatalog> {
        let mut catalog = ModelCatalog::new();
        for model in &self.models {
            catalog.register(model.to_meta()?)?;
        }
        catalog.check_relations()?;
        Ok(catalog)
    }

    /// Builds a site over `store` with every declared resource.
    pub fn build(&self, store: Arc<dyn Store>) -> AdminResult<AdminSite> {
        let settings = Arc::new(self.settings()?);
        self.build_with(store, settings)
    }

    /// Builds a site with explicit settings.
    pub fn build_with(&self, store: Arc<dyn Store>, settings: Arc<Settings>) -> AdminResult<AdminSite> {
        let catalog = Arc::new(self.catalog()?);
        let resources = if self.resources.is_empty() {
            catalog.names().into_iter().map(ModelAdmin::new).collect()
        } else {
            self.resources.clone()
        };
        let mut site = AdminSite::new(Arc::clone(&settings));
        for admin in resources {
            site.register(ModelAdminEngine::new(
                admin,
                Arc::clone(&catalog),
                Arc::clone(&store),
                Arc::clone(&settings),
            )?)?;
        }
        Ok(site)
    }
}

impl ModelConfig {
    /// Converts to model metadata.
    pub fn to_meta(&self) -> AdminResult<ModelMeta> {
        let mut meta = ModelMeta::new(&self.name);
        if let Some(name) = &self.verbose_name {
            meta = meta.verbose_name(name);
        }
        if let Some(label) = &self.label_field {
            meta = meta.label_field(label);
        }
        for field in &self.fields {
            meta = meta.field(
                field
                    .to_def()
                    .map_err(|e| in_model(&self.name, &field.name, e))?,
            );
        }
        Ok(meta)
    }
}

impl FieldConfig {
    /// Converts to a field definition.
    pub fn to_def(&self) -> AdminResult<FieldDef> {
        let field_type = self.field_type()?;
        let mut def = FieldDef::new(&self.name, field_type);
        if self.primary_key {
            def = def.primary_key();
        }
        if self.null {
            def = def.nullable();
        }
        if let Some(max) = self.max_length {
            def = def.max_length(max);
        }
        if let Some(text) = &self.description {
            def = def.description(text);
        }
        match (&self.default, &self.default_factory) {
            (Some(_), Some(_)) => {
                return Err(AdminError::Configuration(
                    "set either 'default' or 'default_factory', not both".to_string(),
                ))
            }
            (Some(literal), None) => {
                let value = literal_default(&def.field_type, literal)?;
                def = def.default(value);
            }
            (None, Some(name)) => {
                def = def.default_factory(name, factory(name)?);
            }
            (None, None) => {}
        }
        Ok(def)
    }

    fn field_type(&self) -> AdminResult<FieldType> {
        let target = || {
            self.to.clone().ok_or_else(|| {
                AdminError::Configuration(format!("type '{}' needs a 'to' model", self.kind))
            })
        };
        Ok(match self.kind.as_str() {
            "short_text" => FieldType::ShortText,
            "long_text" => FieldType::LongText,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "decimal" => match (self.max_digits, self.decimal_places) {
                (Some(max_digits), Some(decimal_places)) if decimal_places <= max_digits => {
                    FieldType::Decimal {
                        max_digits,
                        decimal_places,
                    }
                }
                _ => {
                    return Err(AdminError::Configuration(
                        "decimal needs 'max_digits' >= 'decimal_places'".to_string(),
                    ))
                }
            },
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "time" => FieldType::Time,
            "enum" => {
                if self.choices.is_empty() {
                    return Err(AdminError::Configuration(
                        "enum needs at least one choice".to_string(),
                    ));
                }
                FieldType::Enum {
                    members: self.choices.iter().map(ChoiceConfig::to_member).collect(),
                }
            }
            "json" => FieldType::Json,
            "file" => FieldType::File,
            "image" => FieldType::Image,
            "rich_text" => FieldType::RichText,
            "foreign_key" => FieldType::ForeignKey { to: target()? },
            "many_to_many" => FieldType::ManyToMany { to: target()? },
            other => {
                return Err(AdminError::Configuration(format!(
                    "unsupported field type '{other}'"
                )))
            }
        })
    }
}

impl ChoiceConfig {
    fn to_member(&self) -> EnumMember {
        let member = EnumMember::new(&self.name, Value::from(toml_to_json(self.value.clone())));
        match &self.label {
            Some(label) => member.label(label),
            None => member,
        }
    }
}

/// Converts a literal default, parsing temporal and enum values the way
/// the wire does.
fn literal_default(field_type: &FieldType, literal: &toml::Value) -> AdminResult<Value> {
    let json = toml_to_json(literal.clone());
    let codec = match field_type {
        FieldType::Date => ValueCodec::Date,
        FieldType::DateTime => ValueCodec::DateTime,
        FieldType::Time => ValueCodec::Time,
        FieldType::Enum { members } => ValueCodec::Enum {
            members: members.clone(),
            sentinel: false,
        },
        _ => return Ok(Value::from(json)),
    };
    codec
        .to_storage(&json)
        .map_err(|e| AdminError::Configuration(format!("invalid default: {e}")))
}

fn factory(name: &str) -> AdminResult<fn() -> Value> {
    match name {
        "now" => Ok(now),
        "today" => Ok(today),
        "current_time" => Ok(current_time),
        other => Err(AdminError::Configuration(format!(
            "unknown default factory '{other}'"
        ))),
    }
}

fn now() -> Value {
    Value::DateTime(chrono::Local::now().naive_local())
}

fn today() -> Value {
    Value::Date(chrono::Local::now().date_naive())
}

fn current_time() -> Value {
    Value::Time(chrono::Local::now().time())
}

fn in_model(model: &str, field: &str, err: AdminError) -> AdminError {
    match err {
        AdminError::Configuration(msg) => {
            AdminError::Configuration(format!("Model '{model}', field '{field}': {msg}"))
        }
        other => other,
    }
}

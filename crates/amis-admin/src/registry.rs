//! Field registry: one cached [`FieldControl`] per field of a resource.
//!
//! The registry maps each logical field type to its control kind, codec and
//! relation resolver with a single exhaustive `match`, so a new
//! [`FieldType`] variant is a compile error here rather than a runtime
//! surprise. Names are checked up front with [`FieldRegistry::validate`];
//! controls are then built on first use and shared for the registry's
//! lifetime.
//!
//! The primary key is always available under the reserved name
//! [`PK_FIELD`], whatever the model calls its key column.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use amis_admin_core::{AdminError, AdminResult, Settings};
use amis_admin_db::{FieldDef, FieldType, ModelCatalog, ModelMeta};

use crate::codec::ValueCodec;
use crate::control::{ControlKind, FieldControl};
use crate::relation::{Cardinality, RelationResolver};

/// Reserved name of the primary-key pseudo-field.
pub const PK_FIELD: &str = "pk";

/// Builds and caches the controls of one resource.
#[derive(Debug)]
pub struct FieldRegistry {
    meta: Arc<ModelMeta>,
    catalog: Arc<ModelCatalog>,
    media_url: String,
    base_url: String,
    controls: RwLock<HashMap<String, Arc<FieldControl>>>,
}

impl FieldRegistry {
    /// Creates a registry for `meta`.
    ///
    /// `base_url` is the resource's API base (e.g. `/admin/article`). Fails
    /// if the model declares a field under the reserved name `pk` that is
    /// not its primary key.
    pub fn new(
        meta: Arc<ModelMeta>,
        catalog: Arc<ModelCatalog>,
        settings: &Settings,
        base_url: impl Into<String>,
    ) -> AdminResult<Self> {
        if meta.get_field(PK_FIELD).is_some() && meta.pk != PK_FIELD {
            return Err(AdminError::Configuration(format!(
                "Model '{}' declares a field named '{PK_FIELD}', which is reserved for the primary key",
                meta.name
            )));
        }
        Ok(Self {
            meta,
            catalog,
            media_url: settings.media_url.clone(),
            base_url: base_url.into(),
            controls: RwLock::new(HashMap::new()),
        })
    }

    /// The model this registry serves.
    pub const fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// Returns `true` if `name` refers to the primary key, either through
    /// the pseudo-field or the key column's own name.
    pub fn is_pk(&self, name: &str) -> bool {
        name == PK_FIELD || name == self.meta.pk
    }

    /// Checks that `name` resolves to a field whose relation target, if
    /// any, is a registered model.
    pub fn validate(&self, name: &str) -> AdminResult<()> {
        if name == PK_FIELD {
            return Ok(());
        }
        let field = self.meta.get_field(name).ok_or_else(|| {
            AdminError::Configuration(format!(
                "Model '{}' has no field named '{name}'",
                self.meta.name
            ))
        })?;
        if let Some(target) = field.related_model() {
            self.catalog.require(target)?;
        }
        Ok(())
    }

    /// Returns the control for `name`, building it on first use.
    #[allow(clippy::significant_drop_tightening)]
    pub fn control(&self, name: &str) -> AdminResult<Arc<FieldControl>> {
        {
            let controls = self.controls.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(control) = controls.get(name) {
                return Ok(Arc::clone(control));
            }
        }
        let mut controls = self.controls.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(control) = controls.get(name) {
            return Ok(Arc::clone(control));
        }
        let control = Arc::new(self.build(name)?);
        controls.insert(name.to_string(), Arc::clone(&control));
        Ok(control)
    }

    /// Number of controls built so far.
    pub fn cached(&self) -> usize {
        self.controls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn build(&self, name: &str) -> AdminResult<FieldControl> {
        self.validate(name)?;
        let field = if name == PK_FIELD {
            self.meta.pk_field().cloned().unwrap_or_else(|| {
                FieldDef::new(&self.meta.pk, FieldType::Integer)
                    .primary_key()
                    .description("ID")
            })
        } else {
            self.meta
                .get_field(name)
                .cloned()
                .ok_or_else(|| AdminError::Configuration(format!("Unknown field '{name}'")))?
        };

        let (kind, codec, relation) = self.dispatch(&field)?;
        tracing::trace!(model = %self.meta.name, field = name, kind = kind.tag(), "built field control");
        Ok(FieldControl::new(
            name,
            field,
            kind,
            codec,
            self.base_url.clone(),
            relation,
        ))
    }

    fn dispatch(
        &self,
        field: &FieldDef,
    ) -> AdminResult<(ControlKind, ValueCodec, Option<RelationResolver>)> {
        let text = ValueCodec::Text {
            max_length: field.max_length,
        };
        let media = || ValueCodec::Media {
            media_url: self.media_url.clone(),
        };
        Ok(match &field.field_type {
            FieldType::ShortText => (ControlKind::Text, text, None),
            FieldType::LongText => (ControlKind::TextArea, text, None),
            FieldType::RichText => (ControlKind::RichText, text, None),
            FieldType::Integer => (ControlKind::Integer, ValueCodec::Integer, None),
            FieldType::Float => (ControlKind::Float, ValueCodec::Float, None),
            FieldType::Decimal {
                max_digits,
                decimal_places,
            } => (
                ControlKind::Decimal,
                ValueCodec::Decimal {
                    max_digits: *max_digits,
                    decimal_places: *decimal_places,
                },
                None,
            ),
            FieldType::Boolean if field.default.is_some() => {
                (ControlKind::Switch, ValueCodec::Boolean, None)
            }
            FieldType::Boolean => (ControlKind::TriStateSelect, ValueCodec::TriState, None),
            FieldType::Date => (ControlKind::Date, ValueCodec::Date, None),
            FieldType::DateTime => (ControlKind::DateTime, ValueCodec::DateTime, None),
            FieldType::Time => (ControlKind::Time, ValueCodec::Time, None),
            FieldType::Enum { members } => (
                ControlKind::EnumSelect,
                ValueCodec::Enum {
                    members: members.clone(),
                    sentinel: field.default.is_none(),
                },
                None,
            ),
            FieldType::Json => (ControlKind::JsonEditor, ValueCodec::Json, None),
            FieldType::File => (ControlKind::File, media(), None),
            FieldType::Image => (ControlKind::Image, media(), None),
            FieldType::ForeignKey { to } => (
                ControlKind::ForeignKeySelect,
                ValueCodec::ForeignKey,
                Some(self.resolver(field, to, Cardinality::ManyToOne)?),
            ),
            FieldType::ManyToMany { to } => (
                ControlKind::ManyToManyPicker,
                ValueCodec::ManyToMany,
                Some(self.resolver(field, to, Cardinality::ManyToMany)?),
            ),
        })
    }

    fn resolver(
        &self,
        field: &FieldDef,
        target: &str,
        cardinality: Cardinality,
    ) -> AdminResult<RelationResolver> {
        Ok(RelationResolver::new(
            Arc::clone(&self.meta),
            &field.name,
            self.catalog.require(target)?,
            cardinality,
        ))
    }
}

//! Field definitions for admin models.
//!
//! [`FieldType`] is the closed set of storage kinds the admin understands.
//! Every consumer matches on it exhaustively, so adding a variant is a
//! compile error everywhere a control or codec has to learn about it.
//! [`FieldDef`] captures the remaining metadata of one model field.

use crate::value::Value;

/// One member of an enumerated field.
///
/// `name` is the stable identifier sent over the wire, `value` is what gets
/// stored, and `label` is shown in selects and list cells.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Identifier used on the wire.
    pub name: String,
    /// Stored value.
    pub value: Value,
    /// Display label.
    pub label: String,
}

impl EnumMember {
    /// Creates a member whose label equals its name.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            value: value.into(),
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// The storage kind of a model field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Single-line text, usually bounded by `max_length`.
    ShortText,
    /// Multi-line text.
    LongText,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating-point number.
    Float,
    /// Fixed-precision decimal number, stored as a float.
    Decimal {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Boolean.
    Boolean,
    /// Date without time.
    Date,
    /// Date and time without timezone.
    DateTime,
    /// Time without date.
    Time,
    /// One of a fixed set of members.
    Enum {
        /// The allowed members, in display order.
        members: Vec<EnumMember>,
    },
    /// Arbitrary JSON document.
    Json,
    /// A stored file path, relative to the media root.
    File,
    /// A stored image path, relative to the media root.
    Image,
    /// HTML text edited with a rich-text editor.
    RichText,
    /// Many-to-one relationship; stores the target primary key.
    ForeignKey {
        /// The target model name.
        to: String,
    },
    /// Many-to-many relationship; stored in a link set, not on the row.
    ManyToMany {
        /// The target model name.
        to: String,
    },
}

impl FieldType {
    /// Returns the short tag naming this kind in site configuration files.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal { .. } => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::Enum { .. } => "enum",
            Self::Json => "json",
            Self::File => "file",
            Self::Image => "image",
            Self::RichText => "rich_text",
            Self::ForeignKey { .. } => "foreign_key",
            Self::ManyToMany { .. } => "many_to_many",
        }
    }
}

/// A default for fields left out of a creation payload.
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// A fixed value, also shown as the initial value of create forms.
    Value(Value),
    /// A value computed on the server at creation time, e.g. "now".
    Factory {
        /// Name of the factory, for diagnostics and config files.
        name: String,
        /// The generator.
        make: fn() -> Value,
    },
}

impl FieldDefault {
    /// Produces the default value.
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Factory { make, .. } => make(),
        }
    }

    /// Returns `true` for server-computed defaults.
    pub const fn is_factory(&self) -> bool {
        matches!(self, Self::Factory { .. })
    }

    /// Returns the fixed value, if this is not a factory.
    pub const fn literal(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Factory { .. } => None,
        }
    }
}

/// Complete definition of a model field.
///
/// # Examples
///
/// ```
/// use amis_admin_db::fields::{FieldDef, FieldType};
///
/// let title = FieldDef::new("title", FieldType::ShortText)
///     .max_length(120)
///     .description("Title(Shown on the front page):Enter a title");
/// assert!(!title.null);
/// assert!(!title.is_relation());
/// ```
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The attribute name of this field.
    pub name: String,
    /// The storage kind.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Default for creation payloads that omit the field.
    pub default: Option<FieldDefault>,
    /// Maximum character length for text fields.
    pub max_length: Option<usize>,
    /// Descriptive text, optionally shaped as `label(description):placeholder`.
    pub description: String,
}

impl FieldDef {
    /// Creates a non-null field without default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            primary_key: false,
            null: false,
            default: None,
            max_length: None,
            description: String::new(),
        }
    }

    /// Marks this field as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Sets the maximum character length.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets a fixed default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Sets a server-computed default.
    #[must_use]
    pub fn default_factory(mut self, name: impl Into<String>, make: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Factory {
            name: name.into(),
            make,
        });
        self
    }

    /// Sets the descriptive text.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Returns `true` for foreign keys and many-to-many fields.
    pub const fn is_relation(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::ForeignKey { .. } | FieldType::ManyToMany { .. }
        )
    }

    /// Returns `true` if the value lives in a link set instead of on the row.
    pub const fn is_many_to_many(&self) -> bool {
        matches!(self.field_type, FieldType::ManyToMany { .. })
    }

    /// Returns the target model of a relation.
    pub fn related_model(&self) -> Option<&str> {
        match &self.field_type {
            FieldType::ForeignKey { to } | FieldType::ManyToMany { to } => Some(to),
            _ => None,
        }
    }

    /// Returns `true` if a form must submit a value for this field.
    ///
    /// A field is required unless it is nullable or the server fills it in.
    pub fn is_required(&self) -> bool {
        !self.null && !self.default.as_ref().is_some_and(FieldDefault::is_factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> Value {
        Value::from("2024-01-01")
    }

    #[test]
    fn test_builder() {
        let f = FieldDef::new("title", FieldType::ShortText)
            .max_length(50)
            .nullable()
            .default("x")
            .description("Title");
        assert_eq!(f.name, "title");
        assert_eq!(f.max_length, Some(50));
        assert!(f.null);
        assert_eq!(
            f.default.as_ref().and_then(FieldDefault::literal),
            Some(&Value::from("x"))
        );
    }

    #[test]
    fn test_is_relation() {
        let fk = FieldDef::new("category", FieldType::ForeignKey { to: "category".into() });
        let m2m = FieldDef::new("tags", FieldType::ManyToMany { to: "tag".into() });
        let plain = FieldDef::new("title", FieldType::ShortText);
        assert!(fk.is_relation());
        assert!(!fk.is_many_to_many());
        assert!(m2m.is_many_to_many());
        assert!(!plain.is_relation());
        assert_eq!(fk.related_model(), Some("category"));
        assert_eq!(plain.related_model(), None);
    }

    #[test]
    fn test_is_required() {
        assert!(FieldDef::new("a", FieldType::Integer).is_required());
        assert!(!FieldDef::new("a", FieldType::Integer).nullable().is_required());
        assert!(FieldDef::new("a", FieldType::Integer).default(1).is_required());
        assert!(!FieldDef::new("a", FieldType::Date)
            .default_factory("today", today)
            .is_required());
    }

    #[test]
    fn test_default_produce() {
        let lit = FieldDefault::Value(Value::Int(3));
        assert_eq!(lit.produce(), Value::Int(3));
        assert!(!lit.is_factory());
        let fac = FieldDefault::Factory {
            name: "today".into(),
            make: today,
        };
        assert_eq!(fac.produce(), Value::from("2024-01-01"));
        assert!(fac.literal().is_none());
    }

    #[test]
    fn test_tags() {
        assert_eq!(FieldType::ShortText.tag(), "short_text");
        assert_eq!(
            FieldType::Decimal {
                max_digits: 5,
                decimal_places: 2
            }
            .tag(),
            "decimal"
        );
        assert_eq!(FieldType::ManyToMany { to: "t".into() }.tag(), "many_to_many");
    }

    #[test]
    fn test_enum_member_label() {
        let m = EnumMember::new("draft", "d").label("Draft");
        assert_eq!(m.name, "draft");
        assert_eq!(m.value, Value::from("d"));
        assert_eq!(m.label, "Draft");
    }
}

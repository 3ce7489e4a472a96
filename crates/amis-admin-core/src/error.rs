//! Error types for the amis-admin crates.
//!
//! [`AdminError`] carries the taxonomy every layer reports through:
//! configuration problems found while building a site, per-field validation
//! failures gathered by an engine, missing entities, refused operations, and
//! unexpected store failures. Each variant maps to the `status` code of the
//! JSON envelope returned to the frontend via [`AdminError::status`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A validation failure for a single field.
///
/// Produced by value codecs and relation resolution. The field name is
/// attached later, when an engine gathers per-field failures into a
/// [`ValidationError`].
///
/// # Examples
///
/// ```
/// use amis_admin_core::error::FieldError;
///
/// let err = FieldError::new("Enter a valid date (YYYY-MM-DD).", "invalid");
/// assert_eq!(err.code, "invalid");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The human-readable message shown next to the field.
    pub message: String,
    /// A short code identifying the failure (e.g. "required", "invalid").
    pub code: String,
}

impl FieldError {
    /// Creates a new `FieldError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// The "this field is required" failure.
    pub fn required() -> Self {
        Self::new("This field is required.", "required")
    }

    /// A generic "invalid value" failure.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(message, "invalid")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FieldError {}

/// Per-field validation errors gathered over a whole payload.
///
/// Keys are field names, values are the message to display. The map is
/// ordered so the 422 envelope is stable across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Messages keyed by field name.
    pub field_errors: BTreeMap<String, String>,
}

impl ValidationError {
    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error set holding a single field failure.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.insert(field, message);
        err
    }

    /// Records a failure for `field`. The first message for a field wins.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    /// Records a [`FieldError`] for `field`.
    pub fn push(&mut self, field: &str, error: FieldError) {
        self.insert(field, error.message);
    }

    /// Returns `true` when no field has failed.
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Returns the number of failing fields.
    pub fn len(&self) -> usize {
        self.field_errors.len()
    }

    /// Returns the message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    /// Converts into `Ok(())` when empty, otherwise into an [`AdminError`].
    pub fn into_result(self) -> AdminResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AdminError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.field_errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for amis-admin.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Unsupported field type, unknown field name, or missing setting.
    /// Raised while building a site; never recovered.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// One or more fields of a payload failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// An entity (or related entity) does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not available to the caller.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A descriptor was requested that is not defined for the field,
    /// e.g. an inline quick-edit cell for a relation.
    #[error("Structural error: {0}")]
    Structural(String),

    /// An unexpected failure reported by the store.
    #[error("Database error: {0}")]
    Database(String),

    /// A payload or config document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AdminError {
    /// Returns the non-zero `status` reported in the JSON envelope.
    ///
    /// - `Validation` -> 422
    /// - `NotFound` -> 404
    /// - `PermissionDenied` -> 403
    /// - `Serialization` -> 400
    /// - everything else -> 500
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 422,
            Self::NotFound(_) => 404,
            Self::PermissionDenied(_) => 403,
            Self::Serialization(_) => 400,
            Self::Configuration(_) | Self::Structural(_) | Self::Database(_) => 500,
        }
    }

    /// Shorthand for a one-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::single(field, message))
    }
}

impl From<ValidationError> for AdminError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, AdminError>`.
pub type AdminResult<T> = Result<T, AdminError>;

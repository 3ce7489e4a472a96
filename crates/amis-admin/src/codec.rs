//! Wire/storage value codecs.
//!
//! A [`ValueCodec`] converts a single field value between its wire form
//! (the JSON exchanged with the amis frontend) and its storage form
//! ([`Value`]). Codecs are pure: they validate shape and format but never
//! touch the store. Relation codecs only extract primary keys; checking that
//! those keys exist is the job of the
//! [`RelationResolver`](crate::relation::RelationResolver).
//!
//! Blank input (NULL, or an empty string for non-text kinds) is not handled
//! here; [`FieldControl`](crate::control::FieldControl) applies defaults and
//! nullability before a codec sees a value.

use amis_admin_core::FieldError;
use amis_admin_db::{EnumMember, Value};
use serde_json::Value as Json;

/// Wire format of dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format of date-times.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Wire format of times.
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Wire token for an unset tri-state boolean or enum.
pub const NONE_SENTINEL: &str = "None";

const DATETIME_INPUT_FORMATS: &[&str] = &[
    DATETIME_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const TIME_INPUT_FORMATS: &[&str] = &[TIME_FORMAT, "%H:%M"];

/// A two-way converter for one field kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCodec {
    /// Short text, long text, and rich text.
    Text {
        /// Maximum number of characters.
        max_length: Option<usize>,
    },
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Fixed-point decimals carried as floats.
    Decimal {
        /// Maximum total digits.
        max_digits: u32,
        /// Digits after the decimal point.
        decimal_places: u32,
    },
    /// Booleans with a default, carried as JSON booleans.
    Boolean,
    /// Booleans without a default, carried as `"True"`, `"False"`, `"None"`.
    TriState,
    /// Dates as `YYYY-MM-DD`.
    Date,
    /// Date-times as `YYYY-MM-DD HH:mm:ss`.
    DateTime,
    /// Times as `HH:mm:ss`.
    Time,
    /// Enum members carried by name.
    Enum {
        /// The allowed members.
        members: Vec<EnumMember>,
        /// Whether NULL travels as the `"None"` sentinel.
        sentinel: bool,
    },
    /// Arbitrary JSON.
    Json,
    /// File and image paths, relative in storage and absolute on the wire.
    Media {
        /// URL prefix of the media root.
        media_url: String,
    },
    /// A foreign key carried as a raw key or a `{label, value}` pair.
    ForeignKey,
    /// A many-to-many set carried as a list of keys or `{value}` entries,
    /// or as comma-joined keys.
    ManyToMany,
}

impl ValueCodec {
    /// Returns `true` if `wire` means "no value" for this kind.
    pub fn is_blank(&self, wire: &Json) -> bool {
        match wire {
            Json::Null => true,
            Json::String(s) if s.is_empty() => !matches!(self, Self::Text { .. }),
            _ => false,
        }
    }

    /// Converts a storage value into its wire form.
    pub fn to_wire(&self, value: &Value) -> Json {
        if value.is_null() {
            return match self {
                Self::TriState | Self::Enum { sentinel: true, .. } => {
                    Json::String(NONE_SENTINEL.to_string())
                }
                Self::ManyToMany => Json::Array(Vec::new()),
                _ => Json::Null,
            };
        }
        match (self, value) {
            (Self::Text { .. }, Value::String(s)) => Json::String(s.clone()),
            (Self::Text { .. }, other) => Json::String(other.to_string()),
            (Self::TriState, Value::Bool(b)) => {
                Json::String(if *b { "True" } else { "False" }.to_string())
            }
            (Self::Date, Value::Date(d)) => Json::String(d.format(DATE_FORMAT).to_string()),
            (Self::Date, Value::DateTime(dt)) => {
                Json::String(dt.date().format(DATE_FORMAT).to_string())
            }
            (Self::DateTime, Value::DateTime(dt)) => {
                Json::String(dt.format(DATETIME_FORMAT).to_string())
            }
            (Self::Time, Value::Time(t)) => Json::String(t.format(TIME_FORMAT).to_string()),
            (Self::Enum { members, .. }, v) => members
                .iter()
                .find(|m| &m.value == v)
                .map_or_else(|| v.to_json(), |m| Json::String(m.name.clone())),
            (Self::Media { media_url }, Value::String(path)) => {
                Json::String(media_join(media_url, path))
            }
            (Self::ManyToMany, Value::List(keys)) => {
                Json::Array(keys.iter().map(Value::to_json).collect())
            }
            (Self::ManyToMany, key) => Json::Array(vec![key.to_json()]),
            (_, v) => v.to_json(),
        }
    }

    /// Converts a non-blank wire value into its storage form.
    ///
    /// Returns [`Value::Null`] for the `"None"` sentinel of tri-state
    /// booleans and sentinel enums.
    pub fn to_storage(&self, wire: &Json) -> Result<Value, FieldError> {
        if wire.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Self::Text { max_length } => text_to_storage(wire, *max_length),
            Self::Integer => integer_to_storage(wire),
            Self::Float => {
                float_from_wire(wire).map(Value::Float).ok_or_else(|| FieldError::invalid("Enter a number."))
            }
            Self::Decimal {
                max_digits,
                decimal_places,
            } => decimal_to_storage(wire, *max_digits, *decimal_places),
            Self::Boolean => boolean_to_storage(wire),
            Self::TriState => tristate_to_storage(wire),
            Self::Date => date_to_storage(wire),
            Self::DateTime => datetime_to_storage(wire),
            Self::Time => time_to_storage(wire),
            Self::Enum { members, sentinel } => enum_to_storage(wire, members, *sentinel),
            Self::Json => json_to_storage(wire),
            Self::Media { media_url } => match wire {
                Json::String(s) => Ok(Value::String(media_strip(media_url, s))),
                _ => Err(FieldError::invalid("Enter a valid file path.")),
            },
            Self::ForeignKey => foreign_key_from_wire(wire)
                .ok_or_else(|| FieldError::invalid("Select a valid choice.")),
            Self::ManyToMany => many_to_many_from_wire(wire)
                .map(Value::List)
                .ok_or_else(|| FieldError::invalid("Enter a list of values.")),
        }
    }
}

/// Client-side hints for a decimal control: `(precision, max magnitude)`.
pub fn decimal_hints(max_digits: u32, decimal_places: u32) -> (u32, f64) {
    let whole = i32::try_from(max_digits.saturating_sub(decimal_places)).unwrap_or(i32::MAX);
    let places = i32::try_from(decimal_places).unwrap_or(i32::MAX);
    (decimal_places, 10f64.powi(whole) - 10f64.powi(-places))
}

// ── Media paths ────────────────────────────────────────────────────

fn media_prefix(media_url: &str) -> String {
    format!("{}/", media_url.trim_end_matches('/'))
}

/// Prefixes a relative media path with the media URL, unless already prefixed.
pub fn media_join(media_url: &str, path: &str) -> String {
    let prefix = media_prefix(media_url);
    if path.starts_with(&prefix) {
        path.to_string()
    } else {
        format!("{prefix}{}", path.trim_start_matches('/'))
    }
}

/// Strips the media URL from an absolute media path, if present.
pub fn media_strip(media_url: &str, path: &str) -> String {
    let prefix = media_prefix(media_url);
    path.strip_prefix(&prefix).unwrap_or(path).to_string()
}

// ── Scalar conversions ─────────────────────────────────────────────

fn text_to_storage(wire: &Json, max_length: Option<usize>) -> Result<Value, FieldError> {
    let text = match wire {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        Json::Bool(b) => b.to_string(),
        _ => return Err(FieldError::invalid("Enter a valid text.")),
    };
    if let Some(max) = max_length {
        let len = text.chars().count();
        if len > max {
            return Err(FieldError::new(
                format!("Ensure this value has at most {max} characters (it has {len})."),
                "max_length",
            ));
        }
    }
    Ok(Value::String(text))
}

fn integer_to_storage(wire: &Json) -> Result<Value, FieldError> {
    let parsed = match wire {
        Json::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation)]
                    let i = f as i64;
                    i
                })
        }),
        Json::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(Value::Int)
        .ok_or_else(|| FieldError::invalid("Enter a whole number."))
}

fn float_from_wire(wire: &Json) -> Option<f64> {
    match wire {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn decimal_to_storage(wire: &Json, max_digits: u32, decimal_places: u32) -> Result<Value, FieldError> {
    let n = float_from_wire(wire).ok_or_else(|| FieldError::invalid("Enter a number."))?;
    let repr = n.to_string();
    let mut parts = repr.trim_start_matches('-').split('.');
    // A lone leading zero is not a significant digit.
    let whole_digits = parts.next().map_or(0, |w| if w == "0" { 0 } else { w.len() });
    let places = parts.next().map_or(0, str::len);

    if places > decimal_places as usize {
        return Err(FieldError::invalid(format!(
            "Ensure that there are no more than {decimal_places} decimal places."
        )));
    }
    if whole_digits + places > max_digits as usize {
        return Err(FieldError::invalid(format!(
            "Ensure that there are no more than {max_digits} digits in total."
        )));
    }
    let max_whole = max_digits.saturating_sub(decimal_places);
    if whole_digits > max_whole as usize {
        return Err(FieldError::invalid(format!(
            "Ensure that there are no more than {max_whole} digits before the decimal point."
        )));
    }
    Ok(Value::Float(n))
}

fn boolean_to_storage(wire: &Json) -> Result<Value, FieldError> {
    match wire {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
        Json::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
        Json::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(FieldError::invalid("Enter true or false.")),
        },
        _ => Err(FieldError::invalid("Enter true or false.")),
    }
}

fn tristate_to_storage(wire: &Json) -> Result<Value, FieldError> {
    match wire {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::String(s) => match s.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            NONE_SENTINEL | "none" | "null" => Ok(Value::Null),
            _ => Err(FieldError::invalid("Select a valid choice.")),
        },
        _ => Err(FieldError::invalid("Select a valid choice.")),
    }
}

fn date_to_storage(wire: &Json) -> Result<Value, FieldError> {
    let err = || FieldError::invalid("Enter a valid date (YYYY-MM-DD).");
    let Json::String(raw) = wire else {
        return Err(err());
    };
    let raw = raw.trim();
    chrono::NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map(|dt| dt.date()))
        .map(Value::Date)
        .map_err(|_| err())
}

fn datetime_to_storage(wire: &Json) -> Result<Value, FieldError> {
    let err = || FieldError::invalid("Enter a valid date/time (YYYY-MM-DD HH:mm:ss).");
    match wire {
        Json::String(raw) => {
            let raw = raw.trim();
            DATETIME_INPUT_FORMATS
                .iter()
                .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
                .or_else(|| {
                    chrono::NaiveDate::parse_from_str(raw, DATE_FORMAT)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(Value::DateTime)
                .ok_or_else(err)
        }
        // amis date pickers may submit unix timestamps.
        Json::Number(n) => n
            .as_i64()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|dt| Value::DateTime(dt.naive_utc()))
            .ok_or_else(err),
        _ => Err(err()),
    }
}

fn time_to_storage(wire: &Json) -> Result<Value, FieldError> {
    let err = || FieldError::invalid("Enter a valid time (HH:mm:ss).");
    let Json::String(raw) = wire else {
        return Err(err());
    };
    let raw = raw.trim();
    TIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveTime::parse_from_str(raw, fmt).ok())
        .map(Value::Time)
        .ok_or_else(err)
}

fn enum_to_storage(wire: &Json, members: &[EnumMember], sentinel: bool) -> Result<Value, FieldError> {
    let name = match wire {
        Json::String(s) => s.clone(),
        Json::Number(n) => n.to_string(),
        _ => return Err(FieldError::invalid("Select a valid choice.")),
    };
    if sentinel && name == NONE_SENTINEL {
        return Ok(Value::Null);
    }
    members
        .iter()
        .find(|m| m.name == name)
        .map(|m| m.value.clone())
        .ok_or_else(|| {
            FieldError::invalid(format!(
                "Select a valid choice. {name} is not one of the available choices."
            ))
        })
}

fn json_to_storage(wire: &Json) -> Result<Value, FieldError> {
    match wire {
        Json::String(s) => serde_json::from_str(s)
            .map(Value::Json)
            .map_err(|_| FieldError::invalid("Enter a valid JSON.")),
        other => Ok(Value::Json(other.clone())),
    }
}

// ── Relation keys ──────────────────────────────────────────────────

fn key_from_wire(wire: &Json) -> Option<Value> {
    match wire {
        Json::Object(map) => map.get("value").and_then(Value::pk_from_json),
        other => Value::pk_from_json(other),
    }
}

fn foreign_key_from_wire(wire: &Json) -> Option<Value> {
    key_from_wire(wire)
}

fn many_to_many_from_wire(wire: &Json) -> Option<Vec<Value>> {
    let keys: Vec<Value> = match wire {
        Json::Array(items) => items.iter().map(key_from_wire).collect::<Option<_>>()?,
        Json::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Value::parse_pk)
            .collect(),
        other => vec![key_from_wire(other)?],
    };
    let mut unique: Vec<Value> = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    Some(unique)
}

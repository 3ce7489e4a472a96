//! Query lookups, Q objects, and the [`Query`] builder.
//!
//! [`Lookup`] is a field-level comparison, [`Q`] combines lookups with AND,
//! OR and NOT, and [`Query`] adds ordering, slicing, and eager loading of
//! relations. A [`Store`](crate::store::Store) receives a `Query` and decides
//! how to evaluate it; [`Q::matches`] is the reference evaluation over a
//! [`Record`].
//!
//! # Examples
//!
//! ```
//! use amis_admin_db::query::{Lookup, Q, Query};
//! use amis_admin_db::value::Value;
//!
//! let q = Q::filter("title", Lookup::IContains("rust".into()))
//!     | Q::filter("body", Lookup::IContains("rust".into()));
//! let query = Query::new("article").filter(q).order_by("-id").limit(10);
//! assert_eq!(query.limit, Some(10));
//! ```

use std::ops;

use crate::model::Record;
use crate::value::Value;

/// A field-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match.
    Exact(Value),
    /// Case-insensitive substring match on the display form.
    IContains(String),
    /// Membership test.
    In(Vec<Value>),
    /// NULL test (`true` means "is NULL").
    IsNull(bool),
}

impl Lookup {
    /// Evaluates the lookup against one value.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Exact(expected) => values_equal(value, expected),
            Self::IContains(needle) => {
                !value.is_null() && value.to_string().to_lowercase().contains(&needle.to_lowercase())
            }
            Self::In(candidates) => candidates.iter().any(|c| values_equal(value, c)),
            Self::IsNull(expect_null) => value.is_null() == *expect_null,
        }
    }
}

/// Compares values, treating integer and string primary keys that print
/// the same as equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::String(s)) | (Value::String(s), Value::Int(x)) => {
            s.trim().parse::<i64>().is_ok_and(|y| y == *x)
        }
        _ => a == b,
    }
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT).
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single field lookup.
    Filter {
        /// The field name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND or OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Evaluates the filter against a record. An empty OR matches nothing;
    /// an empty AND matches everything.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Filter { field, lookup } => lookup.matches(record.value(field)),
            Self::And(children) => children.iter().all(|q| q.matches(record)),
            Self::Or(children) => children.iter().any(|q| q.matches(record)),
            Self::Not(inner) => !inner.matches(record),
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to sort by.
    pub field: String,
    /// Whether to sort descending.
    pub descending: bool,
}

impl OrderBy {
    /// Parses `"field"` or `"-field"`.
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-').map_or_else(
            || Self {
                field: spec.to_string(),
                descending: false,
            },
            |field| Self {
                field: field.to_string(),
                descending: true,
            },
        )
    }
}

/// A relation to load eagerly with the result rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedLoad {
    /// The relation field on the queried model.
    pub field: String,
    /// The target model.
    pub target: String,
}

/// A query against one model.
///
/// `select_related` is meant for single-valued relations (a join or a second
/// keyed fetch), `prefetch_related` for many-valued ones (one batched fetch
/// per relation).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The model being queried.
    pub model: String,
    /// Row filter; `None` matches every row.
    pub filter: Option<Q>,
    /// Ordering terms, applied in order.
    pub order_by: Vec<OrderBy>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
    /// Number of rows to skip.
    pub offset: Option<usize>,
    /// Single-valued relations to load.
    pub select_related: Vec<RelatedLoad>,
    /// Many-valued relations to load.
    pub prefetch_related: Vec<RelatedLoad>,
}

impl Query {
    /// Creates an unfiltered query over every row of `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            filter: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            select_related: Vec::new(),
            prefetch_related: Vec::new(),
        }
    }

    /// ANDs a condition onto the filter.
    #[must_use]
    pub fn filter(mut self, q: Q) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing & q,
            None => q,
        });
        self
    }

    /// Appends an ordering term (`"field"` or `"-field"`).
    #[must_use]
    pub fn order_by(mut self, spec: &str) -> Self {
        self.order_by.push(OrderBy::parse(spec));
        self
    }

    /// Limits the number of rows.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skips the first `n` rows.
    #[must_use]
    pub const fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Loads a single-valued relation with each row.
    #[must_use]
    pub fn select_related(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.select_related.push(RelatedLoad {
            field: field.into(),
            target: target.into(),
        });
        self
    }

    /// Loads a many-valued relation with each row.
    #[must_use]
    pub fn prefetch_related(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.prefetch_related.push(RelatedLoad {
            field: field.into(),
            target: target.into(),
        });
        self
    }

    /// Returns the same query without slicing or eager loading, as used
    /// for counting.
    #[must_use]
    pub fn for_count(&self) -> Self {
        Self {
            model: self.model.clone(),
            filter: self.filter.clone(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            select_related: Vec::new(),
            prefetch_related: Vec::new(),
        }
    }
}

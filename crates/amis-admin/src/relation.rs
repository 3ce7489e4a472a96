//! Relation resolution for foreign-key and many-to-many fields.
//!
//! A [`RelationResolver`] answers three questions for one relation field:
//! which rows may be selected (the options endpoint), whether submitted keys
//! point at existing rows, and which link-set edits turn the current
//! many-to-many membership into the desired one.
//!
//! Reconciliation issues at most one batch removal followed by at most one
//! batch addition, never per-key calls, and skips a side that is empty.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value as Json};

use amis_admin_core::{AdminError, AdminResult, FieldError};
use amis_admin_db::{Lookup, ModelMeta, Query, Record, Related, Store, Value, Q};

use crate::amis::SelectOption;

/// Whether a relation points at one row or a set of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A foreign key.
    ManyToOne,
    /// A many-to-many link set.
    ManyToMany,
}

/// Parameters of an options lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsRequest {
    /// Scope the options to rows already related to this owner.
    pub pk: Option<Value>,
    /// 1-indexed page; pagination needs both `page` and `per_page`.
    pub page: Option<usize>,
    /// Page size.
    pub per_page: Option<usize>,
    /// Case-insensitive filter on the target's label field.
    pub term: Option<String>,
}

/// The answer of an options lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionsPage {
    /// One page of options plus the total count.
    Paged {
        /// Total number of matching rows.
        total: usize,
        /// Options on this page.
        items: Vec<SelectOption>,
    },
    /// Every matching option.
    All {
        /// All options.
        options: Vec<SelectOption>,
    },
}

/// The link-set edits needed to reach a desired membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationPlan {
    /// Keys to link.
    pub to_add: Vec<Value>,
    /// Keys to unlink.
    pub to_remove: Vec<Value>,
}

impl RelationPlan {
    /// Computes `desired - current` and `current - desired` by key equality.
    ///
    /// # Examples
    ///
    /// ```
    /// use amis_admin::relation::RelationPlan;
    /// use amis_admin_db::Value;
    ///
    /// let plan = RelationPlan::diff(
    ///     &[Value::from("A"), Value::from("B")],
    ///     &[Value::from("B"), Value::from("C")],
    /// );
    /// assert_eq!(plan.to_remove, vec![Value::from("A")]);
    /// assert_eq!(plan.to_add, vec![Value::from("C")]);
    /// ```
    pub fn diff(current: &[Value], desired: &[Value]) -> Self {
        let mut plan = Self::default();
        for key in desired {
            if !contains_key(current, key) && !contains_key(&plan.to_add, key) {
                plan.to_add.push(key.clone());
            }
        }
        for key in current {
            if !contains_key(desired, key) && !contains_key(&plan.to_remove, key) {
                plan.to_remove.push(key.clone());
            }
        }
        plan
    }

    /// Returns `true` if no edit is needed.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

fn contains_key(keys: &[Value], key: &Value) -> bool {
    let lookup = Lookup::Exact(key.clone());
    keys.iter().any(|k| lookup.matches(k))
}

/// Resolves one relation field of an owner model.
#[derive(Debug, Clone)]
pub struct RelationResolver {
    owner: Arc<ModelMeta>,
    field: String,
    target: Arc<ModelMeta>,
    cardinality: Cardinality,
}

impl RelationResolver {
    /// Creates a resolver for `owner.field` pointing at `target`.
    pub fn new(
        owner: Arc<ModelMeta>,
        field: impl Into<String>,
        target: Arc<ModelMeta>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            owner,
            field: field.into(),
            target,
            cardinality,
        }
    }

    /// The relation field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The target model.
    pub fn target(&self) -> &Arc<ModelMeta> {
        &self.target
    }

    /// Whether this is a foreign key or a link set.
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Builds the `{label, value}` option for a target row.
    pub fn option_for(&self, row: &Record) -> SelectOption {
        SelectOption::new(row.label(&self.target), row.pk(&self.target).to_json())
    }

    /// Adds this relation's eager load to a query over the owner model.
    #[must_use]
    pub fn eager_load(&self, query: Query) -> Query {
        match self.cardinality {
            Cardinality::ManyToOne => query.select_related(&self.field, &self.target.name),
            Cardinality::ManyToMany => query.prefetch_related(&self.field, &self.target.name),
        }
    }

    /// Renders the relation of an owner row for the wire.
    ///
    /// Loaded rows become `{label, value}` pairs; an unloaded foreign key
    /// falls back to its raw key.
    pub fn to_wire(&self, row: &Record) -> Json {
        match (self.cardinality, row.related(&self.field)) {
            (Cardinality::ManyToOne, Some(Related::One(Some(target)))) => {
                json!(self.option_for(target))
            }
            (Cardinality::ManyToOne, _) => row.value(&self.field).to_json(),
            (Cardinality::ManyToMany, Some(Related::Many(rows))) => {
                Json::Array(rows.iter().map(|r| json!(self.option_for(r))).collect())
            }
            (Cardinality::ManyToMany, _) => Json::Array(Vec::new()),
        }
    }

    /// Lists selectable target rows.
    ///
    /// With `pk`, a many-to-many relation is scoped to the owner's current
    /// members and a foreign key to the owner's current target.
    pub async fn options(&self, store: &dyn Store, request: &OptionsRequest) -> AdminResult<OptionsPage> {
        let mut query = Query::new(&self.target.name).order_by(&self.target.pk);

        if let Some(owner_pk) = &request.pk {
            let scope = match self.cardinality {
                Cardinality::ManyToMany => {
                    store.related_pks(&self.owner, &self.field, owner_pk).await?
                }
                Cardinality::ManyToOne => {
                    let owner = store.get(&self.owner, owner_pk).await?.ok_or_else(|| {
                        AdminError::NotFound(format!("{} {owner_pk}", self.owner.name))
                    })?;
                    let fk = owner.value(&self.field).clone();
                    if fk.is_null() {
                        Vec::new()
                    } else {
                        vec![fk]
                    }
                }
            };
            query = query.filter(Q::filter(&self.target.pk, Lookup::In(scope)));
        }

        if let Some(term) = request.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(Q::filter(
                self.target.label_field_name(),
                Lookup::IContains(term.to_string()),
            ));
        }

        match (request.page, request.per_page) {
            (Some(page), Some(per_page)) => {
                let per_page = per_page.max(1);
                let page = page.max(1);
                let total = store.count(&self.target, &query.for_count()).await?;
                let rows = store
                    .fetch(
                        &self.target,
                        &query
                            .offset((page - 1).saturating_mul(per_page))
                            .limit(per_page),
                    )
                    .await?;
                Ok(OptionsPage::Paged {
                    total,
                    items: rows.iter().map(|r| self.option_for(r)).collect(),
                })
            }
            _ => {
                let rows = store.fetch(&self.target, &query).await?;
                Ok(OptionsPage::All {
                    options: rows.iter().map(|r| self.option_for(r)).collect(),
                })
            }
        }
    }

    /// Checks that submitted keys point at existing target rows.
    ///
    /// `value` is a key for a foreign key and a list of keys for a link set.
    /// Missing rows are reported as a field error, not as not-found.
    pub async fn verify(&self, store: &dyn Store, value: &Value) -> AdminResult<Result<(), FieldError>> {
        let keys: Vec<Value> = match value {
            Value::Null => return Ok(Ok(())),
            Value::List(keys) => keys.clone(),
            key => vec![key.clone()],
        };
        if keys.is_empty() {
            return Ok(Ok(()));
        }
        let query = Query::new(&self.target.name)
            .filter(Q::filter(&self.target.pk, Lookup::In(keys.clone())));
        let found: Vec<Value> = store
            .fetch(&self.target, &query)
            .await?
            .iter()
            .map(|r| r.pk(&self.target).clone())
            .collect();
        let missing: Vec<String> = keys
            .iter()
            .filter(|k| !contains_key(&found, k))
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(Ok(()))
        } else {
            Ok(Err(FieldError::new(
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    missing.join(", ")
                ),
                "invalid_choice",
            )))
        }
    }

    /// Moves the owner's link set to `desired`.
    ///
    /// On creation the owner has no links yet, so only the addition is
    /// issued. Otherwise the current members are read first; removal runs
    /// before addition.
    pub async fn reconcile(
        &self,
        store: &dyn Store,
        owner_pk: &Value,
        desired: &[Value],
        creating: bool,
    ) -> AdminResult<RelationPlan> {
        let plan = if creating {
            RelationPlan::diff(&[], desired)
        } else {
            let current = store.related_pks(&self.owner, &self.field, owner_pk).await?;
            RelationPlan::diff(&current, desired)
        };
        if !plan.to_remove.is_empty() {
            store
                .related_remove(&self.owner, &self.field, owner_pk, &plan.to_remove)
                .await?;
        }
        if !plan.to_add.is_empty() {
            store
                .related_add(&self.owner, &self.field, owner_pk, &plan.to_add)
                .await?;
        }
        tracing::debug!(
            field = %self.field,
            added = plan.to_add.len(),
            removed = plan.to_remove.len(),
            "reconciled link set"
        );
        Ok(plan)
    }
}

//! In-memory [`Store`] implementation.
//!
//! Rows live in per-model tables behind an `Arc<RwLock<...>>`; many-to-many
//! link sets are kept per `(model, field)`. Every write and link-set edit is
//! appended to a call log so tests can assert how often the engine touched
//! the store.
//!
//! # Example
//!
//! ```
//! use amis_admin_db::memory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! assert!(store.calls().is_empty());
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use amis_admin_core::{AdminError, AdminResult};

use crate::model::{ModelMeta, Record, Related};
use crate::query::{Lookup, OrderBy, Query, Q};
use crate::store::Store;
use crate::value::Value;

/// A write recorded by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// A row was inserted.
    Insert {
        /// The model written to.
        model: String,
    },
    /// A row was saved.
    Save {
        /// The model written to.
        model: String,
        /// The saved row's primary key.
        pk: Value,
    },
    /// Rows were deleted.
    Delete {
        /// The model written to.
        model: String,
        /// How many rows were removed.
        count: usize,
    },
    /// Keys were linked in one batch.
    RelatedAdd {
        /// The owning model.
        model: String,
        /// The relation field.
        field: String,
        /// The owner's primary key.
        owner: Value,
        /// The linked keys.
        targets: Vec<Value>,
    },
    /// Keys were unlinked in one batch.
    RelatedRemove {
        /// The owning model.
        model: String,
        /// The relation field.
        field: String,
        /// The owner's primary key.
        owner: Value,
        /// The unlinked keys.
        targets: Vec<Value>,
    },
}

impl StoreCall {
    /// Returns `true` for link-set edits.
    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::RelatedAdd { .. } | Self::RelatedRemove { .. })
    }
}

#[derive(Debug, Clone)]
struct Table {
    pk: String,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn new(pk: &str) -> Self {
        Self {
            pk: pk.to_string(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn position(&self, pk: &Value) -> Option<usize> {
        let lookup = Lookup::Exact(pk.clone());
        self.rows.iter().position(|r| lookup.matches(r.value(&self.pk)))
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
    links: HashMap<(String, String), Vec<(Value, Value)>>,
    calls: Vec<StoreCall>,
}

impl Inner {
    fn linked(&self, model: &str, field: &str, owner: &Value) -> Vec<Value> {
        let owner_lookup = Lookup::Exact(owner.clone());
        self.links
            .get(&(model.to_string(), field.to_string()))
            .map(|pairs| {
                pairs
                    .iter()
                    .filter(|(o, _)| owner_lookup.matches(o))
                    .map(|(_, t)| t.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn find(&self, model: &str, pk: &Value) -> Option<Record> {
        let table = self.tables.get(model)?;
        table.position(pk).map(|i| table.rows[i].clone())
    }

    fn attach_related(&self, meta: &ModelMeta, query: &Query, row: &mut Record) {
        for load in &query.select_related {
            let fk = row.value(&load.field).clone();
            let target = if fk.is_null() {
                None
            } else {
                self.find(&load.target, &fk).map(Box::new)
            };
            row.set_related(load.field.clone(), Related::One(target));
        }
        for load in &query.prefetch_related {
            let owner = row.pk(meta).clone();
            let members = self
                .linked(&meta.name, &load.field, &owner)
                .iter()
                .filter_map(|pk| self.find(&load.target, pk))
                .collect();
            row.set_related(load.field.clone(), Related::Many(members));
        }
    }
}

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every stored row of `model` in insertion order.
    pub fn rows(&self, model: &str) -> Vec<Record> {
        self.read()
            .tables
            .get(model)
            .map_or_else(Vec::new, |t| t.rows.clone())
    }

    /// Returns the keys linked to `owner` through `model.field`.
    pub fn links(&self, model: &str, field: &str, owner: &Value) -> Vec<Value> {
        self.read().linked(model, field, owner)
    }

    /// Returns the recorded writes in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.read().calls.clone()
    }

    /// Returns only the recorded link-set edits.
    pub fn relation_calls(&self) -> Vec<StoreCall> {
        self.read()
            .calls
            .iter()
            .filter(|c| c.is_relation())
            .cloned()
            .collect()
    }

    /// Forgets the recorded writes.
    pub fn clear_calls(&self) {
        self.write().calls.clear();
    }
}

fn sort_rows(rows: &mut [Record], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for term in order_by {
            let ord = a.value(&term.field).compare(b.value(&term.field));
            let ord = if term.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn matching<'a>(table: Option<&'a Table>, filter: Option<&'a Q>) -> impl Iterator<Item = &'a Record> {
    table
        .into_iter()
        .flat_map(|t| t.rows.iter())
        .filter(move |r| filter.map_or(true, |q| q.matches(r)))
}

#[async_trait]
impl Store for InMemoryStore {
    async fn fetch(&self, meta: &ModelMeta, query: &Query) -> AdminResult<Vec<Record>> {
        let inner = self.read();
        let mut rows: Vec<Record> = matching(inner.tables.get(&meta.name), query.filter.as_ref())
            .cloned()
            .collect();
        sort_rows(&mut rows, &query.order_by);
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let mut page: Vec<Record> = rows.into_iter().skip(offset).take(limit).collect();
        for row in &mut page {
            inner.attach_related(meta, query, row);
        }
        Ok(page)
    }

    async fn count(&self, meta: &ModelMeta, query: &Query) -> AdminResult<usize> {
        let inner = self.read();
        Ok(matching(inner.tables.get(&meta.name), query.filter.as_ref()).count())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn insert(&self, meta: &ModelMeta, mut record: Record) -> AdminResult<Record> {
        let mut inner = self.write();
        let table = inner
            .tables
            .entry(meta.name.clone())
            .or_insert_with(|| Table::new(&meta.pk));

        let pk = record.pk(meta).clone();
        if pk.is_null() {
            if !meta.auto_pk() {
                return Err(AdminError::Database(format!(
                    "Model '{}' requires an explicit primary key",
                    meta.name
                )));
            }
            let id = table.next_id;
            table.next_id += 1;
            record.set(meta.pk.clone(), Value::Int(id));
        } else {
            if table.position(&pk).is_some() {
                return Err(AdminError::Database(format!(
                    "Duplicate primary key {pk} for '{}'",
                    meta.name
                )));
            }
            if let Value::Int(id) = pk {
                table.next_id = table.next_id.max(id + 1);
            }
        }

        table.rows.push(record.clone());
        inner.calls.push(StoreCall::Insert {
            model: meta.name.clone(),
        });
        Ok(record)
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn save(&self, meta: &ModelMeta, record: &Record) -> AdminResult<()> {
        let mut inner = self.write();
        let pk = record.pk(meta).clone();
        let table = inner
            .tables
            .get_mut(&meta.name)
            .ok_or_else(|| AdminError::NotFound(format!("{} {pk}", meta.name)))?;
        let index = table
            .position(&pk)
            .ok_or_else(|| AdminError::NotFound(format!("{} {pk}", meta.name)))?;
        table.rows[index].merge(record);
        inner.calls.push(StoreCall::Save {
            model: meta.name.clone(),
            pk,
        });
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn delete(&self, meta: &ModelMeta, filter: &Q) -> AdminResult<usize> {
        let mut inner = self.write();
        let Some(table) = inner.tables.get_mut(&meta.name) else {
            return Ok(0);
        };
        let pk_field = table.pk.clone();
        let mut removed = Vec::new();
        table.rows.retain(|r| {
            if filter.matches(r) {
                removed.push(r.value(&pk_field).clone());
                false
            } else {
                true
            }
        });

        // Drop link rows owned by the deleted rows.
        for ((model, _), pairs) in &mut inner.links {
            if model == &meta.name {
                pairs.retain(|(owner, _)| {
                    !removed.iter().any(|pk| Lookup::Exact(pk.clone()).matches(owner))
                });
            }
        }

        let count = removed.len();
        inner.calls.push(StoreCall::Delete {
            model: meta.name.clone(),
            count,
        });
        Ok(count)
    }

    async fn related_pks(
        &self,
        meta: &ModelMeta,
        field: &str,
        owner: &Value,
    ) -> AdminResult<Vec<Value>> {
        Ok(self.read().linked(&meta.name, field, owner))
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn related_add(
        &self,
        meta: &ModelMeta,
        field: &str,
        owner: &Value,
        targets: &[Value],
    ) -> AdminResult<()> {
        let mut inner = self.write();
        let existing = inner.linked(&meta.name, field, owner);
        let pairs = inner
            .links
            .entry((meta.name.clone(), field.to_string()))
            .or_default();
        for target in targets {
            let lookup = Lookup::Exact(target.clone());
            if !existing.iter().any(|e| lookup.matches(e)) {
                pairs.push((owner.clone(), target.clone()));
            }
        }
        inner.calls.push(StoreCall::RelatedAdd {
            model: meta.name.clone(),
            field: field.to_string(),
            owner: owner.clone(),
            targets: targets.to_vec(),
        });
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn related_remove(
        &self,
        meta: &ModelMeta,
        field: &str,
        owner: &Value,
        targets: &[Value],
    ) -> AdminResult<()> {
        let mut inner = self.write();
        if let Some(pairs) = inner.links.get_mut(&(meta.name.clone(), field.to_string())) {
            let owner_lookup = Lookup::Exact(owner.clone());
            pairs.retain(|(o, t)| {
                !(owner_lookup.matches(o)
                    && targets.iter().any(|x| Lookup::Exact(x.clone()).matches(t)))
            });
        }
        inner.calls.push(StoreCall::RelatedRemove {
            model: meta.name.clone(),
            field: field.to_string(),
            owner: owner.clone(),
            targets: targets.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};

    fn category() -> ModelMeta {
        ModelMeta::new("category")
            .field(FieldDef::new("name", FieldType::ShortText))
            .label_field("name")
    }

    fn tag() -> ModelMeta {
        ModelMeta::new("tag").field(FieldDef::new("name", FieldType::ShortText))
    }

    fn article() -> ModelMeta {
        ModelMeta::new("article")
            .field(FieldDef::new("title", FieldType::ShortText))
            .field(FieldDef::new(
                "category",
                FieldType::ForeignKey {
                    to: "category".into(),
                },
            ))
            .field(FieldDef::new("tags", FieldType::ManyToMany { to: "tag".into() }))
    }

    async fn seed_names(store: &InMemoryStore, meta: &ModelMeta, names: &[&str]) {
        for name in names {
            store
                .insert(meta, Record::from_pairs([("name", *name)]))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_incrementing_pk() {
        let store = InMemoryStore::new();
        let meta = category();
        let a = store.insert(&meta, Record::new()).await.unwrap();
        let b = store.insert(&meta, Record::new()).await.unwrap();
        assert_eq!(a.value("id"), &Value::Int(1));
        assert_eq!(b.value("id"), &Value::Int(2));
        assert_eq!(store.rows("category").len(), 2);
    }

    #[tokio::test]
    async fn test_insert_explicit_pk_and_duplicate() {
        let store = InMemoryStore::new();
        let meta = category();
        store
            .insert(&meta, Record::from_pairs([("id", 10_i64)]))
            .await
            .unwrap();
        let dup = store.insert(&meta, Record::from_pairs([("id", 10_i64)])).await;
        assert!(matches!(dup, Err(AdminError::Database(_))));
        let next = store.insert(&meta, Record::new()).await.unwrap();
        assert_eq!(next.value("id"), &Value::Int(11));
    }

    #[tokio::test]
    async fn test_insert_requires_non_auto_pk() {
        let store = InMemoryStore::new();
        let meta =
            ModelMeta::new("page").field(FieldDef::new("slug", FieldType::ShortText).primary_key());
        let err = store.insert(&meta, Record::new()).await.unwrap_err();
        assert!(matches!(err, AdminError::Database(_)));
    }

    #[tokio::test]
    async fn test_fetch_filter_order_slice() {
        let store = InMemoryStore::new();
        let meta = category();
        seed_names(&store, &meta, &["b", "a", "c", "ab"]).await;

        let query = Query::new("category")
            .filter(Q::filter("name", Lookup::IContains("a".into())))
            .order_by("name");
        let rows = store.fetch(&meta, &query).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.value("name").to_string()).collect();
        assert_eq!(names, vec!["a", "ab"]);

        let page = store
            .fetch(&meta, &Query::new("category").order_by("-id").offset(1).limit(2))
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.value("id").clone()).collect();
        assert_eq!(ids, vec![Value::Int(3), Value::Int(2)]);

        assert_eq!(store.count(&meta, &query).await.unwrap(), 2);
        assert_eq!(store.count(&meta, &Query::new("category")).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_fetch_unknown_table_is_empty() {
        let store = InMemoryStore::new();
        let rows = store.fetch(&category(), &Query::new("category")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_get_matches_string_pk() {
        let store = InMemoryStore::new();
        let meta = category();
        seed_names(&store, &meta, &["news"]).await;
        let found = store.get(&meta, &Value::from("1")).await.unwrap();
        assert_eq!(found.unwrap().value("name"), &Value::from("news"));
        assert!(store.get(&meta, &Value::Int(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_merges_and_logs() {
        let store = InMemoryStore::new();
        let meta = category();
        seed_names(&store, &meta, &["old"]).await;
        store.clear_calls();

        let rec = Record::from_pairs([("id", Value::Int(1)), ("name", Value::from("new"))]);
        store.save(&meta, &rec).await.unwrap();
        assert_eq!(store.rows("category")[0].value("name"), &Value::from("new"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::Save {
                model: "category".into(),
                pk: Value::Int(1)
            }]
        );

        let missing = Record::from_pairs([("id", 5_i64)]);
        assert!(matches!(
            store.save(&meta, &missing).await,
            Err(AdminError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_counts_and_is_idempotent() {
        let store = InMemoryStore::new();
        let meta = category();
        seed_names(&store, &meta, &["a", "b", "c"]).await;
        let filter = Q::filter("id", Lookup::In(vec![Value::Int(1), Value::Int(3)]));
        assert_eq!(store.delete(&meta, &filter).await.unwrap(), 2);
        assert_eq!(store.delete(&meta, &filter).await.unwrap(), 0);
        assert_eq!(store.rows("category").len(), 1);
        assert_eq!(store.delete(&tag(), &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_links_add_remove() {
        let store = InMemoryStore::new();
        let meta = article();
        let owner = Value::Int(1);
        store
            .related_add(&meta, "tags", &owner, &[Value::Int(1), Value::Int(2)])
            .await
            .unwrap();
        store
            .related_add(&meta, "tags", &owner, &[Value::Int(2), Value::Int(3)])
            .await
            .unwrap();
        assert_eq!(
            store.links("article", "tags", &owner),
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
        store
            .related_remove(&meta, "tags", &owner, &[Value::Int(2)])
            .await
            .unwrap();
        assert_eq!(
            store.related_pks(&meta, "tags", &owner).await.unwrap(),
            vec![Value::Int(1), Value::Int(3)]
        );
        assert_eq!(store.relation_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_select_and_prefetch_related() {
        let store = InMemoryStore::new();
        seed_names(&store, &category(), &["news"]).await;
        seed_names(&store, &tag(), &["rust", "web"]).await;
        let meta = article();
        store
            .insert(
                &meta,
                Record::from_pairs([("title", Value::from("Hello")), ("category", Value::Int(1))]),
            )
            .await
            .unwrap();
        store
            .related_add(&meta, "tags", &Value::Int(1), &[Value::Int(2)])
            .await
            .unwrap();

        let query = Query::new("article")
            .select_related("category", "category")
            .prefetch_related("tags", "tag");
        let rows = store.fetch(&meta, &query).await.unwrap();
        let row = &rows[0];
        match row.related("category") {
            Some(Related::One(Some(cat))) => assert_eq!(cat.value("name"), &Value::from("news")),
            other => panic!("unexpected {other:?}"),
        }
        match row.related("tags") {
            Some(Related::Many(tags)) => {
                assert_eq!(tags.len(), 1);
                assert_eq!(tags[0].value("name"), &Value::from("web"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_drops_owned_links() {
        let store = InMemoryStore::new();
        let meta = article();
        store.insert(&meta, Record::new()).await.unwrap();
        store
            .related_add(&meta, "tags", &Value::Int(1), &[Value::Int(1)])
            .await
            .unwrap();
        store
            .delete(&meta, &Q::filter("id", Lookup::Exact(Value::Int(1))))
            .await
            .unwrap();
        assert!(store.links("article", "tags", &Value::Int(1)).is_empty());
    }
}

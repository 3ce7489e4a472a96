//! The persistence boundary.
//!
//! The admin engine never talks to a database directly. Everything it needs
//! (filtered and sliced fetches, counts, single-row reads, one insert or
//! save per write, predicate deletes, and batch edits of many-to-many link
//! sets) goes through the [`Store`] trait. Implementations decide how a
//! [`Query`] is evaluated; [`InMemoryStore`](crate::memory::InMemoryStore)
//! is the reference implementation used by tests and the development server.

use async_trait::async_trait;

use amis_admin_core::AdminResult;

use crate::model::{ModelMeta, Record};
use crate::query::{Lookup, Query, Q};
use crate::value::Value;

/// Asynchronous access to stored models.
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the rows matching `query`, ordered, sliced, and with the
    /// requested relations attached.
    async fn fetch(&self, meta: &ModelMeta, query: &Query) -> AdminResult<Vec<Record>>;

    /// Counts the rows matching `query`'s filter. Slicing is ignored.
    async fn count(&self, meta: &ModelMeta, query: &Query) -> AdminResult<usize>;

    /// Inserts a new row and returns it with its primary key assigned.
    async fn insert(&self, meta: &ModelMeta, record: Record) -> AdminResult<Record>;

    /// Overwrites the stored row with the same primary key.
    async fn save(&self, meta: &ModelMeta, record: &Record) -> AdminResult<()>;

    /// Deletes every row matching `filter` and returns how many were removed.
    async fn delete(&self, meta: &ModelMeta, filter: &Q) -> AdminResult<usize>;

    /// Returns the primary keys currently linked to `owner` through `field`.
    async fn related_pks(&self, meta: &ModelMeta, field: &str, owner: &Value)
        -> AdminResult<Vec<Value>>;

    /// Links `targets` to `owner` in one batch. Already-linked keys are kept once.
    async fn related_add(
        &self,
        meta: &ModelMeta,
        field: &str,
        owner: &Value,
        targets: &[Value],
    ) -> AdminResult<()>;

    /// Unlinks `targets` from `owner` in one batch.
    async fn related_remove(
        &self,
        meta: &ModelMeta,
        field: &str,
        owner: &Value,
        targets: &[Value],
    ) -> AdminResult<()>;

    /// Fetches one row by primary key.
    async fn get(&self, meta: &ModelMeta, pk: &Value) -> AdminResult<Option<Record>> {
        let query = Query::new(&meta.name)
            .filter(Q::filter(&meta.pk, Lookup::Exact(pk.clone())))
            .limit(1);
        Ok(self.fetch(meta, &query).await?.into_iter().next())
    }
}

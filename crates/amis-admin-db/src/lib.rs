//! # amis-admin-db
//!
//! Model metadata and the persistence boundary used by the admin engine.
//!
//! ## Modules
//!
//! - [`value`] - Storage [`Value`] enum
//! - [`fields`] - [`FieldType`] and [`FieldDef`]
//! - [`model`] - [`ModelMeta`], [`ModelCatalog`], and [`Record`]
//! - [`query`] - Lookups, [`Q`] objects, and the [`Query`] builder
//! - [`store`] - The async [`Store`] trait
//! - [`memory`] - [`InMemoryStore`], a thread-safe reference store

// result_large_err: AdminError is the crate-wide error type and should be used consistently
#![allow(clippy::result_large_err)]

pub mod fields;
pub mod memory;
pub mod model;
pub mod query;
pub mod store;
pub mod value;

pub use fields::{EnumMember, FieldDef, FieldDefault, FieldType};
pub use memory::{InMemoryStore, StoreCall};
pub use model::{ModelCatalog, ModelMeta, Record, Related};
pub use query::{Lookup, Query, Q};
pub use store::Store;
pub use value::Value;

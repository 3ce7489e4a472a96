//! # amis-admin-rs
//!
//! Schema-driven admin panels for the amis frontend.
//!
//! This is the meta-crate that re-exports all sub-crates. Depend on
//! `amis-admin-rs` for the whole toolkit, or on individual crates for
//! finer-grained control.
//!
//! ```rust
//! use std::sync::Arc;
//! use amis_admin_rs::prelude::*;
//!
//! let mut catalog = ModelCatalog::new();
//! catalog
//!     .register(ModelMeta::new("tag").field(FieldDef::new("name", FieldType::ShortText)))
//!     .unwrap();
//! let settings = Arc::new(Settings::default());
//! let engine = ModelAdminEngine::new(
//!     ModelAdmin::new("tag"),
//!     Arc::new(catalog),
//!     Arc::new(InMemoryStore::new()),
//!     Arc::clone(&settings),
//! )
//! .unwrap();
//!
//! let mut site = AdminSite::new(settings);
//! site.register(engine).unwrap();
//! let _router = site.into_router();
//! ```

/// Errors, settings, and logging.
pub use amis_admin_core as core;

/// Values, model metadata, queries, and the store boundary.
pub use amis_admin_db as db;

/// Codecs, field controls, relations, the engine, and the router.
pub use amis_admin as admin;

/// Management commands (CLI).
#[cfg(feature = "cli")]
pub use amis_admin_cli as cli;

pub use axum;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most sites need.
pub mod prelude {
    pub use amis_admin::{
        AdminSite, ControlKind, FieldControl, ModelAdmin, ModelAdminEngine, Operation, SiteConfig,
    };
    pub use amis_admin_core::{AdminError, AdminResult, Settings};
    pub use amis_admin_db::{
        FieldDef, FieldType, InMemoryStore, ModelCatalog, ModelMeta, Record, Store, Value,
    };
}

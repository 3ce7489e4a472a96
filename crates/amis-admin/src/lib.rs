//! # amis-admin
//!
//! Generates amis admin pages and generic CRUD endpoints for typed models.
//!
//! ## Modules
//!
//! - [`label`] - `label(description):placeholder` parsing
//! - [`codec`] - [`ValueCodec`], wire/storage conversion per field kind
//! - [`amis`] - Form item, table column, and select option descriptors
//! - [`relation`] - [`RelationResolver`]: option lookups and link-set reconciliation
//! - [`control`] - [`FieldControl`] with memoized edit, read, and inline descriptors
//! - [`registry`] - [`FieldRegistry`], the per-resource control cache
//! - [`model_admin`] - [`ModelAdmin`] resource configuration
//! - [`engine`] - [`ModelAdminEngine`], list/read/create/update/patch/delete/options
//! - [`schema`] - amis page schema
//! - [`api`] - Response envelopes
//! - [`site`] - [`AdminSite`] registry and axum router
//! - [`config`] - Site TOML loading

// result_large_err: AdminError is the crate-wide error type and should be used consistently
#![allow(clippy::result_large_err)]

pub mod amis;
pub mod api;
pub mod codec;
pub mod config;
pub mod control;
pub mod engine;
pub mod label;
pub mod model_admin;
pub mod registry;
pub mod relation;
pub mod schema;
pub mod site;

pub use codec::ValueCodec;
pub use config::SiteConfig;
pub use control::{ControlKind, FieldControl};
pub use engine::{ListPage, ListParams, ModelAdminEngine};
pub use model_admin::{ModelAdmin, Operation};
pub use registry::{FieldRegistry, PK_FIELD};
pub use relation::{Cardinality, OptionsPage, OptionsRequest, RelationPlan, RelationResolver};
pub use site::AdminSite;

//! # amis-admin-core
//!
//! Error taxonomy, settings, and logging shared by the amis-admin crates.
//!
//! ## Modules
//!
//! - [`error`] - [`AdminError`], per-field [`ValidationError`] and [`FieldError`]
//! - [`settings`] - Site settings with defaults
//! - [`settings_loader`] - TOML/JSON loading and environment overrides
//! - [`logging`] - Tracing subscriber setup and operation spans

// result_large_err: AdminError is the crate-wide error type and should be used consistently
#![allow(clippy::result_large_err)]

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{AdminError, AdminResult, FieldError, ValidationError};
pub use settings::Settings;

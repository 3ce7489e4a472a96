//! # amis-admin-cli
//!
//! Management commands for amis-admin sites.
//!
//! - [`command`] - the [`ManagementCommand`] trait, [`CommandRegistry`] and
//!   the loaded [`Project`]
//! - [`commands`] - built-in `runserver`, `check` and `schema`
//!
//! ```rust
//! use amis_admin_cli::command::CommandRegistry;
//! use amis_admin_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//! assert_eq!(registry.list_commands(), vec!["check", "runserver", "schema"]);
//! ```

// result_large_err: AdminError is the workspace-wide error type
#![allow(clippy::result_large_err)]

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand, Project};

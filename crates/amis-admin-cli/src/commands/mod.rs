//! Built-in management commands.

pub mod check;
pub mod runserver;
pub mod schema;

pub use check::CheckCommand;
pub use runserver::RunserverCommand;
pub use schema::SchemaCommand;

use crate::command::CommandRegistry;

/// Registers `check`, `runserver` and `schema`.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(RunserverCommand));
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(SchemaCommand));
}

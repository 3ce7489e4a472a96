//! Management command framework.
//!
//! [`ManagementCommand`] defines one subcommand of the `amis-admin` binary and
//! [`CommandRegistry`] collects them into a `clap` application. Every command
//! runs against a loaded [`Project`]: the parsed site document plus the
//! settings resolved from it.
//!
//! ## Defining a Custom Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use amis_admin_cli::command::{ManagementCommand, Project};
//! use amis_admin_core::AdminError;
//!
//! struct ResourcesCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for ResourcesCommand {
//!     fn name(&self) -> &str { "resources" }
//!     fn help(&self) -> &str { "List the configured resources" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         project: &Project,
//!     ) -> Result<(), AdminError> {
//!         for model in &project.config.models {
//!             println!("{}", model.name);
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use amis_admin::{AdminSite, SiteConfig};
use amis_admin_core::{AdminError, AdminResult, Settings};
use amis_admin_db::{InMemoryStore, Store};

/// Default location of the site document.
pub const DEFAULT_CONFIG: &str = "site.toml";

/// A loaded site document and its resolved settings.
#[derive(Debug, Clone)]
pub struct Project {
    /// The parsed site document.
    pub config: SiteConfig,
    /// Defaults, then `[settings]`, then environment overrides.
    pub settings: Arc<Settings>,
}

impl Project {
    /// Reads the site document at `path`.
    pub fn load(path: impl AsRef<Path>) -> AdminResult<Self> {
        Self::from_config(SiteConfig::from_file(path)?)
    }

    /// Resolves the settings of an already parsed document.
    pub fn from_config(config: SiteConfig) -> AdminResult<Self> {
        let settings = Arc::new(config.settings()?);
        Ok(Self { config, settings })
    }

    /// Builds every declared resource over `store`.
    pub fn build_site(&self, store: Arc<dyn Store>) -> AdminResult<AdminSite> {
        self.config.build_with(store, Arc::clone(&self.settings))
    }

    /// Builds every declared resource over a fresh in-memory store.
    pub fn build_in_memory(&self) -> AdminResult<AdminSite> {
        self.build_site(Arc::new(InMemoryStore::new()))
    }
}

/// A subcommand of the `amis-admin` binary.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &str;

    /// One-line help text.
    fn help(&self) -> &str;

    /// Adds command-specific arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, project: &Project) -> Result<(), AdminError>;
}

/// Commands keyed by name.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// Returns the command registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Registered command names in sorted order.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level `clap` command with one subcommand per entry
    /// and a global `--config` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("amis-admin")
            .about("amis admin panel management utility")
            .subcommand_required(true)
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .short('c')
                    .global(true)
                    .default_value(DEFAULT_CONFIG)
                    .help("Path to the site TOML document"),
            );

        let mut entries: Vec<_> = self.commands.iter().collect();
        entries.sort_by_key(|(name, _)| (*name).clone());

        for (name, cmd) in entries {
            // clap wants &'static str names; commands are registered once at startup.
            let static_name: &'static str = Box::leak(name.clone().into_boxed_str());
            let subcmd = clap::Command::new(static_name).about(cmd.help().to_string());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Dispatches to the subcommand named in `matches`.
    pub async fn execute(&self, matches: &clap::ArgMatches, project: &Project) -> Result<(), AdminError> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| AdminError::Configuration("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| AdminError::Configuration(format!("Unknown command: {name}")))?;

        cmd.handle(sub_matches, project).await
    }
}

/// The `--config` value, looked up on the subcommand first.
pub fn config_path(matches: &clap::ArgMatches) -> &str {
    matches
        .subcommand()
        .and_then(|(_, sub)| sub.get_one::<String>("config"))
        .or_else(|| matches.get_one::<String>("config"))
        .map_or(DEFAULT_CONFIG, String::as_str)
}

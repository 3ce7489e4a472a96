//! The `amis-admin` binary.

use std::process::ExitCode;

use amis_admin_cli::command::{config_path, CommandRegistry, Project};
use amis_admin_cli::commands::register_builtin_commands;
use amis_admin_core::logging::setup_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry.build_cli().get_matches();

    let project = match Project::load(config_path(&matches)) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&project.settings);

    match registry.execute(&matches, &project).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

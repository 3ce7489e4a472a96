//! The `runserver` management command.
//!
//! Builds the site over an in-memory store and serves it with axum until
//! Ctrl-C.

use async_trait::async_trait;
use tokio::net::TcpListener;

use amis_admin_core::AdminError;

use crate::command::{ManagementCommand, Project};
use crate::commands::check::{run_checks, CheckLevel};

/// Starts the admin server.
///
/// Binds to `127.0.0.1:8000` unless `--host` or `--port` say otherwise.
/// Refuses to start when `check` would report an error.
pub struct RunserverCommand;

/// The `host:port` pair from the parsed arguments.
pub fn bind_address(matches: &clap::ArgMatches) -> String {
    let host = matches
        .get_one::<String>("host")
        .map_or("127.0.0.1", String::as_str);
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8000);
    format!("{host}:{port}")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Ctrl-C handler unavailable; stop the process to exit");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Serve the admin API and page schemas"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("host")
                .long("host")
                .default_value("127.0.0.1")
                .help("Host to bind to"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .default_value("8000")
                .value_parser(clap::value_parser!(u16))
                .help("Port to bind to"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, project: &Project) -> Result<(), AdminError> {
        if let Some(error) = run_checks(project)
            .into_iter()
            .find(|m| m.level >= CheckLevel::Error)
        {
            return Err(AdminError::Configuration(format!("{} ({})", error.msg, error.id)));
        }

        let site = project.build_in_memory()?;
        let resources = site.len();
        let router = site.into_router();
        let addr = bind_address(matches);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AdminError::Configuration(format!("Cannot bind {addr}: {e}")))?;
        tracing::info!(
            "Serving {resources} resource(s) at http://{addr}{}/ (debug={})",
            project.settings.api_prefix.trim_end_matches('/'),
            project.settings.debug
        );
        tracing::warn!("Rows are kept in memory and lost on exit");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AdminError::Configuration(format!("Server error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use amis_admin::SiteConfig;

    use super::*;
    use crate::command::CommandRegistry;

    fn matches(args: &[&str]) -> clap::ArgMatches {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(RunserverCommand));
        let matches = registry
            .build_cli()
            .try_get_matches_from(args.iter().copied())
            .unwrap();
        let sub = matches.subcommand().unwrap().1.clone();
        sub
    }

    #[test]
    fn test_bind_address_defaults() {
        assert_eq!(bind_address(&matches(&["amis-admin", "runserver"])), "127.0.0.1:8000");
        assert_eq!(
            bind_address(&matches(&["amis-admin", "runserver", "--host", "0.0.0.0", "--port", "9000"])),
            "0.0.0.0:9000"
        );
    }

    #[test]
    fn test_port_must_be_numeric() {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(RunserverCommand));
        assert!(registry
            .build_cli()
            .try_get_matches_from(["amis-admin", "runserver", "--port", "http"])
            .is_err());
    }

    #[tokio::test]
    async fn test_refuses_broken_site() {
        let project = Project::from_config(
            SiteConfig::from_toml_str(
                r#"
                [[models]]
                name = "post"

                [[models.fields]]
                name = "body"
                type = "markdown"
                "#,
            )
            .unwrap(),
        )
        .unwrap();
        let err = RunserverCommand
            .handle(&matches(&["amis-admin", "runserver"]), &project)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Configuration(ref m) if m.contains("site.E001")));
    }
}

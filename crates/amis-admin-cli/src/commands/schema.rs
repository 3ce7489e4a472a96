//! The `schema` management command.
//!
//! Prints the amis page schema of one resource, or the site index when no
//! resource is named, as pretty JSON on stdout.

use async_trait::async_trait;

use amis_admin_core::{AdminError, AdminResult};

use crate::command::{ManagementCommand, Project};

/// Prints page schemas.
pub struct SchemaCommand;

/// Renders the schema of `resource`, or the site index.
pub fn render(project: &Project, resource: Option<&str>) -> AdminResult<String> {
    let site = project.build_in_memory()?;
    let json = match resource {
        Some(name) => site.lookup(name)?.page_schema()?.clone(),
        None => site.index(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

#[async_trait]
impl ManagementCommand for SchemaCommand {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn help(&self) -> &'static str {
        "Print the amis page schema of a resource"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("resource")
                .help("Resource name; prints the site index when omitted"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, project: &Project) -> Result<(), AdminError> {
        let resource = matches.get_one::<String>("resource").map(String::as_str);
        println!("{}", render(project, resource)?);
        Ok(())
    }
}

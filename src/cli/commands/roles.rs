use clap::Subcommand;
use serde_json::json;

use crate::api::format::iso_timestamp;
use crate::cli::utils::{output_list, output_success};
use crate::cli::{connect, OutputFormat};
use crate::database::models::Role;
use crate::database::Repository;
use crate::services::RoleService;

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "Insert the default roles (admin, user, moderator, viewer) if missing")]
    Seed,

    #[command(about = "List stored roles")]
    List,
}

pub async fn handle(cmd: RoleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = connect().await?;
    let roles = RoleService::new(Repository::new(database.store::<Role>()));
    let result = run(cmd, &roles, output_format).await;
    database.shutdown().await;
    result
}

async fn run(cmd: RoleCommands, roles: &RoleService, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::Seed => {
            let created = roles.seed_defaults().await?;
            let names: Vec<_> = created.iter().map(|r| r.as_str()).collect();
            let message = if names.is_empty() {
                "All default roles already exist".to_string()
            } else {
                format!("Created roles: {}", names.join(", "))
            };
            output_success(output_format, &message, Some(json!({ "created": names })))
        }
        RoleCommands::List => {
            let stored = roles.list().await?;
            let items = stored
                .iter()
                .map(|role| {
                    json!({
                        "id": role.id.map(|id| id.to_hex()),
                        "name": role.name,
                        "createdAt": role.created_at.map(iso_timestamp),
                    })
                })
                .collect::<Vec<_>>();
            let lines = stored
                .iter()
                .map(|role| {
                    let id = role.id.map(|id| id.to_hex()).unwrap_or_default();
                    format!("{:<10} {}", role.name.as_str(), id)
                })
                .collect::<Vec<_>>();
            output_list(output_format, json!(items), &lines, "No roles found")
        }
    }
}

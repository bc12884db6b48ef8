pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "videohub")]
#[command(about = "videohub CLI - database maintenance for the videohub API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check that the configured MongoDB server is reachable")]
    Ping,

    #[command(about = "Collection index management")]
    Indexes {
        #[command(subcommand)]
        cmd: commands::indexes::IndexCommands,
    },

    #[command(about = "Role catalog management")]
    Roles {
        #[command(subcommand)]
        cmd: commands::roles::RoleCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Connects using the same environment variables as the API server.
pub async fn connect() -> anyhow::Result<DatabaseManager> {
    let config = AppConfig::from_env()?;
    Ok(DatabaseManager::connect(&config.database).await?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Ping => commands::ping::handle(output_format).await,
        Commands::Indexes { cmd } => commands::indexes::handle(cmd, output_format).await,
        Commands::Roles { cmd } => commands::roles::handle(cmd, output_format).await,
    }
}

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};

#[derive(Subcommand)]
pub enum IndexCommands {
    #[command(about = "Create every declared index on every collection")]
    Sync,
}

pub async fn handle(cmd: IndexCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        IndexCommands::Sync => {
            let database = connect().await?;
            let synced = database.sync_indexes().await;
            database.shutdown().await;
            let synced = synced?;

            if matches!(output_format, OutputFormat::Text) {
                for name in &synced {
                    println!("  {}", name);
                }
            }
            output_success(
                output_format,
                &format!("Synchronized {} indexes", synced.len()),
                Some(json!({ "indexes": synced })),
            )
        }
    }
}

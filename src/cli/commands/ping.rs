use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::manager::redact_uri;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let database = DatabaseManager::connect(&config.database).await?;
    let name = database.database().name().to_string();
    database.shutdown().await;

    output_success(
        output_format,
        &format!("MongoDB reachable, using database '{}'", name),
        Some(json!({
            "database": name,
            "uri": redact_uri(&config.database.uri),
        })),
    )
}

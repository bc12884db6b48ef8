use std::process::ExitCode;

use tokio::net::TcpListener;
use videohub_api::config::AppConfig;
use videohub_api::database::DatabaseManager;
use videohub_api::server::{serve, shutdown_signal};
use videohub_api::{telemetry, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present so cargo run picks up MONGO_URI, PORT, etc.
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(config.environment);
    telemetry::install_panic_hook();
    tracing::info!("Starting videohub API in {} mode", config.environment);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;

    match database.sync_indexes().await {
        Ok(created) => tracing::info!(indexes = created.len(), "Indexes synchronized"),
        Err(e) => tracing::warn!("Index synchronization failed: {}", e),
    }

    let port = config.port;
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Server running on port {}", port);

    let state = AppState::from_database(config, &database);
    serve(listener, state, shutdown_signal()).await?;

    database.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

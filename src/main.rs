use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use multicab_inventory::cli::Cli;
use multicab_inventory::config::config;
use multicab_inventory::database::DatabaseManager;
use multicab_inventory::routes::app;
use multicab_inventory::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .init();

    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config.validate()?;
    tracing::info!("Starting Multicab Inventory API in {:?} mode", config.environment);
    if multicab_inventory::is_development!() && std::env::var("JWT_SECRET").is_err() {
        tracing::warn!("JWT_SECRET not set; signing tokens with the development secret");
    }

    let database_url = DatabaseManager::database_url()?;
    let pool = DatabaseManager::connect(&database_url, &config.database)
        .await
        .context("failed to connect to database")?;

    if cli.skip_migrations {
        tracing::info!("Skipping migrations");
    } else {
        DatabaseManager::migrate(&pool).await.context("failed to apply migrations")?;
    }

    let addr = cli.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Multicab Inventory API listening on http://{}", addr);

    axum::serve(listener, app(AppState::new(pool.clone()), config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

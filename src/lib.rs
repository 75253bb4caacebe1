pub mod api; // Report HTTP API
pub mod config;
pub mod dates;
pub mod db;
pub mod followup; // Follow-up status classification
pub mod models;
pub mod rdv; // Appointment reports
pub mod supersession;

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Runs the report server until Ctrl-C.
pub async fn run(config: config::AppConfig) -> Result<(), StartupError> {
    tracing::info!("Clinic follow-up starting v{}", config::APP_VERSION);

    // Applies pending migrations before the first request.
    drop(db::open_database(&config.db_path)?);
    tracing::info!(path = %config.db_path.display(), "Database ready");

    let ctx = api::ApiContext::from_config(&config);
    let server = api::serve(ctx, config.listen_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown().await;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Database(#[from] db::DatabaseError),
    #[error("Cannot start server: {0}")]
    Io(#[from] std::io::Error),
}

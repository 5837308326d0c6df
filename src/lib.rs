pub mod api; // Dashboard HTTP API + WebSocket push
pub mod assistant; // Tool-calling assistant flows
pub mod config;
pub mod core_state; // Shared state for API and background tasks
pub mod directory;
pub mod household;
pub mod location;
pub mod models;
pub mod monitoring; // Vitals loop, emergency countdown, reminders
pub mod notifications;
pub mod records;
pub mod seed;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::assistant::ollama::OllamaResolver;
use crate::monitoring::{MonitorHandle, ReminderHandle};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Assistant(#[from] assistant::AssistantError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Invalid seed data: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the monitoring core and the API server, then run until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::MonitorConfig::from_env()?;
    let resolver = Arc::new(OllamaResolver::new(&config.ollama_url, &config.ollama_model)?);
    let bind_addr = config.bind_addr;
    tracing::info!(
        policy = ?config.location_policy,
        countdown_secs = config.countdown_secs,
        model = %config.ollama_model,
        "Configuration loaded"
    );

    let core = Arc::new(core_state::CoreState::new(config)?);
    let mut monitor = MonitorHandle::spawn(Arc::clone(&core));
    let mut reminders = ReminderHandle::spawn(Arc::clone(&core));
    let server = api::start_api_server(Arc::clone(&core), resolver, bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "Dashboard API listening");

    let signal = tokio::signal::ctrl_c().await;

    tracing::info!("Shutting down");
    server.stop().await;
    reminders.shutdown();
    monitor.shutdown();
    signal.map_err(StartupError::Signal)
}

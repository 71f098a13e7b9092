pub mod advice; // Topic classification, templates, submission flow
pub mod api; // HTTP API
pub mod artifacts; // Micro-modules and LFA exports
pub mod channel; // WhatsApp webhook adaptation
pub mod config;
pub mod core_state; // Transport-agnostic state
pub mod dashboard; // DIET aggregates and trends
pub mod db;
pub mod models;
pub mod privacy; // Identity hashing and consent gate
pub mod render; // Slide decks

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Load configuration from the environment and serve until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::Config::from_env()?;
    let core = core_state::CoreState::from_config(config)?;
    core.initialize()?;

    api::serve_until_ctrl_c(Arc::new(core)).await?;
    Ok(())
}

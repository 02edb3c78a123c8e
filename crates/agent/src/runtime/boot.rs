//! Boot — logging init, config load, client construction.

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::live::CrmClient;
use crate::conf::AgentConfig;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elftail_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load config, validate it, prepare the spool directory, and build the
/// CRM client.
pub fn boot() -> Result<(AgentConfig, CrmClient), Box<dyn std::error::Error>> {
    info!("Starting elftail agent v0.0.1");

    let config = AgentConfig::load()?;
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!(
        "Loaded configuration: api_base_url={}, poll_interval={}s, spool_dir={}",
        config.api_base_url, config.poll_interval_secs, config.spool_dir
    );

    std::fs::create_dir_all(&config.spool_dir)?;

    let client = CrmClient::new(
        &config.api_base_url,
        &config.api_version,
        &config.api_token,
    );

    Ok((config, client))
}

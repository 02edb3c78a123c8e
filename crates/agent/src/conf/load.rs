//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::AgentConfig;

impl AgentConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("ELF_CONFIG_FILE")
            .unwrap_or_else(|_| "/etc/elftail/agent.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!(
                "Config file not found at {}, using environment variables",
                config_path
            );
            Self::from_env()
        };

        // Environment variables override file config for critical settings
        if let Ok(url) = std::env::var("ELF_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(version) = std::env::var("ELF_API_VERSION") {
            config.api_version = version;
        }
        if let Ok(dir) = std::env::var("ELF_SPOOL_DIR") {
            config.spool_dir = dir;
        }
        if let Ok(toggle) = std::env::var("ELF_CONTINUE_ON_FILE_ERROR") {
            if let Ok(parsed) = toggle.parse() {
                config.continue_on_file_error = parsed;
            }
        }
        // The token never comes from the file.
        config.api_token = std::env::var("ELF_API_TOKEN").unwrap_or_default();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AgentConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: std::env::var("ELF_API_BASE_URL").unwrap_or_default(),
            api_version: std::env::var("ELF_API_VERSION")
                .unwrap_or(defaults.api_version),
            api_token: std::env::var("ELF_API_TOKEN").unwrap_or_default(),
            spool_dir: std::env::var("ELF_SPOOL_DIR").unwrap_or(defaults.spool_dir),
            poll_interval_secs: std::env::var("ELF_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_secs),
            lookback_hours: std::env::var("ELF_LOOKBACK_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lookback_hours),
            continue_on_file_error: std::env::var("ELF_CONTINUE_ON_FILE_ERROR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.continue_on_file_error),
            queue_capacity: std::env::var("ELF_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.queue_capacity),
        }
    }
}

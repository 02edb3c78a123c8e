//! Model — agent configuration schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// CRM instance base URL, e.g. `https://acme.my.crm.example`.
    pub api_base_url: String,
    pub api_version: String,
    /// Bearer token. Environment only (`ELF_API_TOKEN`), never the file.
    #[serde(skip)]
    pub api_token: String,
    /// Directory for disposable download spool buffers.
    pub spool_dir: String,
    pub poll_interval_secs: u64,
    /// How far back the first descriptor query reaches.
    pub lookback_hours: i64,
    /// Whether one failed file aborts the whole batch.
    pub continue_on_file_error: bool,
    pub queue_capacity: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            api_version: "52.0".to_string(),
            api_token: String::new(),
            spool_dir: "/var/spool/elftail".to_string(),
            poll_interval_secs: 300,
            lookback_hours: 24,
            continue_on_file_error: true,
            queue_capacity: 1024,
        }
    }
}

impl AgentConfig {
    /// Validate that required values are present and sane.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_base_url.is_empty() {
            return Err("api_base_url is not set".to_string());
        }
        if self.api_token.is_empty() {
            return Err("ELF_API_TOKEN is not set".to_string());
        }
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be at least 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            api_base_url = "https://acme.my.crm.example"
            poll_interval_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://acme.my.crm.example");
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.lookback_hours, 24);
        assert!(config.continue_on_file_error);
        assert!(config.api_token.is_empty());
    }

    #[test]
    fn test_validate_requires_url_and_token() {
        let mut config = AgentConfig::default();
        assert!(config.validate().is_err());

        config.api_base_url = "https://acme.my.crm.example".to_string();
        assert!(config.validate().is_err());

        config.api_token = "sekrit".to_string();
        assert!(config.validate().is_ok());
    }
}

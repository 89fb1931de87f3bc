//! Service configuration

use anyhow::Result;
use serde::Deserialize;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding model artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// API key required on prediction endpoints; unset disables the check
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_model_dir() -> String {
    "models".to_string()
}

impl ApiConfig {
    /// Load configuration from ROI_-prefixed environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ROI"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ApiConfig {
            port: default_port(),
            model_dir: default_model_dir(),
            api_key: None,
        }))
    }
}

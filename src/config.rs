use std::fs;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::policy::Offer;
use crate::process::Side;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Empty logs to stdout only
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    /// `hourly`, `daily` or anything else for a single file
    pub rotation: String,
    pub node: NodeConfig,
    /// Offers published at start-up
    #[serde(default)]
    pub offers: Vec<Offer>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NodeConfig {
    pub role: Side,
    pub participant_id: String,
    pub host: String,
    pub port: u16,
    /// Base URL counterparts use to reach this node; derived from host/port if unset
    #[serde(default)]
    pub callback_address: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl NodeConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn callback_address(&self) -> String {
        match &self.callback_address {
            Some(address) if !address.is_empty() => address.trim_end_matches('/').to_string(),
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

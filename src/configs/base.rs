use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    pub const CANDIDATES: [&'static str; 2] = ["config.toml", "config.default.toml"];

    pub fn load() -> AnyResult<Self> {
        let config_path = Self::CANDIDATES
            .iter()
            .find(|p| std::path::Path::new(p).exists())
            .ok_or("config.toml or config.default.toml not found")?;

        // The subscriber is not up yet.
        println!("Loading configuration from: {}", config_path);
        Self::from_file(config_path)
    }

    pub fn from_file(path: &str) -> AnyResult<Self> {
        let config_str = std::fs::read_to_string(path)?;
        if config_str.trim().is_empty() {
            return Err(format!("{} is empty", path).into());
        }
        Self::parse(&config_str)
    }

    pub fn parse(raw: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }
}

use serde::{Deserialize, Serialize};

use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub http: HttpConfig,
  #[serde(default)]
  pub stream: StreamConfig,
  #[serde(default)]
  pub plugins: PluginsConfig,
  #[serde(default)]
  pub rtve: RtveConfig,
  #[serde(default)]
  pub ss365: Ss365Config,
  pub logging: Option<LoggingConfig>,
}

use crate::common::types::AnyResult;

impl Config {
  /// Reads `config.toml`, then `config.default.toml`; built-in defaults when
  /// neither exists.
  pub fn load() -> AnyResult<Self> {
    let config_path = if std::path::Path::new("config.toml").exists() {
      "config.toml"
    } else if std::path::Path::new("config.default.toml").exists() {
      "config.default.toml"
    } else {
      return Ok(Self::default());
    };

    // stdout may carry stream data, and logging is not up yet
    eprintln!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.is_empty() {
      return Err(format!("{} is empty", config_path).into());
    }

    Self::parse(&config_str)
  }

  pub fn parse(config_str: &str) -> AnyResult<Self> {
    let config: Config = toml::from_str(config_str)?;
    Ok(config)
  }
}

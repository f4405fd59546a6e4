use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub recsys: RecsysConfig,
}

/// `APP_*` environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// `RECSYS_*` environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecsysConfig {
    /// Personal recommendations snapshot loaded at startup
    #[serde(default)]
    pub personal_path: Option<PathBuf>,
    /// Popularity snapshot loaded at startup
    #[serde(default)]
    pub default_path: Option<PathBuf>,
    /// Item-to-item similarity model artifact
    #[serde(default)]
    pub similarity_path: Option<PathBuf>,
    /// Item display metadata
    #[serde(default)]
    pub items_path: Option<PathBuf>,
    #[serde(default = "default_k")]
    pub default_k: usize,
    #[serde(default = "default_n")]
    pub default_n: usize,
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    #[serde(default = "default_max_n")]
    pub max_n: usize,
    /// History cap per user
    #[serde(default = "default_max_events_per_user")]
    pub max_events_per_user: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RecsysConfig {
    fn default() -> Self {
        Self {
            personal_path: None,
            default_path: None,
            similarity_path: None,
            items_path: None,
            default_k: default_k(),
            default_n: default_n(),
            max_k: default_max_k(),
            max_n: default_max_n(),
            max_events_per_user: default_max_events_per_user(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            app: envy::prefixed("APP_").from_env::<AppConfig>()?,
            recsys: envy::prefixed("RECSYS_").from_env::<RecsysConfig>()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let recsys = &self.recsys;
        if recsys.max_events_per_user == 0 {
            return Err(AppError::Configuration(
                "RECSYS_MAX_EVENTS_PER_USER must be at least 1".to_string(),
            ));
        }
        if recsys.default_k > recsys.max_k {
            return Err(AppError::Configuration(format!(
                "RECSYS_DEFAULT_K ({}) exceeds RECSYS_MAX_K ({})",
                recsys.default_k, recsys.max_k
            )));
        }
        if recsys.default_n > recsys.max_n {
            return Err(AppError::Configuration(format!(
                "RECSYS_DEFAULT_N ({}) exceeds RECSYS_MAX_N ({})",
                recsys.default_n, recsys.max_n
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn default_env() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_k() -> usize {
    100
}

fn default_n() -> usize {
    10
}

fn default_max_k() -> usize {
    1000
}

fn default_max_n() -> usize {
    100
}

fn default_max_events_per_user() -> usize {
    10
}

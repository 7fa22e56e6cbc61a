// Runtime configuration
// Defaults, then an optional TOML file named by CAMP_CONFIG, then env overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_ENV: &str = "CAMP_CONFIG";
pub const DATABASE_ENV: &str = "DB_URI";
pub const BIND_ENV: &str = "BIND_ADDR";
pub const LOG_ENV: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path or `sqlite:///` URL of the database
    pub database_url: String,
    pub bind_addr: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "app.db".to_string(),
            bind_addr: "127.0.0.1:5555".to_string(),
            log_filter: "camp_signups=info".to_string(),
        }
    }
}

impl Config {
    /// Load from `CAMP_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Replace fields whose variable is set and non-empty.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = set(DATABASE_ENV) {
            self.database_url = url;
        }
        if let Some(addr) = set(BIND_ENV) {
            self.bind_addr = addr;
        }
        if let Some(filter) = set(LOG_ENV) {
            self.log_filter = filter;
        }
    }
}

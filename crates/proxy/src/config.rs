// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy daemon configuration.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Default config file location.
const CONFIG_PATH: &str = "/etc/libops/proxyd.toml";

/// Env var overriding the config file location.
const CONFIG_ENV: &str = "LIBOPS_PROXYD_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Port every site controller listens on.
    pub port: u16,
    /// Bearer token presented to site controllers.
    pub token: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { port: 8090, token: String::new() }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub state_dir: PathBuf,
    pub listen_addr: String,
    pub admin: AdminConfig,
    pub controller: ControllerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            listen_addr: "127.0.0.1:8086".to_string(),
            admin: AdminConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default or env-overridden path.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.clone(), source })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("proxyd.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("proxyd.log")
    }
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("libops")
        .join("proxyd")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

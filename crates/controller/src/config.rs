// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site controller configuration.
//!
//! Written to the VM at provision time (`/etc/libops/sited.toml`); the
//! site id and admin endpoint are the only fields without usable defaults.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Default config file location.
const CONFIG_PATH: &str = "/etc/libops/sited.toml";

/// Env var overriding the config file location.
const CONFIG_ENV: &str = "LIBOPS_SITED_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub base_url: String,
    /// Metadata endpoint issuing short-lived service-account tokens.
    pub metadata_token_url: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            metadata_token_url:
                "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Sustained requests per second on reconcile endpoints.
    pub per_second: u32,
    /// Burst capacity above the sustained rate.
    pub burst: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self { per_second: 10, burst: 5 }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// This VM's site id in the admin store.
    pub site_id: i64,
    pub listen_addr: String,
    pub state_dir: PathBuf,
    /// Bearer token required on reconcile endpoints; empty disables auth
    /// (development only).
    pub auth_token: String,
    pub admin: AdminConfig,
    pub rate: RateConfig,

    /// Root of managed member homes.
    pub home_root: PathBuf,
    /// Secondary group granting container exec rights to members.
    pub exec_group: String,
    /// Rendered secrets env file.
    pub secrets_path: PathBuf,
    /// Name of the managed packet-filter chain.
    pub firewall_chain: String,

    pub periodic_hours: u64,
    pub checkin_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: 0,
            listen_addr: "0.0.0.0:8090".to_string(),
            state_dir: default_state_dir(),
            auth_token: String::new(),
            admin: AdminConfig::default(),
            rate: RateConfig::default(),
            home_root: PathBuf::from("/home"),
            exec_group: "docker".to_string(),
            secrets_path: PathBuf::from("/etc/libops/secrets.env"),
            firewall_chain: "LIBOPS-FIREWALL".to_string(),
            periodic_hours: 12,
            checkin_secs: 60,
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
        self.state_dir.join("sited.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("sited.log")
    }
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("libops")
        .join("sited")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

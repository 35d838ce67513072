// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher daemon configuration.
//!
//! Loaded from a TOML file (`LIBOPS_DISPATCHERD_CONFIG` or
//! `/etc/libops/dispatcherd.toml`); every field has a default so the daemon
//! also starts bare for development.

use libops_core::Scope;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default config file location.
const CONFIG_PATH: &str = "/etc/libops/dispatcherd.toml";

/// Env var overriding the config file location.
const CONFIG_ENV: &str = "LIBOPS_DISPATCHERD_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

/// Timing and batching knobs of the dispatch loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub poll_interval_secs: u64,
    pub batch_size: usize,
    pub max_retries: u32,
    pub stale_after_secs: u64,
    pub debounce_org_ms: u64,
    pub debounce_project_ms: u64,
    pub debounce_site_ms: u64,
    pub gc_retain_days: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            batch_size: 10,
            max_retries: 5,
            stale_after_secs: 300,
            debounce_org_ms: 2_000,
            debounce_project_ms: 5_000,
            debounce_site_ms: 5_000,
            gc_retain_days: 14,
        }
    }
}

impl Tuning {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn gc_retain(&self) -> Duration {
        Duration::from_secs(self.gc_retain_days * 24 * 3600)
    }

    /// Debounce window for a group's effective scope.
    ///
    /// Organization events settle faster: a broad reconciliation is already
    /// coming, so there is less to gain from waiting for more of them.
    pub fn debounce_window_ms(&self, scope: Scope) -> u64 {
        match scope {
            Scope::Organization => self.debounce_org_ms,
            Scope::Project => self.debounce_project_ms,
            Scope::Site => self.debounce_site_ms,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BusConfig {
    pub topic_url: String,
    pub subscription: String,
}

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root state directory (WAL, snapshot, lock, log).
    pub state_dir: PathBuf,
    /// Ingest + health listen address.
    pub listen_addr: String,
    /// Bearer token required on the ingest endpoint; empty disables auth
    /// (development only).
    pub ingest_token: String,
    pub admin: AdminConfig,
    pub bus: BusConfig,
    pub dispatcher: Tuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            listen_addr: "127.0.0.1:8085".to_string(),
            ingest_token: String::new(),
            admin: AdminConfig::default(),
            bus: BusConfig::default(),
            dispatcher: Tuning::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default or env-overridden path.
    ///
    /// A missing file yields the defaults; a present but malformed file is
    /// an error (silent fallback would mask typos in production).
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
        self.state_dir.join("dispatcherd.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("dispatcherd.log")
    }
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("libops")
        .join("dispatcherd")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

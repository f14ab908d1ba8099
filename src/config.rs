//! Configuration handling for the console

use crate::state::wizard::DEFAULT_SUBMIT_TIMEOUT;
use crate::state::{FormPolicy, DEFAULT_CURRENCY, DEFAULT_MAX_AMOUNT};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the simulated back-office latency
pub const LATENCY_ENV: &str = "RICASH_BACKEND_LATENCY_MS";

const DEFAULT_BACKEND_LATENCY_MS: u64 = 250;

/// User configuration for the console. Unset keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RicashConfig {
    /// Ceiling for a single transfer
    pub max_amount: Option<u64>,
    /// Bound on a creation call, in seconds
    pub submit_timeout_secs: Option<u64>,
    /// Simulated back-office latency, in milliseconds
    pub backend_latency_ms: Option<u64>,
    /// Currency of new transfers
    pub currency: Option<String>,
}

impl RicashConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "ricash", "ricash-tui")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, then apply the environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::var(LATENCY_ENV).ok().as_deref());
        Ok(config)
    }

    /// Load from a given file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self, latency_ms: Option<&str>) {
        let Some(raw) = latency_ms else {
            return;
        };
        match raw.trim().parse() {
            Ok(ms) => self.backend_latency_ms = Some(ms),
            Err(_) => tracing::warn!("Ignoring {LATENCY_ENV}={raw:?}: not a number of milliseconds"),
        }
    }

    pub fn max_amount(&self) -> u64 {
        self.max_amount.unwrap_or(DEFAULT_MAX_AMOUNT)
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout_secs
            .map_or(DEFAULT_SUBMIT_TIMEOUT, Duration::from_secs)
    }

    pub fn backend_latency(&self) -> Duration {
        Duration::from_millis(self.backend_latency_ms.unwrap_or(DEFAULT_BACKEND_LATENCY_MS))
    }

    /// Limits handed to every new wizard
    pub fn policy(&self) -> FormPolicy {
        FormPolicy {
            max_amount: self.max_amount(),
            currency: self.currency().to_string(),
        }
    }
}

//! Configuration Management
//!
//! Handles persistent configuration storage for tazvm.

use crate::resource::{FleetConfig, Scope, DEFAULT_POLL_INTERVAL};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Last used subscription scope (id, display name, or "all")
    #[serde(default)]
    pub subscription: Option<String>,
    /// Seconds between automatic polls
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    /// Delay before re-checking a VM after a dispatch
    #[serde(default)]
    pub recheck_delay_ms: Option<u64>,
    /// Timeout for a single provider call
    #[serde(default)]
    pub call_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config directory, shared with the log file
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tazvm"))
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse a config document, falling back to defaults when invalid
    pub fn from_json(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config file: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective scope (CLI > config > all)
    pub fn effective_scope(&self, cli: Option<&str>) -> Scope {
        cli.or(self.subscription.as_deref())
            .map(Scope::parse)
            .unwrap_or_default()
    }

    /// Get effective poll interval (CLI > config > default)
    pub fn effective_poll_interval(&self, cli_secs: Option<u64>) -> Duration {
        cli_secs
            .or(self.poll_interval_secs)
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Build the core settings (CLI > config > default)
    pub fn fleet_config(&self, cli_timeout_secs: Option<u64>) -> FleetConfig {
        let defaults = FleetConfig::default();
        FleetConfig {
            call_timeout: cli_timeout_secs
                .or(self.call_timeout_secs)
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.call_timeout),
            recheck_delay: self
                .recheck_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.recheck_delay),
            ..defaults
        }
    }

    /// Set scope and save
    pub fn set_scope(&mut self, scope: &Scope) -> Result<()> {
        self.subscription = Some(scope.label().to_string());
        self.save()
    }
}

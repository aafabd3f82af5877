//! Configuration management for guardian.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (GUARDIAN_*)
//! 2. Config file (GUARDIAN_CONFIG, or the platform config dir's config.toml)
//! 3. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use guardian_core::conversation::DEFAULT_GREETING;
use guardian_core::{ControllerOptions, ZoomDefaults};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::GuardianError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Supply-chain data backend
    pub backend: BackendConfig,

    /// Conversational agent backend
    pub agent: AgentConfig,

    /// Snapshot refresh loop
    pub refresh: RefreshConfig,

    /// Map camera defaults
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL serving /shipments and /network/*
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the agent service
    pub url: String,

    /// Agent application name used in session and run requests
    pub app_name: String,

    /// User id the session is created for
    pub user_id: String,

    /// First agent message after the session is created (empty disables it)
    pub greeting: String,

    /// Per-request timeout in seconds (agent runs can be slow)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Snapshot refresh interval in milliseconds
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub shipment_zoom: f64,
    pub node_zoom: f64,
    pub disruption_zoom: f64,
    /// Zoom for coordinate directives without one
    pub coordinate_zoom: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            app_name: "supply_agent".to_string(),
            user_id: "user_default".to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_ms: 2000 }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        let zoom = ZoomDefaults::default();
        Self {
            shipment_zoom: zoom.shipment,
            node_zoom: zoom.node,
            disruption_zoom: zoom.disruption,
            coordinate_zoom: guardian_core::types::DEFAULT_DIRECTIVE_ZOOM,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, falling back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Override settings from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GUARDIAN_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(url) = lookup("GUARDIAN_AGENT_URL") {
            self.agent.url = url;
        }
        if let Some(user_id) = lookup("GUARDIAN_USER_ID") {
            self.agent.user_id = user_id;
        }
        if let Some(ms) = lookup("GUARDIAN_REFRESH_MS") {
            self.refresh.interval_ms = ms.trim().parse().map_err(|_| {
                GuardianError::Config(format!("GUARDIAN_REFRESH_MS is not a number: {}", ms))
            })?;
        }
        Ok(())
    }

    /// Reject settings the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.refresh.interval_ms == 0 {
            return Err(GuardianError::Config("refresh.interval_ms must be > 0".into()).into());
        }
        if self.backend.timeout_secs == 0 {
            return Err(GuardianError::Config("backend.timeout_secs must be > 0".into()).into());
        }
        if self.agent.timeout_secs == 0 {
            return Err(GuardianError::Config("agent.timeout_secs must be > 0".into()).into());
        }
        if self.agent.user_id.trim().is_empty() {
            return Err(GuardianError::Config("agent.user_id must not be empty".into()).into());
        }
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("GUARDIAN_CONFIG") {
            PathBuf::from(path)
        } else if let Some(proj_dirs) = ProjectDirs::from("dev", "supply-guardian", "guardian") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".supply-guardian")
                .join("config.toml")
        }
    }

    pub fn zoom_defaults(&self) -> ZoomDefaults {
        ZoomDefaults {
            shipment: self.view.shipment_zoom,
            node: self.view.node_zoom,
            disruption: self.view.disruption_zoom,
        }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        let greeting = Some(self.agent.greeting.clone()).filter(|g| !g.trim().is_empty());
        ControllerOptions {
            user_id: self.agent.user_id.clone(),
            greeting,
            directive_zoom: self.view.coordinate_zoom,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.interval_ms)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.timeout_secs)
    }
}

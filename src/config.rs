//! Client configuration.
//!
//! Settings are read from `<config-dir>/retroboard.toml` and layered
//! (file → environment → CLI):
//!
//! ```toml
//! [server]
//! api_url = "http://localhost:8881"
//! ws_url = "ws://localhost:8881/ws"
//! request_timeout_secs = 10
//!
//! [sync]
//! reconnect_base_ms = 500
//! reconnect_ceiling_ms = 30000
//! ```
//!
//! When no WebSocket URL is configured anywhere it is derived from the API
//! URL (`http` → `ws`, `https` → `wss`, plus `/ws`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::ReconnectPolicy;
use crate::credentials::CredentialStore;

pub const CONFIG_FILE: &str = "retroboard.toml";
pub const API_URL_ENV: &str = "RETROBOARD_API_URL";
pub const WS_URL_ENV: &str = "RETROBOARD_WS_URL";

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Derived from `api_url` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8881".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ws_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Realtime channel reconnect backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSection {
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_ceiling_ms")]
    pub reconnect_ceiling_ms: u64,
}

fn default_reconnect_base_ms() -> u64 {
    500
}

fn default_reconnect_ceiling_ms() -> u64 {
    30_000
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_ceiling_ms: default_reconnect_ceiling_ms(),
        }
    }
}

/// The complete retroboard.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub sync: SyncSection,
}

impl RetroToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse retroboard.toml")
    }

    /// Load `retroboard.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize retroboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !has_scheme(&self.server.api_url, &["http://", "https://"]) {
            warnings.push(format!(
                "Invalid api_url '{}': should start with http:// or https://",
                self.server.api_url
            ));
        }
        if let Some(ref ws_url) = self.server.ws_url
            && !has_scheme(ws_url, &["ws://", "wss://"])
        {
            warnings.push(format!(
                "Invalid ws_url '{}': should start with ws:// or wss://",
                ws_url
            ));
        }
        if self.server.request_timeout_secs == 0 {
            warnings.push("request_timeout_secs is 0: every request would time out".to_string());
        }
        if self.sync.reconnect_base_ms == 0 {
            warnings.push("reconnect_base_ms is 0: reconnects retry after the 1 ms floor".to_string());
        }
        if self.sync.reconnect_base_ms > self.sync.reconnect_ceiling_ms {
            warnings.push(format!(
                "reconnect_base_ms ({}) exceeds reconnect_ceiling_ms ({})",
                self.sync.reconnect_base_ms, self.sync.reconnect_ceiling_ms
            ));
        }

        warnings
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

/// `http://host/api` → `ws://host/api/ws`.
pub fn derive_ws_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    let swapped = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    };
    format!("{swapped}/ws")
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
}

/// Resolved configuration used by every command.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub config_dir: PathBuf,
    pub toml: RetroToml,
    api_url: String,
    ws_url: String,
}

impl BoardConfig {
    /// `dirs::config_dir()/retroboard`.
    pub fn default_config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(base.join("retroboard"))
    }

    pub fn load(overrides: CliOverrides) -> Result<Self> {
        let config_dir = match overrides.config_dir {
            Some(dir) => dir,
            None => Self::default_config_dir()?,
        };
        let toml = RetroToml::load_or_default(&config_dir)?;

        let api_url = overrides
            .api_url
            .or_else(|| non_empty_env(API_URL_ENV))
            .unwrap_or_else(|| toml.server.api_url.clone())
            .trim_end_matches('/')
            .to_string();
        let ws_url = overrides
            .ws_url
            .or_else(|| non_empty_env(WS_URL_ENV))
            .or_else(|| toml.server.ws_url.clone())
            .unwrap_or_else(|| derive_ws_url(&api_url));

        Ok(Self {
            config_dir,
            toml,
            api_url,
            ws_url,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(&self.config_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.toml.server.request_timeout_secs)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            base: Duration::from_millis(self.toml.sync.reconnect_base_ms),
            ceiling: Duration::from_millis(self.toml.sync.reconnect_ceiling_ms),
        }
    }

    /// Validate the effective configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut effective = self.toml.clone();
        effective.server.api_url = self.api_url.clone();
        effective.server.ws_url = Some(self.ws_url.clone());
        effective.validate()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

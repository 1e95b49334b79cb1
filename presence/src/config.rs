//! Configuration for the presence daemon

use anyhow::Result;
use presence_visual::ModuleTables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Synchronization loop settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Native backend transport
    #[serde(default)]
    pub transport: TransportConfig,

    /// Visual propagation
    #[serde(default)]
    pub visual: VisualConfig,

    /// System metrics sampler
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Synchronization loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Poll interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Consecutive failed calls before the loop reports itself degraded
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            degraded_threshold: default_degraded_threshold(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Native backend transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Backend socket. Its presence on disk selects the native transport.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    /// Per-command timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Skip probing and always use the in-process engine
    #[serde(default)]
    pub force_fallback: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            request_timeout_ms: default_request_timeout_ms(),
            force_fallback: false,
        }
    }
}

impl TransportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Visual propagation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Stylesheet the daemon keeps in sync with the system state
    #[serde(default = "default_stylesheet_path")]
    pub stylesheet_path: PathBuf,

    /// Module whose glow and motion are published with every snapshot
    #[serde(default)]
    pub module: Option<String>,

    /// Per-module glow and motion tables
    #[serde(default)]
    pub modules: ModuleTables,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            stylesheet_path: default_stylesheet_path(),
            module: None,
            modules: ModuleTables::default(),
        }
    }
}

/// System metrics sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Feed CPU and memory readings into the persona
    #[serde(default)]
    pub enabled: bool,

    /// Sample interval in seconds
    #[serde(default = "default_sampler_interval")]
    pub interval_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_sampler_interval(),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions
fn default_interval_ms() -> u64 {
    100
}

fn default_degraded_threshold() -> u32 {
    5
}

fn default_socket_path() -> PathBuf {
    PathBuf::from(presence_bridge::paths::PERSONA_SOCKET)
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_stylesheet_path() -> PathBuf {
    PathBuf::from("/run/presence/presence.css")
}

fn default_sampler_interval() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PresenceConfig {
    /// Load configuration from file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

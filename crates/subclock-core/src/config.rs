//! SubClock configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SubClockError};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubClockConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl SubClockConfig {
    /// Load config from the default path (~/.subclock/config.toml).
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubClockError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SubClockError::Config(format!("Failed to parse config: {e}")))?;
        config.limits.validate()?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubClockError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        tracing::debug!("Config written to {}", path.display());
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the SubClock home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".subclock")
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 5000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Bounds applied to client-requested delivery frequencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
}

fn default_min_interval_secs() -> u64 { 5 }
fn default_max_interval_secs() -> u64 { 4 * 60 * 60 }

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
        }
    }
}

impl LimitsConfig {
    /// Whether `secs` falls inside the allowed range (inclusive).
    pub fn allows(&self, secs: u64) -> bool {
        (self.min_interval_secs..=self.max_interval_secs).contains(&secs)
    }

    fn validate(&self) -> Result<()> {
        if self.min_interval_secs == 0 {
            return Err(SubClockError::Config(
                "limits.min_interval_secs must be greater than zero".into(),
            ));
        }
        if self.min_interval_secs > self.max_interval_secs {
            return Err(SubClockError::Config(format!(
                "limits.min_interval_secs ({}) exceeds limits.max_interval_secs ({})",
                self.min_interval_secs, self.max_interval_secs
            )));
        }
        Ok(())
    }
}

/// Outbound notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Per-call timeout. Unset means a call may run for as long as the
    /// subscriber takes to answer, keeping its subscription paused.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!("subclock/", env!("CARGO_PKG_VERSION")).into()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

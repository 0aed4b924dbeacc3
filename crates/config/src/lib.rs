//! Configuration loading and validation for epgedit.
//!
//! Loads configuration from `~/.epgedit/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chrono::{FixedOffset, Offset, Utc};
use epgedit_core::{TimeSlot, TimeSlotTable, default_slots};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.epgedit/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP service settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where the schedule, rules, archive and draft live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rebuild and validation settings
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Maximum request body size in KiB.
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8200
}
fn default_body_limit_kb() -> usize {
    2048
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
            body_limit_kb: default_body_limit_kb(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" or "memory"
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Authoritative schedule, relative to `data_dir`.
    #[serde(default = "default_document")]
    pub document: PathBuf,

    #[serde(default = "default_placement_rules")]
    pub placement_rules: PathBuf,

    #[serde(default = "default_neighbour_rules")]
    pub neighbour_rules: PathBuf,

    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Where a schedule that failed validation is parked.
    #[serde(default = "default_draft")]
    pub draft: PathBuf,
}

fn default_backend() -> String {
    "file".into()
}
fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("data")
}
fn default_document() -> PathBuf {
    PathBuf::from("xmltv.xml")
}
fn default_placement_rules() -> PathBuf {
    PathBuf::from("rules/placement_rules.json")
}
fn default_neighbour_rules() -> PathBuf {
    PathBuf::from("rules/neighbour_rules.json")
}
fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}
fn default_draft() -> PathBuf {
    PathBuf::from("edited_inprogress.xml")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            document: default_document(),
            placement_rules: default_placement_rules(),
            neighbour_rules: default_neighbour_rules(),
            archive_dir: default_archive_dir(),
            draft: default_draft(),
        }
    }
}

impl StorageConfig {
    /// Resolve a configured path against `data_dir`. Absolute paths are kept.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn document_path(&self) -> PathBuf {
        self.resolve(&self.document)
    }

    pub fn placement_rules_path(&self) -> PathBuf {
        self.resolve(&self.placement_rules)
    }

    pub fn neighbour_rules_path(&self) -> PathBuf {
        self.resolve(&self.neighbour_rules)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.resolve(&self.archive_dir)
    }

    pub fn draft_path(&self) -> PathBuf {
        self.resolve(&self.draft)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Offset of the generation stamp written on rebuilt documents.
    #[serde(default = "default_generation_offset_minutes")]
    pub generation_offset_minutes: i32,

    /// Day-parts used when a submitted entry carries no slot.
    #[serde(default = "default_slots")]
    pub slots: Vec<TimeSlot>,
}

fn default_generation_offset_minutes() -> i32 {
    330
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            generation_offset_minutes: default_generation_offset_minutes(),
            slots: default_slots(),
        }
    }
}

impl ScheduleConfig {
    pub fn generation_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.generation_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn slot_table(&self) -> TimeSlotTable {
        TimeSlotTable::new(self.slots.clone())
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.epgedit/config.toml).
    ///
    /// Environment variables override the file:
    /// - `EPGEDIT_HOST`
    /// - `EPGEDIT_PORT`
    /// - `EPGEDIT_DATA_DIR`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `EPGEDIT_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("EPGEDIT_HOST") {
            self.gateway.host = host;
        }
        if let Some(port) = lookup("EPGEDIT_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("EPGEDIT_PORT is not a port number: '{port}'"))
            })?;
        }
        if let Some(dir) = lookup("EPGEDIT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".epgedit")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be non-zero".into()));
        }

        if !matches!(self.storage.backend.as_str(), "file" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "storage.backend must be \"file\" or \"memory\", got \"{}\"",
                self.storage.backend
            )));
        }

        if self.schedule.slots.is_empty() {
            return Err(ConfigError::ValidationError(
                "schedule.slots must name at least one slot".into(),
            ));
        }

        for (i, slot) in self.schedule.slots.iter().enumerate() {
            if self.schedule.slots[..i].iter().any(|s| s.name == slot.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate slot name '{}'",
                    slot.name
                )));
            }
        }

        if self.schedule.generation_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::ValidationError(
                "schedule.generation_offset_minutes must be within ±24h".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

//! Configuration resolution for Suguard.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/suguard/settings.json)
//! 3. Environment variables (highest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Suguard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub defaults: GrantDefaults,
}

/// Grant store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the grant database. `None` selects the per-user default.
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Security configuration for sensitive mutations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Require a re-authentication challenge before any grant mutation.
    #[serde(default)]
    pub require_reauth: bool,
}

/// Default flags applied to freshly-synthesized grant entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrantDefaults {
    /// Surface a notification when a subject exercises elevated access.
    pub notify: bool,
    /// Log elevated-access usage.
    pub logging: bool,
}

impl Default for GrantDefaults {
    fn default() -> Self {
        Self {
            notify: true,
            logging: true,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(global_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    let global = global_path
        .map(Path::to_path_buf)
        .or_else(global_config_path);
    if let Some(path) = global {
        if path.exists() {
            config = load_config_file(&path)?;
        }
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("suguard").join("settings.json"))
}

/// Get the default grant database path.
pub fn database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("suguard").join("grants.db"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("SUGUARD_DATABASE_PATH") {
        config.store.database_path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("SUGUARD_LOG_LEVEL") {
        config.store.log_level = val;
    }
    if let Ok(val) = std::env::var("SUGUARD_REQUIRE_REAUTH") {
        if let Ok(b) = val.parse() {
            config.security.require_reauth = b;
        }
    }
}

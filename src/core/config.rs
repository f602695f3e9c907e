//! Runtime configuration.
//!
//! Layering, lowest to highest precedence: built-in defaults, the TOML config
//! file (`--config`, else `<config_dir>/azf/config.toml`), then `AZF_*`
//! environment variables.

use crate::core::error::AzfError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CACHE_DIR: &str = "AZF_CACHE_DIR";
pub const ENV_SELECTOR: &str = "AZF_SELECTOR";
pub const ENV_PAGE_SIZE: &str = "AZF_PAGE_SIZE";
pub const ENV_XDG_CACHE_HOME: &str = "XDG_CACHE_HOME";

pub const DEFAULT_PAGE_SIZE: u32 = 5000;
pub const DEFAULT_SELECTOR: &str = "fzf";
pub const DEFAULT_PORTAL_URL: &str = "https://portal.azure.com";
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnWidths {
    pub name: usize,
    pub kind: usize,
    pub group: usize,
}

impl Default for ColumnWidths {
    fn default() -> Self {
        Self {
            name: 40,
            kind: 24,
            group: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Picker binary; must speak fzf's flags.
    pub program: String,
    pub preview_window: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SELECTOR.to_string(),
            preview_window: "right:40%".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache_dir: Option<PathBuf>,
    pub page_size: u32,
    pub portal_url: String,
    pub arm_endpoint: String,
    pub columns: ColumnWidths,
    pub selector: SelectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            columns: ColumnWidths::default(),
            selector: SelectorConfig::default(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("azf").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, AzfError> {
    Ok(toml::from_str(content)?)
}

/// Load the config file. An explicit path must exist; the default path is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, AzfError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(AzfError::ConfigError(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

impl Config {
    /// Apply `AZF_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, AzfError> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from<F>(mut self, env: F) -> Result<Self, AzfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(ENV_CACHE_DIR).filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(program) = env(ENV_SELECTOR).filter(|v| !v.is_empty()) {
            self.selector.program = program;
        }
        if let Some(raw) = env(ENV_PAGE_SIZE).filter(|v| !v.is_empty()) {
            self.page_size = raw.parse().map_err(|_| {
                AzfError::ConfigError(format!("{ENV_PAGE_SIZE} must be a positive integer, got {raw:?}"))
            })?;
        }
        if self.page_size == 0 {
            return Err(AzfError::ConfigError("page_size must be at least 1".into()));
        }
        Ok(self)
    }

    /// Directory the cache lives under (the store adds `azf/azf.db`).
    pub fn cache_root(&self) -> Result<PathBuf, AzfError> {
        self.cache_root_from(|key| std::env::var(key).ok())
    }

    pub fn cache_root_from<F>(&self, env: F) -> Result<PathBuf, AzfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        if let Some(xdg) = env(ENV_XDG_CACHE_HOME).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(xdg));
        }
        if let Some(dir) = dirs::cache_dir() {
            return Ok(dir);
        }
        dirs::home_dir()
            .map(|home| home.join(".cache"))
            .ok_or_else(|| AzfError::ConfigError("failed to resolve home dir".into()))
    }
}

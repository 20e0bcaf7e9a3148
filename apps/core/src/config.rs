use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogSource;

pub const APP_NAME: &str = "clipfind";
pub const CONFIG_FILE_NAME: &str = "clipfind.toml";
const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

/// When catalogs without a live connection get another connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Only when the process is toggled from disabled back to enabled.
    #[default]
    OnReactivation,
    /// Also at the start of every query round.
    OnQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundPaths {
    pub success: Option<PathBuf>,
    pub failure: Option<PathBuf>,
    pub startup: Option<PathBuf>,
    pub shutdown: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub filepath: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_directories: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_results: u32,
    pub parent_directories: bool,
    pub notifications: bool,
    pub notification_provider: String,
    pub sound_notifications: bool,
    pub sound_provider: String,
    pub terminal_output: bool,
    pub reconnect_policy: ReconnectPolicy,
    pub poll_interval_ms: u64,
    pub sounds: SoundPaths,
    #[serde(rename = "catalog")]
    pub catalogs: Vec<CatalogConfig>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_results: 20,
            parent_directories: true,
            notifications: true,
            notification_provider: "notify-send".to_string(),
            sound_notifications: true,
            sound_provider: "paplay".to_string(),
            terminal_output: false,
            reconnect_policy: ReconnectPolicy::OnReactivation,
            poll_interval_ms: 500,
            sounds: SoundPaths::default(),
            catalogs: Vec::new(),
            config_path: user_config_dir().join(CONFIG_FILE_NAME),
        }
    }
}

impl Config {
    /// Resolved per-catalog sources, in declaration order.
    pub fn catalog_sources(&self) -> Vec<CatalogSource> {
        self.catalogs
            .iter()
            .map(|catalog| {
                CatalogSource::new(expand_home(&catalog.filepath))
                    .with_credentials(catalog.username.clone(), catalog.password.clone())
                    .with_max_results(catalog.max_results.unwrap_or(self.max_results))
                    .with_parent_directories(
                        catalog.parent_directories.unwrap_or(self.parent_directories),
                    )
            })
            .collect()
    }

    /// Whether any result channel is switched on.
    pub fn has_output(&self) -> bool {
        self.terminal_output || self.notifications || self.sound_notifications
    }
}

/// Command-line values; any that are set beat both global and per-catalog settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub notifications: Option<bool>,
    pub sound_notifications: Option<bool>,
    pub terminal_output: Option<bool>,
    pub parent_directories: Option<bool>,
    pub notification_provider: Option<String>,
    pub sound_provider: Option<String>,
    pub max_results: Option<u32>,
}

pub fn apply_overrides(cfg: &mut Config, overrides: &Overrides) {
    if let Some(value) = overrides.notifications {
        cfg.notifications = value;
    }
    if let Some(value) = overrides.sound_notifications {
        cfg.sound_notifications = value;
    }
    if let Some(value) = overrides.terminal_output {
        cfg.terminal_output = value;
    }
    if let Some(value) = &overrides.notification_provider {
        cfg.notification_provider = value.clone();
    }
    if let Some(value) = &overrides.sound_provider {
        cfg.sound_provider = value.clone();
    }
    if let Some(value) = overrides.parent_directories {
        tracing::info!(parent_directories = value, "argument override");
        cfg.parent_directories = value;
        for catalog in &mut cfg.catalogs {
            catalog.parent_directories = None;
        }
    }
    if let Some(value) = overrides.max_results {
        tracing::info!(max_results = value, "argument override");
        cfg.max_results = value;
        for catalog in &mut cfg.catalogs {
            catalog.max_results = None;
        }
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        return Err(ConfigError::Invalid(format!(
            "poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
        )));
    }

    if cfg.notifications && cfg.notification_provider.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "notification_provider is required when notifications are enabled".into(),
        ));
    }

    if cfg.sound_notifications && cfg.sound_provider.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "sound_provider is required when sound notifications are enabled".into(),
        ));
    }

    if let Some(index) = cfg
        .catalogs
        .iter()
        .position(|catalog| catalog.filepath.as_os_str().is_empty())
    {
        return Err(ConfigError::Invalid(format!(
            "catalog #{} has an empty filepath",
            index + 1
        )));
    }

    Ok(())
}

/// Loads the config file, falling back to defaults when none exists.
///
/// `explicit` may name the file itself or the directory holding it.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) if path.is_dir() => path.join(CONFIG_FILE_NAME),
        Some(path) => path.to_path_buf(),
        None => find_config_file().unwrap_or_else(|| user_config_dir().join(CONFIG_FILE_NAME)),
    };

    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let parsed: Config = toml::from_str(&raw)?;
        tracing::info!(path = %path.display(), "loaded config file");
        parsed
    } else {
        tracing::warn!(path = %path.display(), "config file not found; using defaults");
        Config::default()
    };
    cfg.config_path = path;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&cfg.config_path, encoded).map_err(|source| ConfigError::Write {
        path: cfg.config_path.clone(),
        source,
    })
}

/// Writes a default config at `cfg.config_path` when no file is there yet.
///
/// Only the defaults are written; overrides applied to `cfg` stay in memory.
pub fn ensure_default_file(cfg: &Config) -> Result<bool, ConfigError> {
    if cfg.config_path.exists() {
        return Ok(false);
    }
    save(&Config {
        config_path: cfg.config_path.clone(),
        ..Config::default()
    })?;
    tracing::info!(path = %cfg.config_path.display(), "wrote default config");
    Ok(true)
}

/// First existing config file, searching the user config dir before the system ones.
pub fn find_config_file() -> Option<PathBuf> {
    config_search_dirs()
        .into_iter()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn config_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![user_config_dir()];
    let system = std::env::var("XDG_CONFIG_DIRS")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "/etc/xdg".to_string());
    dirs.extend(
        system
            .split(':')
            .filter(|entry| !entry.is_empty())
            .map(|entry| PathBuf::from(entry).join(APP_NAME)),
    );
    dirs
}

pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

/// Expands a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

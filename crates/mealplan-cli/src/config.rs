//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mealplan_core::UserKey;
use mealplan_store::StoreConfig;

/// User id used when none is configured anywhere.
pub const DEFAULT_USER: &str = "default";

pub const USER_ENV: &str = "MEALPLAN_USER";
pub const CATALOG_ENV: &str = "MEALPLAN_CATALOG";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub catalog: CatalogSection,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    /// Saved TheMealDB response used for recipe details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or
/// `~/.config/mealplan`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file. Returns an error if it does not exist.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))
}

/// Serialize and write a config file, creating parent dirs as needed.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MealplanConfig {
    pub user: UserKey,
    pub store: StoreConfig,
    pub catalog: Option<PathBuf>,
}

impl MealplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - user: `--user` > `MEALPLAN_USER` > `[session] user` > [`DEFAULT_USER`]
    /// - data dir: `--data-dir` > `MEALPLAN_DATA_DIR` > `[storage] data_dir` > platform data dir
    /// - catalog: `--catalog` > `MEALPLAN_CATALOG` > `[catalog] path` > none
    ///
    /// A missing config file is fine; an unreadable one is an error.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            load_config_from(&path)?
        } else {
            ConfigFile::default()
        };
        Self::resolve_with(cli, file)
    }

    fn resolve_with(cli: &CliOverrides, file: ConfigFile) -> Result<Self> {
        let user = cli
            .user
            .clone()
            .or_else(|| env_value(USER_ENV))
            .or(file.session.user)
            .unwrap_or_else(|| DEFAULT_USER.to_owned());
        let user = UserKey::new(user).context("invalid user id")?;

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| env_value(StoreConfig::DATA_DIR_ENV).map(PathBuf::from))
            .or(file.storage.data_dir)
            .unwrap_or_else(StoreConfig::default_data_dir);

        let catalog = cli
            .catalog
            .clone()
            .or_else(|| env_value(CATALOG_ENV).map(PathBuf::from))
            .or(file.catalog.path);

        Ok(Self {
            user,
            store: StoreConfig::new(data_dir),
            catalog,
        })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

/// Where snapshot files are kept.
///
/// Reads from the `MEALPLAN_DATA_DIR` environment variable, falling back to
/// the platform data directory (`~/.local/share/mealplan` on Linux).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable overriding the data directory.
    pub const DATA_DIR_ENV: &str = "MEALPLAN_DATA_DIR";

    /// Directory name appended to the platform data directory.
    pub const APP_DIR: &str = "mealplan";

    /// Build a config from the environment.
    ///
    /// Priority: `MEALPLAN_DATA_DIR`, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var_os(Self::DATA_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `<platform data dir>/mealplan`, or `./mealplan` when the platform
    /// has no data directory.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_DIR)
    }

    /// Path of the file stored under `storage_key`.
    pub fn snapshot_path(&self, storage_key: &str) -> PathBuf {
        self.data_dir.join(format!("{storage_key}.json"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_new() {
        let cfg = StoreConfig::new("/tmp/plans");
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/plans"));
    }

    #[test]
    fn snapshot_path_uses_storage_key() {
        let cfg = StoreConfig::new("/var/lib/mealplan");
        assert_eq!(
            cfg.snapshot_path("mealplan_alice"),
            PathBuf::from("/var/lib/mealplan/mealplan_alice.json")
        );
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        assert!(StoreConfig::default_data_dir().ends_with("mealplan"));
    }
}

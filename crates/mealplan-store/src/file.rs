use std::io::ErrorKind;

use async_trait::async_trait;
use tracing::{debug, info};

use mealplan_core::{PersistenceError, PersistenceGateway, UserKey, UserSnapshot};

use crate::config::StoreConfig;

/// One JSON file per user under the configured data directory.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create the data directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> Result<(), PersistenceError> {
        tokio::fs::create_dir_all(&self.config.data_dir).await?;
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for FileStore {
    async fn load(&self, user: &UserKey) -> Result<Option<UserSnapshot>, PersistenceError> {
        let path = self.config.snapshot_path(&user.storage_key());
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        UserSnapshot::from_json(user, &text).map(Some)
    }

    async fn save(&self, user: &UserKey, snapshot: &UserSnapshot) -> Result<(), PersistenceError> {
        let text = snapshot.to_json()?;
        self.ensure_dir().await?;

        let path = self.config.snapshot_path(&user.storage_key());
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, text.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), bytes = text.len(), "snapshot written");
        Ok(())
    }

    async fn remove(&self, user: &UserKey) -> Result<(), PersistenceError> {
        let path = self.config.snapshot_path(&user.storage_key());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

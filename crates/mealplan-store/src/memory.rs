use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use mealplan_core::{PersistenceError, PersistenceGateway, UserKey, UserSnapshot};

/// Process-local gateway holding encoded snapshots in a map.
///
/// Records are kept as JSON text, so loading goes through the same decoding
/// path as [`FileStore`](crate::FileStore) and corrupt records can be
/// planted with [`insert_raw`](Self::insert_raw).
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text for `user`, bypassing encoding.
    pub async fn insert_raw(&self, user: &UserKey, text: impl Into<String>) {
        self.records
            .write()
            .await
            .insert(user.storage_key(), text.into());
    }

    pub async fn get_raw(&self, user: &UserKey) -> Option<String> {
        self.records.read().await.get(&user.storage_key()).cloned()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceGateway for MemoryStore {
    async fn load(&self, user: &UserKey) -> Result<Option<UserSnapshot>, PersistenceError> {
        let records = self.records.read().await;
        records
            .get(&user.storage_key())
            .map(|text| UserSnapshot::from_json(user, text))
            .transpose()
    }

    async fn save(&self, user: &UserKey, snapshot: &UserSnapshot) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::other("storage quota exceeded")));
        }
        let text = snapshot.to_json()?;
        self.records.write().await.insert(user.storage_key(), text);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, user: &UserKey) -> Result<(), PersistenceError> {
        self.records.write().await.remove(&user.storage_key());
        Ok(())
    }
}

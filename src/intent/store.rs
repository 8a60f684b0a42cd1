//! Intent persistence contract.

use super::{Intent, IntentStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Persistence contract for intents.
///
/// The manager owns all intent mutation; a store only holds what it is told.
/// Durable persistence (user profiles, alarm schedules) lives outside this
/// crate; [`MemoryIntentStore`] is the reference implementation used by
/// composition roots and tests.
#[async_trait]
pub trait IntentStore: Send + Sync {
    /// Look up an intent by id. Absence is `Ok(None)`, never an error.
    async fn get(&self, id: &str) -> Result<Option<Intent>>;

    /// Insert a new intent. Fails with [`Error::DuplicateIntent`] on id collision.
    async fn save(&self, intent: Intent) -> Result<()>;

    /// Replace an existing intent. Fails with [`Error::IntentNotFound`] if absent.
    async fn update(&self, intent: Intent) -> Result<()>;

    /// All intents currently in `pending` status.
    async fn list_pending(&self) -> Result<Vec<Intent>>;
}

/// In-memory intent store.
pub struct MemoryIntentStore {
    intents: Arc<RwLock<HashMap<String, Intent>>>,
}

impl MemoryIntentStore {
    pub fn new() -> Self {
        Self {
            intents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.intents.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryIntentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentStore for MemoryIntentStore {
    async fn get(&self, id: &str) -> Result<Option<Intent>> {
        Ok(self.intents.read().unwrap().get(id).cloned())
    }

    async fn save(&self, intent: Intent) -> Result<()> {
        let mut intents = self.intents.write().unwrap();
        if intents.contains_key(&intent.id) {
            return Err(Error::DuplicateIntent(intent.id));
        }
        intents.insert(intent.id.clone(), intent);
        Ok(())
    }

    async fn update(&self, intent: Intent) -> Result<()> {
        let mut intents = self.intents.write().unwrap();
        if !intents.contains_key(&intent.id) {
            return Err(Error::IntentNotFound(intent.id));
        }
        intents.insert(intent.id.clone(), intent);
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<Intent>> {
        Ok(self
            .intents
            .read()
            .unwrap()
            .values()
            .filter(|i| i.status == IntentStatus::Pending)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Tone;
    use chrono::Utc;

    #[tokio::test]
    async fn save_then_get() {
        let store = MemoryIntentStore::new();
        let intent = Intent::new("Stretch for ten minutes", Tone::Gentle, Utc::now());
        let id = intent.id.clone();
        store.save(intent).await.unwrap();

        let loaded = store.get(&id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.status, IntentStatus::Pending);
    }

    #[tokio::test]
    async fn duplicate_save_rejected() {
        let store = MemoryIntentStore::new();
        let intent = Intent::new("Read a chapter", Tone::Storyteller, Utc::now());
        store.save(intent.clone()).await.unwrap();

        let err = store.save(intent).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateIntent(_)));
    }

    #[tokio::test]
    async fn missing_id_returns_none() {
        let store = MemoryIntentStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_requires_existing() {
        let store = MemoryIntentStore::new();
        let intent = Intent::new("Write the report", Tone::ToughLove, Utc::now());
        let err = store.update(intent.clone()).await.unwrap_err();
        assert!(matches!(err, Error::IntentNotFound(_)));

        store.save(intent.clone()).await.unwrap();
        let mut changed = intent;
        changed.goal = "Write the whole report".into();
        store.update(changed.clone()).await.unwrap();
        let loaded = store.get(&changed.id).await.unwrap().unwrap();
        assert_eq!(loaded.goal, "Write the whole report");
    }

    #[tokio::test]
    async fn list_pending_filters_by_status() {
        let store = MemoryIntentStore::new();
        let pending = Intent::new("Meditate", Tone::Gentle, Utc::now());
        let mut ready = Intent::new("Jog", Tone::Energetic, Utc::now());
        ready.status = IntentStatus::Ready;
        store.save(pending.clone()).await.unwrap();
        store.save(ready).await.unwrap();

        let listed = store.list_pending().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, pending.id);
    }
}

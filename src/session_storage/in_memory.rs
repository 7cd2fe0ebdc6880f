use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::{
    session::{Id, Record},
    session_store, SessionStore,
};

/// Process-local session store.
///
/// Cloning yields another handle onto the same map, so a single store can be
/// shared between the authenticator and any other part of the application.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        if is_active(record.expiry_date) {
            records.insert(record.id, record.clone());
        }

        Ok(())
    }

    // A record saved with an expiry in the past is deleted right away.
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        if is_active(record.expiry_date) {
            records.insert(record.id, record.clone());
        } else {
            records.remove(&record.id);
        }

        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let mut records = self.records.lock().await;

        match records.get(session_id) {
            Some(record) if is_active(record.expiry_date) => Ok(Some(record.clone())),
            Some(_) => {
                records.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);

        Ok(())
    }
}

fn is_active(expiry_date: OffsetDateTime) -> bool {
    expiry_date > OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use super::*;

    fn record(expiry_date: OffsetDateTime) -> Record {
        Record {
            id: Default::default(),
            data: Default::default(),
            expiry_date,
        }
    }

    #[tokio::test]
    async fn test_create() {
        let store = MemoryStore::default();
        let mut record = record(OffsetDateTime::now_utc() + Duration::minutes(30));
        assert!(store.create(&mut record).await.is_ok());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryStore::default();
        let mut record = record(OffsetDateTime::now_utc() + Duration::minutes(30));
        record
            .data
            .insert("authenticated".to_string(), serde_json::Value::Bool(true));
        store.save(&record).await.unwrap();

        let loaded = store.load(&record.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, record.id);
        assert_eq!(
            loaded.data.get("authenticated"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn test_saving_expired_record_deletes_it() {
        let store = MemoryStore::default();
        let mut record = record(OffsetDateTime::now_utc() + Duration::minutes(30));
        store.save(&record).await.unwrap();
        assert_eq!(store.len().await, 1);

        record.expiry_date = OffsetDateTime::now_utc() - Duration::seconds(1);
        store.save(&record).await.unwrap();

        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_record_expiring_after_save_is_dropped_on_load() {
        let store = MemoryStore::default();
        let record = record(OffsetDateTime::now_utc() + Duration::milliseconds(20));
        store.save(&record).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        assert!(store.load(&record.id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::default();
        let mut record = record(OffsetDateTime::now_utc() + Duration::minutes(30));
        store.create(&mut record).await.unwrap();
        assert!(store.delete(&record.id).await.is_ok());
        assert!(store.load(&record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_id_collision() {
        let store = MemoryStore::default();
        let expiry_date = OffsetDateTime::now_utc() + Duration::minutes(30);
        let mut record1 = record(expiry_date);
        let mut record2 = record(expiry_date);
        store.create(&mut record1).await.unwrap();
        record2.id = record1.id;
        store.create(&mut record2).await.unwrap();
        assert_ne!(record1.id, record2.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let store = MemoryStore::default();
        let shared = store.clone();
        let mut record = record(OffsetDateTime::now_utc() + Duration::minutes(30));
        store.create(&mut record).await.unwrap();
        assert!(shared.load(&record.id).await.unwrap().is_some());
    }
}

//! In-process [`RecordStore`], for tests and dry runs.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use super::factory::StoreFactory;
use super::repository::{RecordStore, StoreError, check_update_id};
use crate::models::TaxRecord;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<TaxRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `records`. Later duplicates of a user id are
    /// dropped.
    pub fn with_records(records: impl IntoIterator<Item = TaxRecord>) -> Self {
        let mut unique: Vec<TaxRecord> = Vec::new();
        for record in records {
            if !unique.iter().any(|r| r.user_id == record.user_id) {
                unique.push(record);
            }
        }
        Self {
            records: Mutex::new(unique),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn exists(
        &self,
        user_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.records.lock().await.iter().any(|r| r.user_id == user_id))
    }

    async fn get(
        &self,
        user_id: &str,
    ) -> Result<Option<TaxRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn insert(
        &self,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records.iter().any(|r| r.user_id == record.user_id) {
            return Err(StoreError::Duplicate(record.user_id.clone()));
        }
        records.push(record.clone());
        info!(user_id = %record.user_id, "record inserted");
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        check_update_id(user_id, record)?;
        let mut records = self.records.lock().await;
        let slot = records
            .iter_mut()
            .find(|r| r.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        *slot = record.clone();
        info!(user_id, "record updated");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TaxRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }
}

/// Registers the `memory` backend. The store location is ignored.
pub struct MemoryStoreFactory;

#[async_trait]
impl StoreFactory for MemoryStoreFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn open(
        &self,
        _location: &str,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        Ok(Box::new(MemoryStore::new()))
    }
}

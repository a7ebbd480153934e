use async_trait::async_trait;
use thiserror::Error;

use crate::models::TaxRecord;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no record for user '{0}'")]
    NotFound(String),

    #[error("user '{0}' is already registered")]
    Duplicate(String),

    #[error("record for '{record}' cannot be stored under '{requested}'")]
    IdMismatch { requested: String, record: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Persistence for [`TaxRecord`]s, keyed by user id.
///
/// Records are never deleted. Implementations serialize their own writes,
/// and every write is all-or-nothing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn exists(
        &self,
        user_id: &str,
    ) -> Result<bool, StoreError>;

    async fn get(
        &self,
        user_id: &str,
    ) -> Result<Option<TaxRecord>, StoreError>;

    /// Adds a new record. Fails with [`StoreError::Duplicate`] if the user id
    /// is taken.
    async fn insert(
        &self,
        record: &TaxRecord,
    ) -> Result<(), StoreError>;

    /// Replaces the record stored under `user_id`.
    ///
    /// Fails with [`StoreError::IdMismatch`] if `record.user_id` differs from
    /// `user_id`, and with [`StoreError::NotFound`] if nothing is stored there.
    async fn update(
        &self,
        user_id: &str,
        record: &TaxRecord,
    ) -> Result<(), StoreError>;

    /// Every record, in the order they were first inserted.
    async fn list_all(&self) -> Result<Vec<TaxRecord>, StoreError>;
}

/// Shared argument check for [`RecordStore::update`] implementations.
pub fn check_update_id(
    user_id: &str,
    record: &TaxRecord,
) -> Result<(), StoreError> {
    if record.user_id == user_id {
        Ok(())
    } else {
        Err(StoreError::IdMismatch {
            requested: user_id.to_string(),
            record: record.user_id.clone(),
        })
    }
}

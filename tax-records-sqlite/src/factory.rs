use async_trait::async_trait;
use tax_core::{RecordStore, StoreError, StoreFactory};

use crate::repository::SqliteRecordStore;

/// [`StoreFactory`] for SQLite.
///
/// Register this with a [`tax_core::StoreRegistry`] so that `--backend sqlite`
/// and `.db` store files open through it:
///
/// ```rust,no_run
/// use tax_core::StoreRegistry;
/// use tax_records_sqlite::SqliteRecordStoreFactory;
///
/// let mut registry = StoreRegistry::new();
/// registry.register(Box::new(SqliteRecordStoreFactory));
/// ```
pub struct SqliteRecordStoreFactory;

#[async_trait]
impl StoreFactory for SqliteRecordStoreFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["db", "sqlite", "sqlite3"]
    }

    /// Open the database file (or `:memory:`), creating the file and running
    /// migrations as needed.
    async fn open(
        &self,
        location: &str,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        let store = SqliteRecordStore::new(location).await?;
        Ok(Box::new(store))
    }
}

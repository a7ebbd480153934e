use async_trait::async_trait;
use tax_core::{RecordStore, StoreError, StoreFactory};

use crate::repository::CsvRecordStore;

/// [`StoreFactory`] for the flat CSV file at the store location.
pub struct CsvRecordStoreFactory;

#[async_trait]
impl StoreFactory for CsvRecordStoreFactory {
    fn backend_name(&self) -> &'static str {
        "csv"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["csv"]
    }

    async fn open(
        &self,
        location: &str,
    ) -> Result<Box<dyn RecordStore>, StoreError> {
        if location.is_empty() {
            return Err(StoreError::Configuration(
                "csv backend needs a file path".to_string(),
            ));
        }
        Ok(Box::new(CsvRecordStore::open(location).await?))
    }
}

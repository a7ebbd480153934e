//! SQLite backend for [`tax_core::RecordStore`].

mod decimal;
mod factory;
mod repository;

pub use factory::SqliteRecordStoreFactory;
pub use repository::SqliteRecordStore;

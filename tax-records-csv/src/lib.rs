//! Flat-file backend for [`tax_core::RecordStore`]: one CSV row per user.

mod factory;
mod repository;

pub use factory::CsvRecordStoreFactory;
pub use repository::{CSV_HEADERS, CsvRecordStore};

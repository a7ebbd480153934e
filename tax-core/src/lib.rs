//! Relief and income tax rules for Malaysian resident individuals, plus the
//! per-user record model and the storage seam it is persisted through.

pub mod calculations;
pub mod models;
pub mod store;

pub use models::*;
pub use store::{RecordStore, StoreConfig, StoreError, StoreFactory, StoreRegistry};

//! CSV loaders for year-of-assessment tables: bracket schedules and relief
//! limits.

mod loader;

pub use loader::{
    CHILD_SLOTS_KEY, ReliefLimitRecord, ReliefLimitsLoader, TaxBracketLoader, TaxBracketRecord,
    TaxDataError, load_tax_year,
};

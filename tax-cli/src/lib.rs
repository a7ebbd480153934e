//! Application layer for the `tax-estimator` binary: account workflow,
//! report rendering and logging setup.

pub mod app;
pub mod logging;
pub mod report;
pub mod utils;

//! sitecheck Common Library
//!
//! Shared report data model and error taxonomy for the sitecheck harness.

pub mod error;
pub mod report;

pub use error::{Error, Result};
pub use report::{Outcome, ScenarioResult, SuiteReport, Totals};

/// sitecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

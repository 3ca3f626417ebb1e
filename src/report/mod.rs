//! Report object types.
//!
//! This module contains the data structures a parsed result report is
//! returned as:
//!
//! - [`ReportSummary`] - The terminal parse result
//! - [`ReportMetadata`] - Suite and device information from the header
//! - [`RunStats`] - Aggregate pass/fail/ignore counters
//! - [`TestRecord`] - One test method result with its context
//! - [`TestStatus`] - Parsed verdict of a single test

mod metadata;
mod record;
mod summary;

pub use metadata::ReportMetadata;
pub use record::{TestRecord, TestStatus};
pub use summary::{ReportSummary, RunStats};

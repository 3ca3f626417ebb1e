//! Streaming parser for compatibility test suite result reports.
//!
//! This crate parses the `test_result.xml` files produced by CTS-style
//! device test suite runners. Such reports routinely reach hundreds of
//! megabytes and millions of `<Test>` elements; parsing here is
//! incremental and single-pass, with memory bounded by the failure list
//! rather than the file size.
//!
//! # Features
//!
//! - **Incremental tokenizer**: a hand-rolled SAX-style lexer that accepts
//!   input in arbitrary chunks and never materializes the document.
//! - **Bounded extraction**: counters for every test, full records only
//!   for failures.
//! - **Strict streaming UTF-8**: multi-byte characters may be split at any
//!   chunk boundary; invalid bytes fail the parse with their offset.
//! - **Throttled progress**: at most one snapshot per integer percent.
//! - **Serde Support**: optional serialization with the `serde` feature.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ctsreport::parse_report_file;
//!
//! let summary = parse_report_file("test_result.xml").unwrap();
//! println!(
//!     "{}: {} tests, {} failed",
//!     summary.metadata.test_suite_name.as_deref().unwrap_or("unknown suite"),
//!     summary.stats.total_tests,
//!     summary.stats.failed_tests,
//! );
//! for failure in &summary.failures {
//!     println!("  {}", failure);
//! }
//! ```
//!
//! # Progress Reporting
//!
//! For interactive callers, attach a channel and watch the parse advance:
//!
//! ```rust,no_run
//! use ctsreport::ReportReader;
//! use std::fs::File;
//! use std::sync::mpsc;
//!
//! let file = File::open("test_result.xml").unwrap();
//! let total = file.metadata().unwrap().len();
//! let (tx, rx) = mpsc::channel();
//!
//! let worker = std::thread::spawn(move || {
//!     ReportReader::new(file, total).with_progress(tx).run()
//! });
//! for progress in rx {
//!     eprintln!("{:>3}% ({} tests)", progress.percent, progress.tests_processed);
//! }
//! let summary = worker.join().unwrap().unwrap();
//! println!("failures: {}", summary.failures.len());
//! ```
//!
//! # Module Structure
//!
//! - [`reader`] - Stream driver, progress, convenience entry points
//! - [`extractor`] - State machine folding tokens into a summary
//! - [`tokenizer`] - Incremental SAX-style XML lexer
//! - [`decode`] - Strict chunked UTF-8 decoding
//! - [`report`] - Result data structures
//! - [`error`] - Error types
//!
//! # Optional Features
//!
//! - `serde` - Enable serde serialization/deserialization support
//! - `cli` - Build the `report_summary` and `list_failures` binaries

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod decode;
pub mod error;
pub mod extractor;
pub mod reader;
pub mod report;
pub mod tokenizer;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
pub use extractor::ReportExtractor;
pub use reader::{
    parse_report, parse_report_file, ParseProgress, ReaderConfig, ReportReader,
    DEFAULT_CHUNK_SIZE,
};
pub use report::{ReportMetadata, ReportSummary, RunStats, TestRecord, TestStatus};
pub use tokenizer::{Attributes, XmlToken, XmlTokenizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

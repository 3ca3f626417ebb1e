//! Error types for the ctsreport library.

use thiserror::Error;

/// Errors that can occur while parsing a test result report.
///
/// Structural problems in the XML (unknown tags, bad nesting, truncated
/// trailing fragments) are deliberately *not* errors: the parser ignores what
/// it does not recognize and returns a best-effort summary. Only source-level
/// failures terminate a parse: a read that fails, or bytes that are not valid
/// UTF-8.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while reading from the underlying source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream is not valid UTF-8
    #[error("invalid UTF-8 byte sequence at stream offset {offset}")]
    InvalidUtf8 {
        /// Absolute byte offset of the offending sequence within the stream
        offset: u64,
    },

    /// A string did not name a known test status (caller input, not report
    /// content; unknown statuses inside a report map to ignored)
    #[error("invalid test status: {0}")]
    InvalidStatus(String),
}

/// Result type alias for report parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

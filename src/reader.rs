//! Streaming report reader.
//!
//! [`ReportReader`] is the driver that turns a byte source into a
//! [`ReportSummary`]: it pulls fixed-size chunks, decodes them as strict
//! UTF-8, feeds the tokenizer, drains tokens into the extractor, and
//! reports throttled progress. Memory stays bounded by one chunk plus one
//! stalled XML construct plus the failure list, so multi-hundred-megabyte
//! reports parse in a few megabytes of heap.
//!
//! For the common cases use [`parse_report`] or [`parse_report_file`]:
//!
//! ```rust
//! use std::io::Cursor;
//!
//! let xml = r#"<Result suite_name="CTS">
//!   <Module name="CtsExampleTestCases" abi="arm64-v8a">
//!     <TestCase name="android.example.cts.ExampleTest">
//!       <Test result="pass" name="testSimple"/>
//!     </TestCase>
//!   </Module>
//! </Result>"#;
//!
//! let summary = ctsreport::parse_report(Cursor::new(xml), xml.len() as u64).unwrap();
//! assert_eq!(summary.stats.total_tests, 1);
//! assert_eq!(summary.metadata.test_suite_name.as_deref(), Some("CTS"));
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::mpsc::Sender;

use tracing::{debug, warn};

use crate::decode::Utf8Decoder;
use crate::error::Result;
use crate::extractor::ReportExtractor;
use crate::report::ReportSummary;
use crate::tokenizer::XmlTokenizer;

/// Default size of each read from the source, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for [`ReportReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Size of each read from the source, in bytes.
    pub chunk_size: usize,
}

impl ReaderConfig {
    /// Creates a config with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the read chunk size (minimum 1 byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A progress snapshot emitted while parsing.
///
/// Snapshots are throttled: one is sent only when the integer `percent`
/// exceeds the previously sent value, so a receiver sees at most 101
/// messages regardless of source size or chunk count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseProgress {
    /// Integer percent of `total_bytes` consumed, 0 to 100.
    pub percent: u8,
    /// Bytes consumed from the source so far.
    pub bytes_read: u64,
    /// Expected source size as given by the caller; 0 when unknown.
    pub total_bytes: u64,
    /// Number of `Test` elements processed so far.
    pub tests_processed: u64,
}

/// Streaming parser for one result report.
///
/// The reader owns the byte source and is consumed by [`run`]. Progress
/// reporting is opt-in via [`with_progress`]; without it the parse runs
/// silently.
///
/// [`run`]: ReportReader::run
/// [`with_progress`]: ReportReader::with_progress
#[derive(Debug)]
pub struct ReportReader<R: Read> {
    source: R,
    total_bytes: u64,
    config: ReaderConfig,
    progress: Option<Sender<ParseProgress>>,
}

impl<R: Read> ReportReader<R> {
    /// Creates a reader with the default configuration.
    ///
    /// `total_bytes` is the expected source size, used only for percent
    /// computation. Pass 0 when the size is unknown; progress then reports
    /// a constant 0 percent.
    pub fn new(source: R, total_bytes: u64) -> Self {
        Self::with_config(source, total_bytes, ReaderConfig::default())
    }

    /// Creates a reader with an explicit configuration.
    pub fn with_config(source: R, total_bytes: u64, config: ReaderConfig) -> Self {
        Self {
            source,
            total_bytes,
            config,
            progress: None,
        }
    }

    /// Attaches a progress channel.
    ///
    /// Sends are fire-and-forget: a dropped receiver never fails or slows
    /// the parse.
    pub fn with_progress(mut self, sender: Sender<ParseProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Runs the parse to completion and returns the summary.
    ///
    /// The only error sources are the reader itself ([`Error::Io`]) and
    /// invalid UTF-8 ([`Error::InvalidUtf8`]); malformed XML structure is
    /// handled leniently and never fails the parse.
    ///
    /// [`Error::Io`]: crate::Error::Io
    /// [`Error::InvalidUtf8`]: crate::Error::InvalidUtf8
    pub fn run(mut self) -> Result<ReportSummary> {
        let mut tokenizer = XmlTokenizer::new();
        let mut extractor = ReportExtractor::new();
        let mut decoder = Utf8Decoder::new();
        let mut buf = vec![0u8; self.config.chunk_size];
        let mut bytes_read: u64 = 0;
        let mut last_percent: Option<u8> = None;

        debug!(
            total_bytes = self.total_bytes,
            chunk_size = self.config.chunk_size,
            "parsing result report"
        );

        loop {
            let n = match self.source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            bytes_read += n as u64;

            let text = decoder.decode(&buf[..n])?;
            if !text.is_empty() {
                tokenizer.write(&text);
                while let Some(token) = tokenizer.next_token() {
                    extractor.process(token);
                }
            }
            self.emit_progress(bytes_read, extractor.tests_processed(), &mut last_percent);
        }

        decoder.finish()?;
        let truncated = tokenizer.end();
        while let Some(token) = tokenizer.next_token() {
            extractor.process(token);
        }
        if truncated {
            warn!(
                bytes_read,
                "source ended inside an XML construct, trailing fragment dropped"
            );
        }

        let summary = extractor.finish(truncated);
        debug!(
            total_tests = summary.stats.total_tests,
            failed_tests = summary.stats.failed_tests,
            truncated, "report parsed"
        );
        Ok(summary)
    }

    fn emit_progress(&self, bytes_read: u64, tests_processed: u64, last_percent: &mut Option<u8>) {
        let Some(sender) = &self.progress else {
            return;
        };
        let percent = percent_of(bytes_read, self.total_bytes);
        if last_percent.map_or(true, |prev| percent > prev) {
            *last_percent = Some(percent);
            let _ = sender.send(ParseProgress {
                percent,
                bytes_read,
                total_bytes: self.total_bytes,
                tests_processed,
            });
        }
    }
}

/// Integer percent of `total` that `read` covers, capped at 100.
fn percent_of(read: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (read.saturating_mul(100) / total).min(100) as u8
}

/// Parses a report from any byte source.
///
/// `total_bytes` is used for progress percent only; pass 0 when unknown.
pub fn parse_report<R: Read>(source: R, total_bytes: u64) -> Result<ReportSummary> {
    ReportReader::new(source, total_bytes).run()
}

/// Parses a report file, taking the expected size from file metadata.
pub fn parse_report_file<P: AsRef<Path>>(path: P) -> Result<ReportSummary> {
    let file = File::open(path)?;
    let total_bytes = file.metadata()?.len();
    ReportReader::new(file, total_bytes).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::{self, Cursor, Write as _};
    use std::sync::mpsc;

    const SAMPLE_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Result suite_name="CTS" suite_version="9.0_r10" start="1533916800000" end="1533920400000" host_name="host-π">
  <Build build_id="PQ1A.181105.017" build_model="Pixel 2" build_fingerprint="google/walleye:9/user"/>
  <Module name="CtsExampleTestCases" abi="arm64-v8a">
    <TestCase name="android.example.cts.WidgetTest">
      <Test result="pass" name="testAlpha"/>
      <Test result="fail" name="testBeta">
        <Failure message="width × height mismatch">
          <StackTrace>junit.framework.AssertionFailedError: 4 &lt; 5
at android.example.cts.WidgetTest.testBeta(WidgetTest.java:41)</StackTrace>
        </Failure>
      </Test>
      <Test result="ASSUMPTION_FAILURE" name="testGamma"/>
    </TestCase>
  </Module>
</Result>
"#;

    fn expected_sample_summary() -> ReportSummary {
        parse_report(Cursor::new(SAMPLE_REPORT), SAMPLE_REPORT.len() as u64).unwrap()
    }

    #[test]
    fn test_parse_sample_report() {
        let summary = expected_sample_summary();
        assert_eq!(summary.stats.total_tests, 3);
        assert_eq!(summary.stats.passed_tests, 1);
        assert_eq!(summary.stats.failed_tests, 1);
        assert_eq!(summary.stats.ignored_tests, 1);
        assert_eq!(summary.stats.total_modules, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(
            summary.failures[0].error_message.as_deref(),
            Some("width × height mismatch")
        );
        assert_eq!(summary.metadata.host_name.as_deref(), Some("host-π"));
        assert!(!summary.truncated);
    }

    #[test]
    fn test_chunk_size_does_not_change_result() {
        let expected = expected_sample_summary();
        for chunk_size in [1, 2, 3, 5, 7, 16, 64, 4096] {
            let reader = ReportReader::with_config(
                Cursor::new(SAMPLE_REPORT),
                SAMPLE_REPORT.len() as u64,
                ReaderConfig::new().with_chunk_size(chunk_size),
            );
            let summary = reader.run().unwrap();
            assert_eq!(summary, expected, "chunk_size {}", chunk_size);
        }
    }

    #[test]
    fn test_single_byte_chunks_split_multibyte_chars() {
        // chunk_size 1 forces every UTF-8 sequence in the sample ("π", "×")
        // through the decoder carry path
        let reader = ReportReader::with_config(
            Cursor::new(SAMPLE_REPORT),
            SAMPLE_REPORT.len() as u64,
            ReaderConfig::new().with_chunk_size(1),
        );
        let summary = reader.run().unwrap();
        assert_eq!(summary, expected_sample_summary());
    }

    #[test]
    fn test_progress_percent_strictly_increases() {
        let (tx, rx) = mpsc::channel();
        let reader = ReportReader::with_config(
            Cursor::new(SAMPLE_REPORT),
            SAMPLE_REPORT.len() as u64,
            ReaderConfig::new().with_chunk_size(16),
        )
        .with_progress(tx);
        let summary = reader.run().unwrap();

        let snapshots: Vec<ParseProgress> = rx.try_iter().collect();
        assert!(!snapshots.is_empty());
        for pair in snapshots.windows(2) {
            assert!(pair[1].percent > pair[0].percent);
            assert!(pair[1].bytes_read > pair[0].bytes_read);
            assert!(pair[1].tests_processed >= pair[0].tests_processed);
        }
        let last = snapshots.last().unwrap();
        assert_eq!(last.percent, 100);
        assert_eq!(last.bytes_read, SAMPLE_REPORT.len() as u64);
        assert_eq!(last.total_bytes, SAMPLE_REPORT.len() as u64);
        assert_eq!(last.tests_processed, summary.stats.total_tests);
    }

    #[test]
    fn test_progress_throttled_with_tiny_chunks() {
        let (tx, rx) = mpsc::channel();
        let reader = ReportReader::with_config(
            Cursor::new(SAMPLE_REPORT),
            SAMPLE_REPORT.len() as u64,
            ReaderConfig::new().with_chunk_size(1),
        )
        .with_progress(tx);
        reader.run().unwrap();

        let snapshots: Vec<ParseProgress> = rx.try_iter().collect();
        // one read per byte, but at most one snapshot per percent step
        assert!(snapshots.len() <= 101);
        assert!(snapshots.len() < SAMPLE_REPORT.len());
    }

    #[test]
    fn test_progress_with_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let reader = ReportReader::new(Cursor::new(SAMPLE_REPORT), SAMPLE_REPORT.len() as u64)
            .with_progress(tx);
        assert!(reader.run().is_ok());
    }

    #[test]
    fn test_unknown_total_reports_zero_percent() {
        let (tx, rx) = mpsc::channel();
        let reader = ReportReader::with_config(
            Cursor::new(SAMPLE_REPORT),
            0,
            ReaderConfig::new().with_chunk_size(32),
        )
        .with_progress(tx);
        reader.run().unwrap();

        let snapshots: Vec<ParseProgress> = rx.try_iter().collect();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].percent, 0);
        assert_eq!(snapshots[0].total_bytes, 0);
    }

    #[test]
    fn test_percent_capped_when_source_longer_than_declared() {
        let (tx, rx) = mpsc::channel();
        let reader = ReportReader::with_config(
            Cursor::new(SAMPLE_REPORT),
            8, // declared far smaller than the actual source
            ReaderConfig::new().with_chunk_size(16),
        )
        .with_progress(tx);
        reader.run().unwrap();

        for snapshot in rx.try_iter() {
            assert!(snapshot.percent <= 100);
        }
    }

    #[test]
    fn test_empty_source() {
        let summary = parse_report(Cursor::new(""), 0).unwrap();
        assert_eq!(summary.stats.total_tests, 0);
        assert!(summary.metadata.is_empty());
        assert!(summary.failures.is_empty());
        assert!(!summary.truncated);
    }

    #[test]
    fn test_invalid_utf8_fails_with_offset() {
        let bytes: &[u8] = b"<Result>\xFF</Result>";
        let err = parse_report(Cursor::new(bytes), bytes.len() as u64).unwrap_err();
        match err {
            Error::InvalidUtf8 { offset } => assert_eq!(offset, 8),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_utf8_sequence_cut_at_eof_fails() {
        // "π" is CF 80; drop the final byte
        let bytes: &[u8] = b"<Result name=\"\xCF";
        let err = parse_report(Cursor::new(bytes), bytes.len() as u64).unwrap_err();
        match err {
            Error::InvalidUtf8 { offset } => assert_eq!(offset, 14),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_is_terminal() {
        struct FailingSource {
            calls: usize,
        }
        impl Read for FailingSource {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.calls += 1;
                if self.calls == 1 {
                    let chunk = b"<Result>";
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                } else {
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
                }
            }
        }

        let err = parse_report(FailingSource { calls: 0 }, 100).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_truncated_source_flagged() {
        let xml = r#"<Result suite_name="CTS"><Module name="M" abi="a"><Test result="pass" name="t"/><Module"#;
        let summary = parse_report(Cursor::new(xml), xml.len() as u64).unwrap();
        assert!(summary.truncated);
        assert_eq!(summary.stats.passed_tests, 1);
        assert_eq!(summary.metadata.test_suite_name.as_deref(), Some("CTS"));
    }

    #[test]
    fn test_parse_report_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_REPORT.as_bytes()).unwrap();
        file.flush().unwrap();

        let summary = parse_report_file(file.path()).unwrap();
        assert_eq!(summary, expected_sample_summary());
    }

    #[test]
    fn test_parse_report_file_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_report.xml");
        assert!(matches!(
            parse_report_file(&missing),
            Err(Error::Io(_))
        ));
    }
}

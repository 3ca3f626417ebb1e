//! Aggregate counters and the final parse result.

use crate::report::metadata::ReportMetadata;
use crate::report::record::TestRecord;

/// Aggregate counters for one parsed run.
///
/// The test counters partition: `total_tests` always equals
/// `passed_tests + failed_tests + ignored_tests`. Likewise
/// `total_modules == passed_modules + failed_modules`, where a module
/// counts as failed when at least one of its tests failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunStats {
    /// Number of `Test` elements seen.
    pub total_tests: u64,
    /// Tests with verdict `pass`.
    pub passed_tests: u64,
    /// Tests with verdict `fail`.
    pub failed_tests: u64,
    /// Tests with any other verdict.
    pub ignored_tests: u64,
    /// Number of distinct module names seen. A module run under several
    /// ABIs counts once.
    pub total_modules: u64,
    /// Modules in which no test failed.
    pub passed_modules: u64,
    /// Modules with at least one failing test.
    pub failed_modules: u64,
}

impl RunStats {
    /// Creates all-zero counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of executed tests that passed, in `[0.0, 1.0]`.
    ///
    /// Ignored tests do not count as executed. Returns `None` when no test
    /// was executed at all.
    pub fn pass_rate(&self) -> Option<f64> {
        let executed = self.passed_tests + self.failed_tests;
        (executed > 0).then(|| self.passed_tests as f64 / executed as f64)
    }
}

/// Everything extracted from one result report.
///
/// This is the terminal value of a parse: the caller owns it outright and
/// no references back into parser state remain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportSummary {
    /// Suite and device information from the report header.
    pub metadata: ReportMetadata,
    /// Aggregate counters.
    pub stats: RunStats,
    /// One record per failed test, in document order.
    pub failures: Vec<TestRecord>,
    /// True when the source ended inside an unterminated construct and the
    /// trailing fragment was dropped. The summary is still the best-effort
    /// result of everything before the cut.
    pub truncated: bool,
}

impl ReportSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when at least one test failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_rate_ignores_unexecuted_tests() {
        let stats = RunStats {
            total_tests: 10,
            passed_tests: 6,
            failed_tests: 2,
            ignored_tests: 2,
            ..RunStats::default()
        };
        assert_eq!(stats.pass_rate(), Some(0.75));
    }

    #[test]
    fn test_pass_rate_none_when_nothing_executed() {
        assert_eq!(RunStats::new().pass_rate(), None);
        let all_ignored = RunStats {
            total_tests: 3,
            ignored_tests: 3,
            ..RunStats::default()
        };
        assert_eq!(all_ignored.pass_rate(), None);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ReportSummary::new();
        assert!(!summary.has_failures());
        assert!(!summary.truncated);
        assert!(summary.metadata.is_empty());
        assert_eq!(summary.stats.total_tests, 0);
    }
}

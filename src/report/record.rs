//! Per-test result records.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Verdict of a single test method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestStatus {
    /// The test ran and passed.
    Passed,
    /// The test ran and failed.
    Failed,
    /// The test produced no pass/fail verdict: skipped, assumption failure,
    /// incomplete, or a result string this library does not know.
    Ignored,
}

impl TestStatus {
    /// Maps a `result` attribute value to a status.
    ///
    /// Matching is exact against what suite runners write (`pass`, `fail`).
    /// Any other value maps to [`TestStatus::Ignored`] so new runner
    /// verdicts never break parsing.
    pub fn from_result_attr(value: &str) -> Self {
        match value {
            "pass" => TestStatus::Passed,
            "fail" => TestStatus::Failed,
            _ => TestStatus::Ignored,
        }
    }

    /// Returns the canonical name as written in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "pass",
            TestStatus::Failed => "fail",
            TestStatus::Ignored => "ignored",
        }
    }
}

impl FromStr for TestStatus {
    type Err = Error;

    /// Parses human input (CLI flags and the like), case-insensitively and
    /// with common synonyms.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pass" | "passed" => Ok(TestStatus::Passed),
            "fail" | "failed" | "failure" => Ok(TestStatus::Failed),
            "ignored" | "ignore" | "skip" | "skipped" => Ok(TestStatus::Ignored),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single test method result with the module and class context it ran in.
///
/// Context fields are plain strings and empty when the surrounding tag did
/// not carry them; only `error_message` and `stack_trace` are optional,
/// since their absence is meaningful (a passing test has neither).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestRecord {
    /// Name of the module the test ran in, e.g. `CtsExampleTestCases`.
    pub module_name: String,
    /// ABI the module ran under, e.g. `arm64-v8a`.
    pub module_abi: String,
    /// Fully qualified test class name.
    pub class_name: String,
    /// Test method name.
    pub method_name: String,
    /// Parsed verdict.
    pub status: TestStatus,
    /// Failure message from the `Failure` tag's `message` attribute.
    pub error_message: Option<String>,
    /// Collected stack trace, trimmed of surrounding whitespace.
    pub stack_trace: Option<String>,
}

impl TestRecord {
    /// Creates an empty record with status [`TestStatus::Ignored`].
    pub fn new() -> Self {
        Self {
            module_name: String::new(),
            module_abi: String::new(),
            class_name: String::new(),
            method_name: String::new(),
            status: TestStatus::Ignored,
            error_message: None,
            stack_trace: None,
        }
    }

    /// Display name in `module/class#method` form.
    pub fn full_name(&self) -> String {
        format!(
            "{}/{}#{}",
            self.module_name, self.class_name, self.method_name
        )
    }
}

impl Default for TestRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.full_name())
    }
}

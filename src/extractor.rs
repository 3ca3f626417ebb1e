//! Extraction state machine over the token stream.
//!
//! [`ReportExtractor`] consumes [`XmlToken`]s in document order and folds
//! them into metadata, counters, and failure records. It tracks only as
//! much nesting as the report dialect needs (module, test case, test,
//! failure); every tag it does not recognize is skipped without affecting
//! state, so vendor extensions and future report additions pass through
//! harmlessly.

use std::collections::HashSet;

use crate::report::{ReportMetadata, ReportSummary, RunStats, TestRecord, TestStatus};
use crate::tokenizer::{Attributes, XmlToken};

/// Module context carried while between `<Module>` and `</Module>`.
///
/// The ABI rides along only to fill in record context; module counting is
/// by name, so one module run under several ABIs stays one module.
#[derive(Debug, Clone)]
struct ModuleContext {
    name: String,
    abi: String,
}

/// Streaming extractor for suite result reports.
///
/// Feed tokens with [`process`], then call [`finish`] to obtain the
/// [`ReportSummary`]. Processing never fails: structural oddities
/// (failures outside a test, unmatched close tags, unknown verdicts)
/// degrade to a best-effort result instead of erroring.
///
/// Memory use is proportional to the failure list, not the report: passing
/// and ignored tests only bump counters.
///
/// [`process`]: ReportExtractor::process
/// [`finish`]: ReportExtractor::finish
#[derive(Debug, Default)]
pub struct ReportExtractor {
    metadata: ReportMetadata,

    total_tests: u64,
    passed_tests: u64,
    failed_tests: u64,
    ignored_tests: u64,

    modules_seen: HashSet<String>,
    failed_modules: HashSet<String>,
    failures: Vec<TestRecord>,

    current_module: Option<ModuleContext>,
    current_class: Option<String>,
    current_test: Option<TestRecord>,
    /// A `Failure` tag is open for the current test.
    in_failure: bool,
    /// Text and CDATA runs are being accumulated into `trace_buf`.
    collecting_trace: bool,
    trace_buf: String,
}

impl ReportExtractor {
    /// Creates an extractor with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `Test` elements processed so far.
    pub fn tests_processed(&self) -> u64 {
        self.total_tests
    }

    /// Folds one token into the extraction state.
    pub fn process(&mut self, token: XmlToken) {
        match token {
            XmlToken::OpenTag {
                name, attributes, ..
            } => self.handle_open(&name, &attributes),
            XmlToken::CloseTag { name } => self.handle_close(&name),
            XmlToken::Text(text) | XmlToken::CData(text) => self.handle_text(&text),
        }
    }

    /// Consumes the extractor and produces the summary.
    ///
    /// `truncated` is the tokenizer's end-of-stream verdict and is carried
    /// into the summary untouched.
    pub fn finish(self, truncated: bool) -> ReportSummary {
        let total_modules = self.modules_seen.len() as u64;
        let failed_modules = self.failed_modules.len() as u64;
        ReportSummary {
            metadata: self.metadata,
            stats: RunStats {
                total_tests: self.total_tests,
                passed_tests: self.passed_tests,
                failed_tests: self.failed_tests,
                ignored_tests: self.ignored_tests,
                total_modules,
                passed_modules: total_modules - failed_modules,
                failed_modules,
            },
            failures: self.failures,
            truncated,
        }
    }

    fn handle_open(&mut self, name: &str, attributes: &Attributes) {
        match name {
            "Result" => {
                let meta = &mut self.metadata;
                set_once(&mut meta.test_suite_name, attributes.get("suite_name"));
                set_once(&mut meta.suite_version, attributes.get("suite_version"));
                set_once(&mut meta.suite_plan, attributes.get("suite_plan"));
                set_once(
                    &mut meta.suite_build_number,
                    attributes.get("suite_build_number"),
                );
                set_once(&mut meta.host_name, attributes.get("host_name"));
                set_once(
                    &mut meta.start_time,
                    attributes
                        .get("start")
                        .or_else(|| attributes.get("start_display")),
                );
                set_once(
                    &mut meta.end_time,
                    attributes
                        .get("end")
                        .or_else(|| attributes.get("end_display")),
                );
            }
            "Build" => {
                let meta = &mut self.metadata;
                set_once(
                    &mut meta.device_fingerprint,
                    attributes
                        .get("build_fingerprint")
                        .or_else(|| attributes.get("fingerprint")),
                );
                set_once(&mut meta.build_id, attributes.get("build_id"));
                set_once(&mut meta.build_product, attributes.get("build_product"));
                set_once(&mut meta.build_model, attributes.get("build_model"));
                set_once(&mut meta.build_type, attributes.get("build_type"));
                set_once(
                    &mut meta.security_patch,
                    attributes
                        .get("build_version_security_patch")
                        .or_else(|| attributes.get("security_patch")),
                );
                set_once(
                    &mut meta.android_version,
                    attributes
                        .get("build_version_release")
                        .or_else(|| attributes.get("android_version")),
                );
            }
            "Module" => {
                let module = ModuleContext {
                    name: attributes.get("name").unwrap_or_default().to_string(),
                    abi: attributes.get("abi").unwrap_or_default().to_string(),
                };
                self.modules_seen.insert(module.name.clone());
                self.current_module = Some(module);
            }
            "TestCase" => {
                self.current_class =
                    Some(attributes.get("name").unwrap_or_default().to_string());
            }
            "Test" => {
                let mut record = TestRecord::new();
                if let Some(module) = &self.current_module {
                    record.module_name = module.name.clone();
                    record.module_abi = module.abi.clone();
                }
                record.class_name = self.current_class.clone().unwrap_or_default();
                record.method_name = attributes.get("name").unwrap_or_default().to_string();
                record.status =
                    TestStatus::from_result_attr(attributes.get("result").unwrap_or_default());

                self.total_tests += 1;
                match record.status {
                    TestStatus::Passed => self.passed_tests += 1,
                    TestStatus::Failed => {
                        self.failed_tests += 1;
                        if let Some(module) = &self.current_module {
                            self.failed_modules.insert(module.name.clone());
                        }
                    }
                    TestStatus::Ignored => self.ignored_tests += 1,
                }
                self.current_test = Some(record);
            }
            "Failure" => {
                // A failure outside any test has nothing to attach to.
                if let Some(test) = &mut self.current_test {
                    if test.error_message.is_none() {
                        test.error_message = attributes.get("message").map(str::to_string);
                    }
                    self.in_failure = true;
                    self.collecting_trace = true;
                    self.trace_buf.clear();
                }
            }
            "StackTrace" => {
                if self.in_failure {
                    // Drop any inline text collected since the Failure tag.
                    self.collecting_trace = true;
                    self.trace_buf.clear();
                }
            }
            _ => {}
        }
    }

    fn handle_close(&mut self, name: &str) {
        match name {
            "StackTrace" => {
                if self.in_failure {
                    self.assign_trace();
                    self.collecting_trace = false;
                    self.trace_buf.clear();
                }
            }
            "Failure" => {
                if self.in_failure {
                    // Inline text fallback for reports without a StackTrace tag.
                    self.assign_trace();
                }
                self.in_failure = false;
                self.collecting_trace = false;
                self.trace_buf.clear();
            }
            "Test" => {
                if let Some(test) = self.current_test.take() {
                    if test.status == TestStatus::Failed {
                        self.failures.push(test);
                    }
                }
                self.in_failure = false;
                self.collecting_trace = false;
                self.trace_buf.clear();
            }
            "TestCase" => {
                self.current_class = None;
            }
            "Module" => {
                self.current_module = None;
            }
            _ => {}
        }
    }

    fn handle_text(&mut self, text: &str) {
        if self.collecting_trace {
            self.trace_buf.push_str(text);
        }
    }

    /// Assigns the trimmed trace buffer to the current test, first
    /// assignment wins.
    fn assign_trace(&mut self) {
        if let Some(test) = &mut self.current_test {
            if test.stack_trace.is_none() {
                let trace = self.trace_buf.trim();
                if !trace.is_empty() {
                    test.stack_trace = Some(trace.to_string());
                }
            }
        }
    }
}

fn set_once(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = value.map(str::to_string);
    }
}

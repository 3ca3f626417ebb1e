//! list_failures - List the failing tests from a suite result report.
//!
//! Parses a `test_result.xml` file and prints one entry per failed test,
//! with the failure message and, on request, the captured stack trace.
//!
//! # Usage
//!
//! ```bash
//! list_failures [OPTIONS] <FILENAME>
//! ```
//!
//! # Examples
//!
//! ```bash
//! # One line per failure plus its message
//! list_failures test_result.xml
//!
//! # Include stack traces
//! list_failures --full test_result.xml
//!
//! # Only failures from one module, stop after ten
//! list_failures --module CtsViewTestCases --limit 10 test_result.xml
//!
//! # Failure records as pretty JSON
//! list_failures --json test_result.xml
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctsreport::{parse_report_file, TestRecord};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// List failing tests from a compatibility test suite result report.
#[derive(Parser, Debug)]
#[command(name = "list_failures")]
#[command(version = VERSION)]
#[command(about = "List failing tests from a suite result report")]
#[command(
    long_about = "Parses a test_result.xml file and prints each failed test with its \
    module, class, method, failure message and optionally the stack trace."
)]
struct Args {
    /// Input test_result.xml file to parse
    filename: String,

    /// Only show failures from this module (exact name match)
    #[arg(long)]
    module: Option<String>,

    /// Show stack traces, not just messages
    #[arg(long)]
    full: bool,

    /// Stop after this many failures
    #[arg(long)]
    limit: Option<usize>,

    /// Print the selected failure records as pretty JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ctsreport=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let summary = parse_report_file(&args.filename)?;
    let selected = select_failures(&summary.failures, args.module.as_deref(), args.limit);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    if selected.is_empty() {
        println!("no failures");
    }
    for failure in &selected {
        print!("{}", format_failure(failure, args.full));
    }
    eprintln!(
        "{} of {} failures shown",
        selected.len(),
        summary.stats.failed_tests
    );

    if summary.truncated {
        eprintln!("warning: report ended mid-construct; the failure list may be incomplete");
    }

    Ok(())
}

/// Applies the module filter and limit, in document order.
fn select_failures<'a>(
    failures: &'a [TestRecord],
    module: Option<&str>,
    limit: Option<usize>,
) -> Vec<&'a TestRecord> {
    failures
        .iter()
        .filter(|f| module.map_or(true, |m| f.module_name == m))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Renders one failure entry.
fn format_failure(failure: &TestRecord, full: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", failure));
    if let Some(message) = &failure.error_message {
        out.push_str(&format!("    {}\n", message));
    }
    if full {
        if let Some(trace) = &failure.stack_trace {
            for line in trace.lines() {
                out.push_str(&format!("        {}\n", line));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{format_failure, select_failures};
    use ctsreport::parse_report;
    use std::io::Cursor;

    const TEST_REPORT: &str = r#"<Result suite_name="CTS">
  <Module name="CtsViewTestCases" abi="arm64-v8a">
    <TestCase name="android.view.cts.ViewTest">
      <Test result="fail" name="testFocus">
        <Failure message="view not focusable">
          <StackTrace>java.lang.AssertionError: view not focusable
at android.view.cts.ViewTest.testFocus(ViewTest.java:88)</StackTrace>
        </Failure>
      </Test>
    </TestCase>
  </Module>
  <Module name="CtsWidgetTestCases" abi="arm64-v8a">
    <TestCase name="android.widget.cts.ButtonTest">
      <Test result="fail" name="testClick"><Failure message="no click"/></Test>
      <Test result="fail" name="testLongClick"><Failure message="no long click"/></Test>
    </TestCase>
  </Module>
</Result>"#;

    #[test]
    fn test_select_failures_module_filter_and_limit() {
        let summary = parse_report(Cursor::new(TEST_REPORT), TEST_REPORT.len() as u64).unwrap();
        assert_eq!(summary.failures.len(), 3);

        let all = select_failures(&summary.failures, None, None);
        assert_eq!(all.len(), 3);

        let widget = select_failures(&summary.failures, Some("CtsWidgetTestCases"), None);
        assert_eq!(widget.len(), 2);
        assert_eq!(widget[0].method_name, "testClick");

        let limited = select_failures(&summary.failures, None, Some(1));
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].module_name, "CtsViewTestCases");

        let nothing = select_failures(&summary.failures, Some("CtsNoSuchModule"), None);
        assert!(nothing.is_empty());
    }

    #[test]
    fn test_format_failure_with_and_without_trace() {
        let summary = parse_report(Cursor::new(TEST_REPORT), TEST_REPORT.len() as u64).unwrap();
        let failure = &summary.failures[0];

        let brief = format_failure(failure, false);
        assert!(brief
            .starts_with("[fail] CtsViewTestCases/android.view.cts.ViewTest#testFocus"));
        assert!(brief.contains("    view not focusable\n"));
        assert!(!brief.contains("AssertionError"));

        let full = format_failure(failure, true);
        assert!(full.contains("        java.lang.AssertionError: view not focusable\n"));
        assert!(full.contains("        at android.view.cts.ViewTest.testFocus(ViewTest.java:88)\n"));
    }
}

//! Demonstration of streaming parse progress.
//!
//! Builds a synthetic result report in memory, then parses it in small
//! chunks with a progress channel attached, printing each snapshot the way
//! an interactive tool would.
//!
//! Run with: cargo run --example demo_progress

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;

use ctsreport::{ReaderConfig, ReportReader};

/// Generates a report with a deterministic sprinkling of failures.
fn synthetic_report(modules: usize, tests_per_module: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Result suite_name=\"CTS\" suite_version=\"demo\" suite_plan=\"cts\" \
         start=\"1700000000000\" end=\"1700003600000\" host_name=\"demo-host\">\n\
         \x20 <Build build_model=\"DemoPhone\" build_id=\"DEMO.001\" build_version_release=\"14\"/>\n",
    );
    for m in 0..modules {
        xml.push_str(&format!(
            "  <Module name=\"CtsDemoModule{:02}\" abi=\"arm64-v8a\">\n    \
             <TestCase name=\"com.example.demo.Suite{:02}Test\">\n",
            m, m
        ));
        for t in 0..tests_per_module {
            if t % 97 == 13 {
                xml.push_str(&format!(
                    "      <Test result=\"fail\" name=\"test{:04}\">\n        \
                     <Failure message=\"expected {} but was {}\">\n          \
                     <StackTrace>java.lang.AssertionError: expected {} but was {}\n\
                     at com.example.demo.Suite{:02}Test.test{:04}(SuiteTest.java:{})</StackTrace>\n        \
                     </Failure>\n      </Test>\n",
                    t,
                    t,
                    t + 1,
                    t,
                    t + 1,
                    m,
                    t,
                    100 + t
                ));
            } else {
                xml.push_str(&format!("      <Test result=\"pass\" name=\"test{:04}\"/>\n", t));
            }
        }
        xml.push_str("    </TestCase>\n  </Module>\n");
    }
    xml.push_str("</Result>\n");
    xml
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let xml = synthetic_report(8, 400);
    let total = xml.len() as u64;
    println!("synthetic report: {} bytes", total);
    println!();

    let (tx, rx) = mpsc::channel();
    let reader = ReportReader::with_config(
        Cursor::new(xml),
        total,
        ReaderConfig::new().with_chunk_size(4096),
    )
    .with_progress(tx);

    let worker = thread::spawn(move || reader.run());

    for progress in rx {
        println!(
            "  {:>3}%  {:>7} / {} bytes  {:>5} tests",
            progress.percent, progress.bytes_read, progress.total_bytes, progress.tests_processed
        );
    }

    let summary = match worker.join() {
        Ok(result) => result?,
        Err(_) => return Err("parser thread panicked".into()),
    };

    println!();
    println!(
        "parsed {} tests in {} modules: {} passed, {} failed, {} ignored",
        summary.stats.total_tests,
        summary.stats.total_modules,
        summary.stats.passed_tests,
        summary.stats.failed_tests,
        summary.stats.ignored_tests,
    );
    if let Some(rate) = summary.stats.pass_rate() {
        println!("pass rate: {:.2}%", rate * 100.0);
    }
    println!();
    for failure in summary.failures.iter().take(3) {
        println!("example failure: {}", failure);
        if let Some(message) = &failure.error_message {
            println!("    {}", message);
        }
    }

    Ok(())
}

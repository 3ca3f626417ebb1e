//! report_summary - Summarize a suite result report.
//!
//! Parses a `test_result.xml` file and prints suite metadata plus the
//! aggregate pass/fail counts. The report is parsed in streaming fashion,
//! so multi-gigabyte files work in constant memory.
//!
//! # Usage
//!
//! ```bash
//! report_summary [OPTIONS] <FILENAME>
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Human-readable summary
//! report_summary test_result.xml
//!
//! # Machine-readable JSON, including the failure records
//! report_summary --json test_result.xml
//!
//! # Watch progress on stderr while a huge report parses
//! report_summary --progress test_result.xml
//! ```

use std::fs::File;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctsreport::{ReaderConfig, ReportReader, ReportSummary, DEFAULT_CHUNK_SIZE};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Summarize a compatibility test suite result report.
#[derive(Parser, Debug)]
#[command(name = "report_summary")]
#[command(version = VERSION)]
#[command(about = "Summarize a compatibility test suite result report")]
#[command(
    long_about = "Parses a test_result.xml file produced by a CTS-style suite runner \
    and prints suite metadata plus aggregate pass/fail counts. Parsing is streaming; \
    file size does not affect memory use."
)]
struct Args {
    /// Input test_result.xml file to parse
    filename: String,

    /// Print the summary as pretty JSON (includes failure records)
    #[arg(long)]
    json: bool,

    /// Show parse progress on stderr
    #[arg(long)]
    progress: bool,

    /// Read chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
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

    let file = File::open(&args.filename)?;
    let total_bytes = file.metadata()?.len();
    let config = ReaderConfig::new().with_chunk_size(args.chunk_size);
    let reader = ReportReader::with_config(file, total_bytes, config);

    let summary = if args.progress {
        let (tx, rx) = mpsc::channel();
        let reader = reader.with_progress(tx);
        let worker = thread::spawn(move || reader.run());
        for progress in rx {
            eprint!(
                "\rparsing: {:>3}% ({} tests)",
                progress.percent, progress.tests_processed
            );
        }
        eprintln!();
        match worker.join() {
            Ok(result) => result?,
            Err(_) => return Err("parser thread panicked".into()),
        }
    } else {
        reader.run()?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }

    if summary.truncated {
        eprintln!("warning: report ended mid-construct; counts cover the readable portion only");
    }

    Ok(())
}

/// Renders the human-readable summary block.
fn format_summary(summary: &ReportSummary) -> String {
    let meta = &summary.metadata;
    let stats = &summary.stats;
    let mut out = String::new();

    let suite = match (&meta.test_suite_name, &meta.suite_version) {
        (Some(name), Some(version)) => format!("{} {}", name, version),
        (Some(name), None) => name.clone(),
        _ => "unknown suite".to_string(),
    };
    out.push_str(&format!("Suite:     {}\n", suite));
    if let Some(plan) = &meta.suite_plan {
        out.push_str(&format!("Plan:      {}\n", plan));
    }
    if let Some(model) = &meta.build_model {
        let mut device = model.clone();
        if let Some(version) = &meta.android_version {
            device.push_str(&format!(", Android {}", version));
        }
        if let Some(build_id) = &meta.build_id {
            device.push_str(&format!(", build {}", build_id));
        }
        out.push_str(&format!("Device:    {}\n", device));
    }
    if let Some(fingerprint) = &meta.device_fingerprint {
        out.push_str(&format!("Fingerprint: {}\n", fingerprint));
    }
    if let Some(host) = &meta.host_name {
        out.push_str(&format!("Host:      {}\n", host));
    }
    if let Some(start) = meta.start_datetime() {
        out.push_str(&format!(
            "Started:   {}\n",
            start.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(end) = meta.end_datetime() {
        out.push_str(&format!(
            "Finished:  {}\n",
            end.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    out.push_str(&format!(
        "Modules:   {} total, {} passed, {} failed\n",
        stats.total_modules, stats.passed_modules, stats.failed_modules
    ));
    out.push_str(&format!(
        "Tests:     {} total, {} passed, {} failed, {} ignored\n",
        stats.total_tests, stats.passed_tests, stats.failed_tests, stats.ignored_tests
    ));
    if let Some(rate) = stats.pass_rate() {
        out.push_str(&format!("Pass rate: {:.1}%\n", rate * 100.0));
    }
    out
}

//! Run report output
//!
//! Presentation only: every verdict is already decided in the
//! [`PerfReport`] handed in.
//!
//! # Output Formats
//!
//! - **JSON**: Machine-readable format for CI integration
//! - **Console**: Human-readable tables with per-page status
//!
//! # Example
//!
//! ```no_run
//! use pageload_harness::reporter::{OutputFormat, Reporter};
//! use pageload_harness::runner::PerfReport;
//!
//! # fn example(report: PerfReport) -> anyhow::Result<()> {
//! let reporter = Reporter::new(OutputFormat::Console);
//! reporter.report(&report)?;
//!
//! // Or write to a file
//! Reporter::new(OutputFormat::JsonPretty)
//!     .write_to_file(&report, "perf.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::runner::PerfReport;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// Output format for run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Tables for a terminal
    #[default]
    Console,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "json_pretty" => Ok(OutputFormat::JsonPretty),
            "console" => Ok(OutputFormat::Console),
            other => anyhow::bail!("unknown output format: {}", other),
        }
    }
}

/// Writes a [`PerfReport`] in one [`OutputFormat`]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report to stdout
    pub fn report(&self, report: &PerfReport) -> Result<()> {
        let output = self.format_results(report)?;
        print!("{}", output);
        io::stdout().flush()?;
        Ok(())
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, report: &PerfReport, path: P) -> Result<()> {
        let path = path.as_ref();
        let output = self.format_results(report)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    pub fn format_results(&self, report: &PerfReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(report, false),
            OutputFormat::JsonPretty => JsonReporter::format(report, true),
            OutputFormat::Console => ConsoleReporter::format(report),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

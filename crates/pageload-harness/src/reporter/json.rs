//! JSON reporter

use anyhow::Result;

use crate::runner::PerfReport;

/// JSON format reporter
pub struct JsonReporter;

impl JsonReporter {
    /// Serialize the whole report, optionally pretty-printed
    pub fn format(report: &PerfReport, pretty: bool) -> Result<String> {
        let output = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(output)
    }
}

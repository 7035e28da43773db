//! Navigation timing extraction
//!
//! Converts the browser's navigation timing data into a [`MetricRecord`].
//! The primary source is the `navigation` performance entry of the current
//! document; browsers without it fall back to the legacy `performance.timing`
//! object. Both are exposed by the driver as a [`RawNavigationTiming`].
//!
//! Values are passed through as reported. Under throttling the browser can
//! report events out of order, so nothing here clamps or validates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

use crate::driver::PageDriver;
use crate::error::{PerfError, Result};

/// In-page script that reads the raw timestamps for the current document.
///
/// The payload is wrapped as `{ timing: ... }`; `timing` is `null` when
/// neither timing source exists.
pub const NAVIGATION_TIMING_SCRIPT: &str = r#"(() => {
    const entries = performance.getEntriesByType('navigation');
    if (entries.length > 0) {
        const nav = entries[0];
        return { timing: {
            source: 'navigation',
            origin: nav.requestStart,
            response_start: nav.responseStart,
            dom_interactive: nav.domInteractive,
            dom_content_loaded_event_end: nav.domContentLoadedEventEnd,
            load_event_end: nav.loadEventEnd
        } };
    }
    const t = performance.timing;
    if (!t) {
        return { timing: null };
    }
    return { timing: {
        source: 'legacy',
        origin: t.navigationStart,
        response_start: t.responseStart,
        dom_interactive: t.domInteractive,
        dom_content_loaded_event_end: t.domContentLoadedEventEnd,
        load_event_end: t.loadEventEnd
    } };
})()"#;

/// Timing of one navigation, in milliseconds relative to the request start
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    pub time_to_first_byte: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded: f64,
    pub load_complete: f64,
}

impl MetricRecord {
    pub fn new(
        time_to_first_byte: f64,
        dom_interactive: f64,
        dom_content_loaded: f64,
        load_complete: f64,
    ) -> Self {
        Self {
            time_to_first_byte,
            dom_interactive,
            dom_content_loaded,
            load_complete,
        }
    }
}

impl From<RawNavigationTiming> for MetricRecord {
    fn from(raw: RawNavigationTiming) -> Self {
        MetricRecord {
            time_to_first_byte: raw.response_start - raw.origin,
            dom_interactive: raw.dom_interactive - raw.origin,
            dom_content_loaded: raw.dom_content_loaded_event_end - raw.origin,
            load_complete: raw.load_event_end - raw.origin,
        }
    }
}

/// The metrics tracked per navigation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Ttfb,
    DomInteractive,
    DomContentLoaded,
    LoadComplete,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Ttfb,
        Metric::DomInteractive,
        Metric::DomContentLoaded,
        Metric::LoadComplete,
    ];

    /// Read this metric from a record
    pub fn value(self, record: &MetricRecord) -> f64 {
        match self {
            Metric::Ttfb => record.time_to_first_byte,
            Metric::DomInteractive => record.dom_interactive,
            Metric::DomContentLoaded => record.dom_content_loaded,
            Metric::LoadComplete => record.load_complete,
        }
    }

    /// Stable key, as used in configuration files
    pub fn key(self) -> &'static str {
        match self {
            Metric::Ttfb => "ttfb",
            Metric::DomInteractive => "dom_interactive",
            Metric::DomContentLoaded => "dom_content_loaded",
            Metric::LoadComplete => "load_complete",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Ttfb => "TTFB",
            Metric::DomInteractive => "DOM Interactive",
            Metric::DomContentLoaded => "DOMContentLoaded",
            Metric::LoadComplete => "Load Complete",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which browser API produced a timing payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    /// `performance.getEntriesByType('navigation')[0]`
    Navigation,
    /// `performance.timing`
    Legacy,
}

/// Raw timestamps as read from the page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RawNavigationTiming {
    pub source: TimingSource,
    /// `requestStart` for navigation entries, `navigationStart` for legacy timing
    pub origin: f64,
    pub response_start: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded_event_end: f64,
    pub load_event_end: f64,
}

/// Wire shape of [`NAVIGATION_TIMING_SCRIPT`]'s result
#[derive(Debug, Deserialize)]
pub struct TimingEnvelope {
    pub timing: Option<RawNavigationTiming>,
}

/// Read one [`MetricRecord`] from a page that has finished loading.
///
/// # Errors
///
/// Returns [`PerfError::Collection`] if the driver query fails or the page
/// exposes no timing data at all.
#[instrument(skip(driver))]
pub async fn extract<D: PageDriver>(driver: &D, url: &str) -> Result<MetricRecord> {
    let raw = driver
        .navigation_timing()
        .await?
        .ok_or_else(|| PerfError::collection(url, "no navigation timing available"))?;

    let record = MetricRecord::from(raw);
    debug!(
        source = ?raw.source,
        ttfb = record.time_to_first_byte,
        load = record.load_complete,
        "Extracted navigation timing"
    );
    Ok(record)
}

//! Browser driver seam
//!
//! The harness talks to the browser only through [`PageDriver`]: one
//! navigation primitive, cookie clearing, and one typed query per kind of
//! data it reads from the page. [`ChromeDriver`] implements it over the
//! Chrome DevTools Protocol; tests substitute a scripted driver.
//!
//! A driver owns a single page. Callers must not navigate it concurrently:
//! navigation timing is scoped to the current document, so overlapping
//! navigations would read the wrong entry.

pub mod chrome;

use std::time::Duration;

use crate::error::Result;
use crate::timing::RawNavigationTiming;

pub use chrome::{ChromeDriver, ChromeOptions};

/// `performance.getEntriesByType('resource').length`
pub const RESOURCE_COUNT_SCRIPT: &str =
    "(() => performance.getEntriesByType('resource').length)()";

/// Bytes transferred for all resources plus the document itself
pub const TRANSFER_BYTES_SCRIPT: &str = r#"(() => {
    const resources = performance.getEntriesByType('resource');
    const total = resources.reduce((sum, r) => sum + (r.transferSize || 0), 0);
    const nav = performance.getEntriesByType('navigation')[0];
    return total + (nav ? (nav.transferSize || 0) : 0);
})()"#;

/// Number of element nodes in the current document
pub const DOM_NODE_COUNT_SCRIPT: &str = "(() => document.getElementsByTagName('*').length)()";

/// Operations the harness needs from a browser page.
///
/// Every failure is reported as [`PerfError::Collection`](crate::error::PerfError::Collection)
/// so the caller can decide between skipping the page and aborting the run.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigate to `url` and return once the load event has fired.
    ///
    /// Implementations bound this by their own navigation timeout.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Clear cookies of the browsing context
    async fn clear_cookies(&self) -> Result<()>;

    /// Raw navigation timing of the current document, `None` if the page
    /// exposes neither the navigation entry nor legacy timing.
    async fn navigation_timing(&self) -> Result<Option<RawNavigationTiming>>;

    /// Number of resource entries loaded by the current document
    async fn resource_count(&self) -> Result<u64>;

    /// Total transferred bytes (resources plus document)
    async fn transfer_bytes(&self) -> Result<u64>;

    async fn dom_node_count(&self) -> Result<u64>;

    /// Pause before reading timing after the load event.
    async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

//! Repeated page loads for one URL
//!
//! Iterations run strictly one after another on the driver's single page.
//! Cookies are cleared before every navigation so later iterations do not
//! benefit from state left by earlier ones, and a short settle delay after
//! the load event lets the browser finish populating `loadEventEnd`.

use std::time::Duration;
use tracing::{debug, instrument};

use crate::driver::PageDriver;
use crate::error::{PerfError, Result};
use crate::stats::SampleSet;
use crate::timing;

/// Default pause between the load event and reading timing
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Collects a [`SampleSet`] by loading a URL repeatedly
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    settle_delay: Duration,
    clear_cookies: bool,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            clear_cookies: true,
        }
    }
}

impl Sampler {
    pub fn new(settle_delay: Duration, clear_cookies: bool) -> Self {
        Self {
            settle_delay,
            clear_cookies,
        }
    }

    /// Load `url` `iterations` times and record the timing of each load.
    ///
    /// # Errors
    ///
    /// - [`PerfError::InvalidConfig`] if `iterations` is zero
    /// - [`PerfError::Collection`] from the first iteration that fails; the
    ///   samples gathered so far are discarded rather than returned short
    #[instrument(skip(self, driver))]
    pub async fn collect<D: PageDriver>(
        &self,
        driver: &D,
        url: &str,
        iterations: u32,
    ) -> Result<SampleSet> {
        if iterations == 0 {
            return Err(PerfError::InvalidConfig(
                "iterations must be at least 1".to_string(),
            ));
        }

        let mut samples = SampleSet::default();
        for iteration in 0..iterations {
            if self.clear_cookies {
                driver.clear_cookies().await?;
            }

            driver.navigate(url).await?;
            driver.settle(self.settle_delay).await;

            let record = timing::extract(driver, url).await?;
            debug!(
                iteration = iteration + 1,
                ttfb = record.time_to_first_byte,
                load = record.load_complete,
                "Collected sample"
            );
            samples.push(record);
        }

        Ok(samples)
    }
}

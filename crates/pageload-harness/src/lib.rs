//! Page-load performance harness
//!
//! Loads each page of a site repeatedly in a real browser, reads the W3C
//! Navigation Timing entry after every load, and judges the results against
//! fixed limits so that regressions fail a CI run.
//!
//! # Features
//!
//! - **Navigation Timing**: TTFB, DOM interactive, DOMContentLoaded and load
//!   complete per load, relative to the request start
//! - **Deterministic Statistics**: mean and nearest-rank p90, per page and
//!   over all pages' samples
//! - **Outlier Detection**: every raw load checked against an absolute ceiling
//! - **Resource Budgets**: request count, transfer size and DOM size
//! - **Output Formats**: Console tables and JSON
//!
//! # Example
//!
//! ```no_run
//! use pageload_harness::{Config, PerfRunner, reporter::{OutputFormat, Reporter}};
//! use pageload_harness::driver::{ChromeDriver, ChromeOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("site.toml")?;
//!
//! let driver = ChromeDriver::launch(ChromeOptions {
//!     navigation_timeout: config.run.navigation_timeout,
//!     ..ChromeOptions::default()
//! })
//! .await?;
//! let runner = PerfRunner::new(driver);
//! let report = runner.run(&config).await?;
//!
//! Reporter::new(OutputFormat::Console).report(&report)?;
//! runner.into_driver().close().await?;
//! std::process::exit(report.exit_code());
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [run]
//! name = "Site performance"
//! base_url = "http://localhost:4000"
//! pages = ["/", "/about/"]
//! iterations = 10
//!
//! [thresholds.avg]
//! load_complete = 1000.0
//!
//! [thresholds.p90]
//! load_complete = 1500.0
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod evaluate;
pub mod reporter;
pub mod runner;
pub mod sampler;
pub mod stats;
pub mod timing;

// Re-export main types for convenience
pub use config::{Config, SkipPolicy, ThresholdPolicy};
pub use error::{PerfError, Result};
pub use evaluate::{Check, CheckResult, Evaluator, Outlier, Verdict};
pub use reporter::{OutputFormat, Reporter};
pub use runner::{PageReport, PageStatus, PerfReport, PerfRunner};
pub use sampler::Sampler;
pub use stats::{aggregate, MetricSummary, SampleSet};
pub use timing::{Metric, MetricRecord};

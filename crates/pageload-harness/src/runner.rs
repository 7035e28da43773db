//! Run orchestration
//!
//! Drives one [`PageDriver`] through every configured page, in order, one
//! navigation at a time:
//!
//! ```text
//! for each page:  Sampler ──► SampleSet ──► aggregate ──► Evaluator ──► PageReport
//!                                  │
//! all pages:      concat ──────────┴──────► aggregate ──► Evaluator ──► AggregateReport
//! budget page:    navigate ──► ResourceSnapshot ──────────► Evaluator ──► BudgetReport
//! ```
//!
//! A page whose collection fails is retried `retries` times, then either
//! marked SKIPPED (lenient policy) or aborts the run (strict policy).
//! Skipped pages are left out of the page-set aggregate.
//!
//! # Example
//!
//! ```no_run
//! use pageload_harness::{Config, PerfRunner};
//! use pageload_harness::driver::{ChromeDriver, ChromeOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_file("site.toml")?;
//! let driver = ChromeDriver::launch(ChromeOptions::default()).await?;
//! let runner = PerfRunner::new(driver);
//! let report = runner.run(&config).await?;
//!
//! for page in &report.pages {
//!     println!("{}: {:?}", page.path, page.status);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::{Config, SkipPolicy, ThresholdPolicy};
use crate::driver::PageDriver;
use crate::error::Result;
use crate::evaluate::{CheckResult, Evaluator, Outlier, ResourceSnapshot};
use crate::sampler::Sampler;
use crate::stats::{aggregate, MetricSummary, SampleSet};

/// Results from a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfReport {
    /// Name of the run
    pub suite_name: String,
    /// Base URL that was tested
    pub base_url: String,
    /// Configuration used for the run
    pub config_summary: ConfigSummary,
    /// Results for each page, in configured order
    pub pages: Vec<PageReport>,
    /// Results over all evaluated pages' samples; `None` if every page was skipped
    pub aggregate: Option<AggregateReport>,
    /// Resource budget results; `None` when budgets are disabled
    pub budgets: Option<BudgetReport>,
    /// Every load above the outlier ceiling, across all pages
    pub outliers: Vec<Outlier>,
    /// Total duration of the run
    pub total_duration_ms: u64,
    /// Whether the run passed
    pub passed: bool,
    /// Human-readable reasons the run failed
    pub failures: Vec<String>,
    /// Timestamp when the run started
    pub started_at: String,
}

impl PerfReport {
    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            0
        } else {
            1
        }
    }

    /// Pages that produced samples
    pub fn evaluated_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| p.status != PageStatus::Skipped)
    }

    pub fn skipped_pages(&self) -> impl Iterator<Item = &PageReport> {
        self.pages.iter().filter(|p| p.status == PageStatus::Skipped)
    }
}

/// Summary of the configuration used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Loads per page
    pub iterations: u32,
    /// Number of configured pages
    pub page_count: usize,
    pub settle_delay_ms: u64,
    pub clear_cookies: bool,
    pub retries: u32,
    pub skip_policy: SkipPolicy,
    /// Limits the run was judged against
    pub thresholds: ThresholdPolicy,
}

/// Roll-up status of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageStatus {
    Pass,
    Fail,
    Skipped,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Pass => "PASS",
            PageStatus::Fail => "FAIL",
            PageStatus::Skipped => "SKIPPED",
        }
    }
}

/// Results for a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// Configured path
    pub path: String,
    /// URL that was loaded
    pub url: String,
    pub status: PageStatus,
    /// Why the page was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// Statistics; `None` for skipped pages
    pub summary: Option<MetricSummary>,
    /// Raw samples in collection order
    #[serde(default)]
    pub samples: SampleSet,
    /// Average and p90 verdicts
    pub checks: Vec<CheckResult>,
    /// Loads of this page above the outlier ceiling
    pub outliers: Vec<Outlier>,
    /// Collection attempts made (1 + retries used)
    pub attempts: u32,
    pub duration_ms: u64,
}

/// Results over the concatenated samples of all evaluated pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub page_count: usize,
    pub summary: MetricSummary,
    pub checks: Vec<CheckResult>,
}

/// Resource budget results for the budget page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReport {
    pub page: String,
    /// Measured values; `None` if the snapshot could not be taken
    pub snapshot: Option<ResourceSnapshot>,
    pub checks: Vec<CheckResult>,
}

/// Runs a configured measurement against one driver
pub struct PerfRunner<D> {
    driver: D,
}

impl<D: PageDriver> PerfRunner<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Give the driver back, e.g. to close the browser
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Measure every configured page and evaluate the results
    ///
    /// # Errors
    ///
    /// - [`crate::error::PerfError::InvalidConfig`] if the configuration is out of range
    /// - [`crate::error::PerfError::Collection`] under the strict skip policy
    /// - [`crate::error::PerfError::EmptySampleSet`] if a collection returned no samples
    #[instrument(skip(self, config), fields(suite = %config.run.name))]
    pub async fn run(&self, config: &Config) -> Result<PerfReport> {
        config.validate()?;

        let start_time = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();
        let policy = config.policy();
        let evaluator = Evaluator::new(&policy);
        let sampler = Sampler::new(config.run.settle_delay, config.run.clear_cookies);

        info!(
            "Starting run '{}' with {} pages x {} iterations",
            config.run.name,
            config.run.pages.len(),
            config.run.iterations
        );

        let mut pages = Vec::with_capacity(config.run.pages.len());
        for path in &config.run.pages {
            let page = self.run_page(config, &sampler, &evaluator, path).await?;
            pages.push(page);
        }

        let evaluated: Vec<&PageReport> = pages
            .iter()
            .filter(|p| p.status != PageStatus::Skipped)
            .collect();

        let aggregate_report = if evaluated.is_empty() {
            None
        } else {
            let all_samples = SampleSet::concat(evaluated.iter().map(|p| &p.samples));
            let summary = aggregate(&all_samples)?;
            let checks = evaluator.check_summary(&summary);
            Some(AggregateReport {
                page_count: evaluated.len(),
                summary,
                checks,
            })
        };

        let budgets = if config.run.check_budgets {
            Some(self.run_budgets(config, &evaluator).await?)
        } else {
            None
        };

        let outliers: Vec<Outlier> = pages
            .iter()
            .flat_map(|p| p.outliers.iter().cloned())
            .collect();

        let mut failures = Vec::new();
        for page in &pages {
            for check in &page.checks {
                if let Some(message) = check.failure_message() {
                    failures.push(format!("{}: {}", page.path, message));
                }
            }
        }
        if let Some(report) = &aggregate_report {
            for check in &report.checks {
                if let Some(message) = check.failure_message() {
                    failures.push(format!("All pages: {}", message));
                }
            }
        }
        if let Some(report) = &budgets {
            for check in &report.checks {
                if let Some(message) = check.failure_message() {
                    failures.push(format!("{}: {}", report.page, message));
                }
            }
        }
        if !outliers.is_empty() {
            failures.push(format!(
                "Found {} loads exceeding {:.0}ms: {}",
                outliers.len(),
                policy.max_load_time,
                outliers
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if evaluated.is_empty() && !config.run.allow_no_evaluated_pages {
            failures.push("No pages were evaluated: every page was skipped".to_string());
        }

        let passed = failures.is_empty();
        let total_duration = start_time.elapsed();

        let report = PerfReport {
            suite_name: config.run.name.clone(),
            base_url: config.run.base_url.clone(),
            config_summary: ConfigSummary {
                iterations: config.run.iterations,
                page_count: config.run.pages.len(),
                settle_delay_ms: config.run.settle_delay.as_millis() as u64,
                clear_cookies: config.run.clear_cookies,
                retries: config.run.retries,
                skip_policy: config.run.skip_policy,
                thresholds: policy,
            },
            pages,
            aggregate: aggregate_report,
            budgets,
            outliers,
            total_duration_ms: total_duration.as_millis() as u64,
            passed,
            failures,
            started_at,
        };

        if report.passed {
            info!(
                "Run '{}' completed successfully in {}ms",
                config.run.name, report.total_duration_ms
            );
        } else {
            warn!(
                "Run '{}' completed with {} failures",
                config.run.name,
                report.failures.len()
            );
        }

        Ok(report)
    }

    /// Collect and evaluate one page
    #[instrument(skip(self, config, sampler, evaluator))]
    async fn run_page(
        &self,
        config: &Config,
        sampler: &Sampler,
        evaluator: &Evaluator<'_>,
        path: &str,
    ) -> Result<PageReport> {
        let start_time = Instant::now();
        let url = config.page_url(path);
        info!("Measuring page: {}", url);

        let (collected, attempts) = self.collect_with_retries(config, sampler, &url).await;

        let samples = match collected {
            Ok(samples) => samples,
            Err(e) if e.is_collection() && config.run.skip_policy == SkipPolicy::Lenient => {
                warn!("Skipping {}: {}", path, e);
                return Ok(PageReport {
                    path: path.to_string(),
                    url,
                    status: PageStatus::Skipped,
                    skip_reason: Some(e.to_string()),
                    summary: None,
                    samples: SampleSet::default(),
                    checks: Vec::new(),
                    outliers: Vec::new(),
                    attempts,
                    duration_ms: start_time.elapsed().as_millis() as u64,
                });
            }
            Err(e) => return Err(e),
        };

        let summary = aggregate(&samples)?;
        let checks = evaluator.check_summary(&summary);
        let outliers = evaluator.find_outliers(path, &samples);

        for outlier in &outliers {
            warn!("Outlier load: {}", outlier);
        }

        let status = if checks.iter().any(|c| c.verdict.is_fail()) {
            PageStatus::Fail
        } else {
            PageStatus::Pass
        };

        Ok(PageReport {
            path: path.to_string(),
            url,
            status,
            skip_reason: None,
            summary: Some(summary),
            samples,
            checks,
            outliers,
            attempts,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    /// Sample a page, retrying the whole page on collection failures
    async fn collect_with_retries(
        &self,
        config: &Config,
        sampler: &Sampler,
        url: &str,
    ) -> (Result<SampleSet>, u32) {
        let max_attempts = config.run.retries + 1;
        let mut attempt = 1;
        loop {
            let result = sampler
                .collect(&self.driver, url, config.run.iterations)
                .await;
            match result {
                Err(e) if e.is_collection() && attempt < max_attempts => {
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt, max_attempts, url, e
                    );
                    attempt += 1;
                }
                other => return (other, attempt),
            }
        }
    }

    /// Snapshot the budget page and evaluate resource ceilings
    #[instrument(skip(self, config, evaluator))]
    async fn run_budgets(
        &self,
        config: &Config,
        evaluator: &Evaluator<'_>,
    ) -> Result<BudgetReport> {
        let path = config.run.budget_page.clone();
        let url = config.page_url(&path);

        match self.snapshot(&url).await {
            Ok(snapshot) => {
                info!(
                    resources = snapshot.resource_count,
                    transfer_bytes = snapshot.transfer_bytes,
                    dom_nodes = snapshot.dom_nodes,
                    "Resource snapshot of {}",
                    url
                );
                Ok(BudgetReport {
                    page: path,
                    checks: evaluator.check_budgets(&snapshot),
                    snapshot: Some(snapshot),
                })
            }
            Err(e) if e.is_collection() && config.run.skip_policy == SkipPolicy::Lenient => {
                warn!("Skipping resource budgets for {}: {}", path, e);
                Ok(BudgetReport {
                    page: path,
                    snapshot: None,
                    checks: evaluator.skipped_budgets(&e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn snapshot(&self, url: &str) -> Result<ResourceSnapshot> {
        self.driver.navigate(url).await?;
        Ok(ResourceSnapshot {
            resource_count: self.driver.resource_count().await?,
            transfer_bytes: self.driver.transfer_bytes().await?,
            dom_nodes: self.driver.dom_node_count().await?,
        })
    }
}

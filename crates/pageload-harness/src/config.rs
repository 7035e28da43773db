//! Configuration parsing for page-load runs
//!
//! A run is configured with a TOML file naming the site, the pages to load,
//! the sampling parameters, and the limits the results are judged against.
//! The parsed [`Config`] is immutable for the lifetime of a run; the limits
//! are handed to the evaluator as a [`ThresholdPolicy`].

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{PerfError, Result};
use crate::timing::Metric;

/// Main configuration structure loaded from TOML files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// What to load and how
    pub run: RunConfig,
    /// Timing limits
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Single-load resource ceilings
    #[serde(default)]
    pub budgets: ResourceBudgets,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Required fields are missing or values are out of range
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pageload_harness::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = Config::from_file("site.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Example
    ///
    /// ```
    /// use pageload_harness::config::Config;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let toml = r#"
    ///     [run]
    ///     name = "Blog"
    ///     base_url = "http://localhost:4000"
    ///     pages = ["/", "/about/"]
    /// "#;
    /// let config = Config::from_str(toml)?;
    /// assert_eq!(config.run.iterations, 10);
    /// # Ok(())
    /// # }
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.run.base_url.trim().is_empty() {
            return Err(PerfError::InvalidConfig("base_url must not be empty".into()));
        }
        if self.run.pages.is_empty() {
            return Err(PerfError::InvalidConfig("at least one page is required".into()));
        }
        if self.run.iterations == 0 {
            return Err(PerfError::InvalidConfig("iterations must be at least 1".into()));
        }
        if !(self.thresholds.max_load_time.is_finite() && self.thresholds.max_load_time > 0.0) {
            return Err(PerfError::InvalidConfig(format!(
                "max_load_time must be a positive number (got {})",
                self.thresholds.max_load_time
            )));
        }
        for (kind, limits) in [("avg", &self.thresholds.avg), ("p90", &self.thresholds.p90)] {
            for (metric, limit) in limits.iter() {
                if !limit.is_finite() || limit <= 0.0 {
                    return Err(PerfError::InvalidConfig(format!(
                        "{} limit for {} must be a positive number (got {})",
                        kind,
                        metric.key(),
                        limit
                    )));
                }
            }
        }
        Ok(())
    }

    /// The limits of this run as an evaluator policy
    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            avg: self.thresholds.avg.clone(),
            p90: self.thresholds.p90.clone(),
            max_load_time: self.thresholds.max_load_time,
            budgets: self.budgets.clone(),
        }
    }

    /// Full URL for a configured page path
    pub fn page_url(&self, path: &str) -> String {
        resolve_url(&self.run.base_url, path)
    }
}

/// Join a page path onto the base URL; absolute URLs are returned unchanged
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Name shown in reports
    pub name: String,
    /// Site root, e.g. `http://localhost:4000`
    pub base_url: String,
    /// Page paths in measurement order
    #[serde(default = "default_pages")]
    pub pages: Vec<String>,
    /// Loads per page (default: 10)
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Pause after the load event before reading timing (default: 50ms)
    #[serde(
        rename = "settle_delay_ms",
        with = "duration_ms",
        default = "default_settle_delay"
    )]
    pub settle_delay: Duration,
    /// Clear cookies before every load (default: true)
    #[serde(default = "default_true")]
    pub clear_cookies: bool,
    /// Upper bound for one navigation (default: 30s)
    #[serde(
        rename = "navigation_timeout_ms",
        with = "duration_ms",
        default = "default_navigation_timeout"
    )]
    pub navigation_timeout: Duration,
    /// Extra attempts for a page whose collection failed (default: 0)
    #[serde(default)]
    pub retries: u32,
    /// What to do with a page that still fails after retries
    #[serde(default)]
    pub skip_policy: SkipPolicy,
    /// Treat a run where every page was skipped as passing (default: false)
    #[serde(default)]
    pub allow_no_evaluated_pages: bool,
    /// Page used for the resource budget snapshot (default: "/")
    #[serde(default = "default_budget_page")]
    pub budget_page: String,
    /// Run the resource budget checks (default: true)
    #[serde(default = "default_true")]
    pub check_budgets: bool,
}

fn default_pages() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_iterations() -> u32 {
    10
}

fn default_settle_delay() -> Duration {
    crate::sampler::DEFAULT_SETTLE_DELAY
}

fn default_navigation_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_budget_page() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

/// Handling of pages whose collection failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkipPolicy {
    /// Mark the page SKIPPED and continue with the remaining pages
    #[default]
    Lenient,
    /// Abort the run with the collection error
    Strict,
}

/// Optional limit per metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_interactive: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_complete: Option<f64>,
}

impl MetricLimits {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ttfb => self.ttfb,
            Metric::DomInteractive => self.dom_interactive,
            Metric::DomContentLoaded => self.dom_content_loaded,
            Metric::LoadComplete => self.load_complete,
        }
    }

    /// Configured limits in metric order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(move |metric| self.get(metric).map(|limit| (metric, limit)))
    }
}

/// Timing limits in milliseconds
///
/// Writing an `[thresholds.avg]` or `[thresholds.p90]` table replaces the
/// default limits of that kind; metrics left out of the table are unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_avg_limits")]
    pub avg: MetricLimits,
    #[serde(default = "default_p90_limits")]
    pub p90: MetricLimits,
    /// Ceiling for any single load's `load_complete`
    #[serde(default = "default_max_load_time")]
    pub max_load_time: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            avg: default_avg_limits(),
            p90: default_p90_limits(),
            max_load_time: default_max_load_time(),
        }
    }
}

fn default_avg_limits() -> MetricLimits {
    MetricLimits {
        ttfb: Some(100.0),
        dom_interactive: None,
        dom_content_loaded: Some(500.0),
        load_complete: Some(1000.0),
    }
}

fn default_p90_limits() -> MetricLimits {
    MetricLimits {
        ttfb: Some(200.0),
        dom_interactive: None,
        dom_content_loaded: Some(800.0),
        load_complete: Some(1500.0),
    }
}

fn default_max_load_time() -> f64 {
    3000.0
}

/// Ceilings checked against one snapshot of a loaded page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBudgets {
    #[serde(default = "default_max_resources")]
    pub max_resources: u64,
    #[serde(default = "default_max_transfer_bytes")]
    pub max_transfer_bytes: u64,
    #[serde(default = "default_max_dom_nodes")]
    pub max_dom_nodes: u64,
}

impl Default for ResourceBudgets {
    fn default() -> Self {
        Self {
            max_resources: default_max_resources(),
            max_transfer_bytes: default_max_transfer_bytes(),
            max_dom_nodes: default_max_dom_nodes(),
        }
    }
}

fn default_max_resources() -> u64 {
    20
}

fn default_max_transfer_bytes() -> u64 {
    500 * 1024
}

fn default_max_dom_nodes() -> u64 {
    1500
}

/// Every limit the evaluator judges a run against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub avg: MetricLimits,
    pub p90: MetricLimits,
    /// Outlier ceiling for raw `load_complete` samples
    pub max_load_time: f64,
    pub budgets: ResourceBudgets,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        let thresholds = ThresholdsConfig::default();
        Self {
            avg: thresholds.avg,
            p90: thresholds.p90,
            max_load_time: thresholds.max_load_time,
            budgets: ResourceBudgets::default(),
        }
    }
}

/// Serde module for serializing/deserializing Duration as milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

//! Threshold evaluation
//!
//! Turns summaries, raw samples and resource snapshots into verdicts. A
//! check fails only when the measured value exceeds its limit; a value equal
//! to the limit passes.
//! Average and p90 checks run independently; a page can pass one and fail
//! the other.
//!
//! Outliers are judged on raw samples, not on the aggregate: a single
//! catastrophic load disappears inside an average of many fast loads.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ThresholdPolicy;
use crate::stats::{MetricSummary, SampleSet, Statistic};
use crate::timing::Metric;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail { measured: f64, limit: f64 },
    Skipped { reason: String },
}

impl Verdict {
    /// `Fail` iff `measured > limit`
    pub fn compare(measured: f64, limit: f64) -> Self {
        if measured <= limit {
            Verdict::Pass
        } else {
            Verdict::Fail { measured, limit }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Verdict::Skipped { .. })
    }
}

/// What a verdict was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "metric", rename_all = "snake_case")]
pub enum Check {
    Average(Metric),
    P90(Metric),
    ResourceCount,
    TransferBytes,
    DomNodes,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Average(metric) => write!(f, "{} avg", metric.label()),
            Check::P90(metric) => write!(f, "{} P90", metric.label()),
            Check::ResourceCount => f.write_str("Resource count"),
            Check::TransferBytes => f.write_str("Transfer size"),
            Check::DomNodes => f.write_str("DOM nodes"),
        }
    }
}

/// A check together with its verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check: Check,
    pub verdict: Verdict,
}

impl CheckResult {
    /// Human-readable failure line, `None` unless the verdict is `Fail`
    pub fn failure_message(&self) -> Option<String> {
        match &self.verdict {
            Verdict::Fail { measured, limit } => Some(match self.check {
                Check::Average(_) | Check::P90(_) => {
                    format!("{} {:.0}ms exceeds {:.0}ms", self.check, measured, limit)
                }
                Check::TransferBytes => format!(
                    "{} {:.1}KB exceeds {:.0}KB",
                    self.check,
                    measured / 1024.0,
                    limit / 1024.0
                ),
                Check::ResourceCount | Check::DomNodes => {
                    format!("{} {:.0} exceeds {:.0}", self.check, measured, limit)
                }
            }),
            _ => None,
        }
    }
}

/// A single load slower than the outlier ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub page: String,
    /// Zero-based position in the page's sample set
    pub iteration: usize,
    /// `load_complete` of that load, in milliseconds
    pub value: f64,
}

impl fmt::Display for Outlier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} run {}: {:.0}ms", self.page, self.iteration + 1, self.value)
    }
}

/// One measurement of a loaded page's weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub resource_count: u64,
    pub transfer_bytes: u64,
    pub dom_nodes: u64,
}

/// Applies a [`ThresholdPolicy`] to measurements
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    policy: &'a ThresholdPolicy,
}

impl<'a> Evaluator<'a> {
    pub fn new(policy: &'a ThresholdPolicy) -> Self {
        Self { policy }
    }

    /// One verdict per metric with a configured average limit
    pub fn check_averages(&self, summary: &MetricSummary) -> Vec<CheckResult> {
        self.check_statistic(summary, Statistic::Avg)
    }

    /// One verdict per metric with a configured p90 limit
    pub fn check_p90(&self, summary: &MetricSummary) -> Vec<CheckResult> {
        self.check_statistic(summary, Statistic::P90)
    }

    /// Average checks followed by p90 checks
    pub fn check_summary(&self, summary: &MetricSummary) -> Vec<CheckResult> {
        let mut results = self.check_averages(summary);
        results.extend(self.check_p90(summary));
        results
    }

    fn check_statistic(&self, summary: &MetricSummary, statistic: Statistic) -> Vec<CheckResult> {
        let limits = match statistic {
            Statistic::Avg => &self.policy.avg,
            Statistic::P90 => &self.policy.p90,
        };

        limits
            .iter()
            .map(|(metric, limit)| CheckResult {
                check: match statistic {
                    Statistic::Avg => Check::Average(metric),
                    Statistic::P90 => Check::P90(metric),
                },
                verdict: Verdict::compare(summary.stats(metric).get(statistic), limit),
            })
            .collect()
    }

    /// Every sample whose `load_complete` is above the ceiling.
    ///
    /// A load exactly at the ceiling is not an outlier.
    pub fn find_outliers(&self, page: &str, samples: &SampleSet) -> Vec<Outlier> {
        samples
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| record.load_complete > self.policy.max_load_time)
            .map(|(iteration, record)| Outlier {
                page: page.to_string(),
                iteration,
                value: record.load_complete,
            })
            .collect()
    }

    /// Resource count, transfer size and DOM size against their ceilings.
    ///
    /// A value equal to its ceiling passes, the same inclusive boundary as
    /// the timing limits.
    pub fn check_budgets(&self, snapshot: &ResourceSnapshot) -> Vec<CheckResult> {
        let budgets = &self.policy.budgets;
        [
            (Check::ResourceCount, snapshot.resource_count, budgets.max_resources),
            (Check::TransferBytes, snapshot.transfer_bytes, budgets.max_transfer_bytes),
            (Check::DomNodes, snapshot.dom_nodes, budgets.max_dom_nodes),
        ]
        .into_iter()
        .map(|(check, measured, limit)| CheckResult {
            check,
            verdict: Verdict::compare(measured as f64, limit as f64),
        })
        .collect()
    }

    /// Budget checks marked skipped, for when the snapshot could not be taken
    pub fn skipped_budgets(&self, reason: &str) -> Vec<CheckResult> {
        [Check::ResourceCount, Check::TransferBytes, Check::DomNodes]
            .into_iter()
            .map(|check| CheckResult {
                check,
                verdict: Verdict::Skipped {
                    reason: reason.to_string(),
                },
            })
            .collect()
    }
}

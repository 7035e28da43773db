//! Reduction of sample sets into per-metric summaries.

use serde::{Deserialize, Serialize};

use super::percentiles::{mean, p90};
use crate::error::{PerfError, Result};
use crate::timing::{Metric, MetricRecord};

/// Ordered samples for one page, or for a page set after [`SampleSet::concat`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    records: Vec<MetricRecord>,
}

impl SampleSet {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        Self { records }
    }

    pub(crate) fn push(&mut self, record: MetricRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of one metric in collection order
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.records.iter().map(|r| metric.value(r)).collect()
    }

    /// Concatenate several sample sets, preserving order.
    ///
    /// Aggregating the result weights every sample equally, so pages with
    /// more iterations weigh more than an average of per-page averages would.
    pub fn concat<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a SampleSet>,
    {
        let records = sets
            .into_iter()
            .flat_map(|set| set.records.iter().copied())
            .collect();
        Self { records }
    }
}

impl From<Vec<MetricRecord>> for SampleSet {
    fn from(records: Vec<MetricRecord>) -> Self {
        Self::new(records)
    }
}

/// Mean and p90 of a single metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub avg: f64,
    pub p90: f64,
}

/// Statistic kinds a threshold can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Avg,
    P90,
}

impl MetricStats {
    pub fn get(&self, statistic: Statistic) -> f64 {
        match statistic {
            Statistic::Avg => self.avg,
            Statistic::P90 => self.p90,
        }
    }
}

/// Per-metric statistics derived from a [`SampleSet`]
///
/// `p90 >= avg` does not hold in general for small sample counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Number of samples the statistics were computed from
    pub count: usize,
    pub ttfb: MetricStats,
    pub dom_interactive: MetricStats,
    pub dom_content_loaded: MetricStats,
    pub load_complete: MetricStats,
}

impl MetricSummary {
    pub fn stats(&self, metric: Metric) -> &MetricStats {
        match metric {
            Metric::Ttfb => &self.ttfb,
            Metric::DomInteractive => &self.dom_interactive,
            Metric::DomContentLoaded => &self.dom_content_loaded,
            Metric::LoadComplete => &self.load_complete,
        }
    }
}

/// Compute mean and nearest-rank p90 for every metric.
///
/// # Errors
///
/// Returns [`PerfError::EmptySampleSet`] for an empty set. An empty set
/// means collection went wrong upstream; a zero-filled summary would pass
/// every threshold.
///
/// # Examples
///
/// ```
/// use pageload_harness::stats::{aggregate, SampleSet};
/// use pageload_harness::timing::MetricRecord;
///
/// let samples = SampleSet::new(vec![
///     MetricRecord::new(10.0, 50.0, 60.0, 100.0),
///     MetricRecord::new(20.0, 70.0, 80.0, 300.0),
/// ]);
/// let summary = aggregate(&samples).unwrap();
/// assert_eq!(summary.load_complete.avg, 200.0);
/// assert_eq!(summary.load_complete.p90, 300.0);
/// ```
pub fn aggregate(samples: &SampleSet) -> Result<MetricSummary> {
    if samples.is_empty() {
        return Err(PerfError::EmptySampleSet);
    }

    let stats = |metric: Metric| -> Result<MetricStats> {
        let values = samples.values(metric);
        Ok(MetricStats {
            avg: mean(&values).ok_or(PerfError::EmptySampleSet)?,
            p90: p90(&values).ok_or(PerfError::EmptySampleSet)?,
        })
    };

    Ok(MetricSummary {
        count: samples.len(),
        ttfb: stats(Metric::Ttfb)?,
        dom_interactive: stats(Metric::DomInteractive)?,
        dom_content_loaded: stats(Metric::DomContentLoaded)?,
        load_complete: stats(Metric::LoadComplete)?,
    })
}

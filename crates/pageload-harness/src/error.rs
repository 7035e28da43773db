use thiserror::Error;

/// Result type for measurement, aggregation and evaluation
pub type Result<T> = std::result::Result<T, PerfError>;

/// Errors raised while collecting or reducing page-load samples.
///
/// Threshold failures and outliers are not errors: they are reported as
/// [`Verdict`](crate::evaluate::Verdict) and [`Outlier`](crate::evaluate::Outlier)
/// values inside the run report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerfError {
    /// Navigation or an in-page query failed for `url`
    #[error("Failed to collect metrics from {url}: {reason}")]
    Collection { url: String, reason: String },

    /// The aggregator was handed a sample set with no records
    #[error("Cannot aggregate an empty sample set")]
    EmptySampleSet,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Browser launch or page creation failed
    #[error("Browser error: {0}")]
    Browser(String),
}

impl PerfError {
    pub fn collection(url: impl Into<String>, reason: impl ToString) -> Self {
        PerfError::Collection {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error came from the browser side of a single page
    /// (and may therefore be skipped under a lenient policy).
    pub fn is_collection(&self) -> bool {
        matches!(self, PerfError::Collection { .. })
    }
}

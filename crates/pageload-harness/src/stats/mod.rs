//! Statistical reduction of page-load samples
//!
//! Only two statistics are computed per metric: the arithmetic mean and the
//! nearest-rank 90th percentile. Page-set figures are computed over the
//! concatenated samples of all pages.
//!
//! # Examples
//!
//! ```
//! use pageload_harness::stats::{aggregate, SampleSet};
//! use pageload_harness::timing::MetricRecord;
//!
//! let home = SampleSet::new(vec![MetricRecord::new(8.0, 40.0, 45.0, 90.0)]);
//! let about = SampleSet::new(vec![
//!     MetricRecord::new(9.0, 44.0, 50.0, 110.0),
//!     MetricRecord::new(7.0, 41.0, 47.0, 100.0),
//! ]);
//!
//! let all = SampleSet::concat([&home, &about]);
//! let summary = aggregate(&all).unwrap();
//! assert_eq!(summary.count, 3);
//! assert_eq!(summary.load_complete.avg, 100.0);
//! ```

pub mod aggregate;
pub mod percentiles;

pub use aggregate::{aggregate, MetricStats, MetricSummary, SampleSet, Statistic};
pub use percentiles::{mean, nearest_rank, p90};

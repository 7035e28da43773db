//! Mean and nearest-rank percentile calculations.

/// Quantile used for the p90 statistic
pub const P90: f64 = 0.9;

/// Arithmetic mean of `values`, `None` if empty.
///
/// # Examples
///
/// ```
/// use pageload_harness::stats::percentiles::mean;
///
/// assert_eq!(mean(&[100.0, 200.0, 300.0]), Some(200.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Nearest-rank percentile without interpolation.
///
/// Sorts the values ascending and returns the element at index
/// `floor(quantile * N)`, clamped to `N - 1`. The result is always one of
/// the input values, which keeps small runs (N of 5 to 10) reproducible.
///
/// # Arguments
///
/// * `values` - Samples in any order
/// * `quantile` - Fraction between 0.0 and 1.0
///
/// # Returns
///
/// * `Some(value)` - The selected sample
/// * `None` - If `values` is empty or `quantile` is outside `[0, 1]`
///
/// # Examples
///
/// ```
/// use pageload_harness::stats::percentiles::nearest_rank;
///
/// let data = vec![5.0, 1.0, 4.0, 2.0, 3.0];
/// assert_eq!(nearest_rank(&data, 0.5), Some(3.0));
/// assert_eq!(nearest_rank(&data, 0.9), Some(5.0));
/// ```
pub fn nearest_rank(values: &[f64], quantile: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&quantile) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let index = ((sorted.len() as f64 * quantile).floor() as usize).min(sorted.len() - 1);
    Some(sorted[index])
}

/// 90th percentile, nearest-rank variant
pub fn p90(values: &[f64]) -> Option<f64> {
    nearest_rank(values, P90)
}

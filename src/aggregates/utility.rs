/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percent change from `previous` to `current`.
///
/// Returns `None` when the change is undefined: a zero or non-finite base.
pub fn pct_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

//! FILENAME: breakdown-engine/src/stats.rs
//! PURPOSE: Statistics helpers for the breakdown post-processing pass.
//! CONTEXT: Quartiles, sample variance, and standard error are resolved
//! from each group's buffered raw values after all groups are formed,
//! not online. Percentiles use the nearest-rank rule (no interpolation).

/// Percentile at rank `k` (0..1): the ascending-sorted value at index
/// `floor(k * (n-1))`. None on an empty buffer.
pub fn percentile(values: &[f64], k: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = (k * (sorted.len() - 1) as f64).floor() as usize;
    sorted.get(index).copied()
}

/// Sample variance: sum of squared deviations from the mean over (n-1).
/// None for fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(sum_sq / (n - 1) as f64)
}

/// Standard error: sqrt(variance / n). None whenever the variance is
/// undefined.
pub fn standard_error(values: &[f64]) -> Option<f64> {
    let variance = sample_variance(values)?;
    Some((variance / values.len() as f64).sqrt())
}

//! Percentile estimation over latency samples
//!
//! Uses linear interpolation between the closest ranks: for a percentile `p`
//! over `n` sorted samples the fractional rank is `k = p/100 * (n - 1)`, and
//! the estimate blends the two samples on either side of `k`.

/// Percentiles reported when nothing else is configured
pub const DEFAULT_PERCENTILES: [f64; 6] = [30.0, 50.0, 70.0, 90.0, 95.0, 99.0];

/// Report element name for a percentile: `p50`, `p99.9`
pub fn element_name(p: f64) -> String {
    format!("p{}", p)
}

/// Estimate a single percentile from an already ascending slice.
///
/// Returns `0.0` for an empty slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }

    let k = (p / 100.0) * (n - 1) as f64;
    let lo = (k.floor() as usize).min(n - 1);
    let hi = (lo + 1).min(n - 1);

    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] * (hi as f64 - k) + sorted[hi] * (k - lo as f64)
    }
}

/// Estimate a single percentile from unordered samples
pub fn percentile(samples: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted_copy(samples), p)
}

/// Estimate every requested percentile from unordered samples, as
/// `(percentile, estimate)` pairs in request order.
///
/// An empty sample set maps every requested percentile to `0.0`.
pub fn percentiles(samples: &[f64], requested: &[f64]) -> Vec<(f64, f64)> {
    let sorted = sorted_copy(samples);
    requested
        .iter()
        .map(|&p| (p, percentile_sorted(&sorted, p)))
        .collect()
}

fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

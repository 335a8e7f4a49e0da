//! Order statistics over the text-length sample.
//!
//! Percentiles use linear interpolation between the two closest ranks,
//! and the interpolated value is truncated toward zero.

use crate::models::LengthStats;

/// Compute min, p25, median, p75 and max of `values`.
///
/// An empty sample yields all zeros. The input is not reordered.
pub fn compute_basic_percentiles(values: &[usize]) -> LengthStats {
    if values.is_empty() {
        return LengthStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    LengthStats {
        min: sorted[0],
        p25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        p75: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

/// Linear-interpolation percentile of an ascending, non-empty sample.
///
/// `p` is a fraction in `[0, 1]`.
pub fn percentile(sorted: &[usize], p: f64) -> usize {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let k = p * (n - 1) as f64;
    let f = k.floor() as usize;
    let c = (f + 1).min(n - 1);
    if f == c {
        return sorted[f];
    }

    let lo = sorted[f] as f64;
    let hi = sorted[c] as f64;
    (lo + (hi - lo) * (k - f as f64)) as usize
}

//! Small descriptive statistics helpers
//!
//! NaN handling follows the usual array semantics: `mean` and `std_dev`
//! propagate NaN, `nan_quantile` skips it.

/// Arithmetic mean; NaN for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with `ddof` delta degrees of freedom
///
/// NaN if fewer than `ddof + 1` values.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - ddof) as f64).sqrt()
}

/// Quantile with linear interpolation between order statistics, ignoring NaN
///
/// `q` in [0, 1]. NaN if no finite-or-infinite (non-NaN) values remain.
pub fn nan_quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&v) - 2.5).abs() < 1e-12);
        assert!((std_dev(&v, 1) - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert!((std_dev(&v, 0) - 1.118_033_988_749_895).abs() < 1e-12);
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[1.0], 1).is_nan());
    }

    #[test]
    fn test_nan_quantile_linear() {
        let v = [4.0, 1.0, f64::NAN, 3.0, 2.0];
        assert!((nan_quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert!((nan_quantile(&v, 0.75) - 3.25).abs() < 1e-12);
        assert!((nan_quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!(nan_quantile(&[f64::NAN], 0.5).is_nan());
    }
}

//! One-dimensional piecewise-linear interpolation.
//!
//! Values requested outside the sampled range clamp to the first or last
//! sample; no extrapolation is performed.

use crate::error::{DspError, DspResult};
use lib_types::axis;

/// Interpolate a sampled function at a set of target positions.
///
/// `xp` must be strictly increasing and the same length as `fp`.
pub fn interpolate_linear(xp: &[f64], fp: &[f64], targets: &[f64]) -> DspResult<Vec<f64>> {
    check_samples(xp, fp)?;
    Ok(targets.iter().map(|&x| interpolate_single(xp, fp, x)).collect())
}

/// Validate a sampled function for interpolation.
fn check_samples(xp: &[f64], fp: &[f64]) -> DspResult<()> {
    if xp.len() != fp.len() {
        return Err(DspError::LengthMismatch {
            expected: xp.len(),
            actual: fp.len(),
        });
    }
    if xp.len() < 2 {
        return Err(DspError::InsufficientData { needed: 2, got: xp.len() });
    }
    if !axis::is_strictly_increasing(xp) {
        return Err(DspError::malformed(
            "interpolation axis",
            "sample positions must be strictly increasing",
        ));
    }
    Ok(())
}

/// Interpolate a single position. Assumes `check_samples` passed.
#[inline]
pub(crate) fn interpolate_single(xp: &[f64], fp: &[f64], target: f64) -> f64 {
    let last = xp.len() - 1;
    if target <= xp[0] {
        return fp[0];
    }
    if target >= xp[last] {
        return fp[last];
    }

    // Find bracketing indices
    let mut lower = 0;
    let mut upper = last;

    while upper - lower > 1 {
        let mid = (lower + upper) / 2;
        if xp[mid] <= target {
            lower = mid;
        } else {
            upper = mid;
        }
    }

    let x0 = xp[lower];
    let x1 = xp[upper];
    let frac = (target - x0) / (x1 - x0);

    fp[lower] + frac * (fp[upper] - fp[lower])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation() {
        let xp = vec![1.0, 2.0, 3.0];
        let fp = vec![1.0, 0.5, 0.0];

        let result = interpolate_linear(&xp, &fp, &[1.5, 2.5]).unwrap();

        assert!((result[0] - 0.75).abs() < 1e-12);
        assert!((result[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_exact_nodes_are_reproduced() {
        let xp = vec![0.0, 0.1, 0.2, 0.3];
        let fp = vec![3.0, -1.0, 7.0, 2.0];

        let result = interpolate_linear(&xp, &fp, &xp).unwrap();
        assert_eq!(result, fp);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let xp = vec![0.0, 1.0];
        let fp = vec![2.0, 4.0];

        let result = interpolate_linear(&xp, &fp, &[-5.0, 5.0]).unwrap();
        assert_eq!(result, vec![2.0, 4.0]);
    }

    #[test]
    fn test_rejects_bad_axes() {
        assert!(matches!(
            interpolate_linear(&[0.0, 1.0], &[1.0], &[0.5]),
            Err(DspError::LengthMismatch { .. })
        ));
        assert!(matches!(
            interpolate_linear(&[0.0], &[1.0], &[0.5]),
            Err(DspError::InsufficientData { .. })
        ));
        assert!(matches!(
            interpolate_linear(&[0.0, 2.0, 1.0], &[1.0, 2.0, 3.0], &[0.5]),
            Err(DspError::MalformedInput { .. })
        ));
    }
}

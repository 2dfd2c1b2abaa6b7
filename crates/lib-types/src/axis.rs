//! Sampled coordinate axes.
//!
//! Grids in this workspace follow the conventions of the simulation output
//! they are read from: positions are stored as explicit sample vectors, and
//! step sizes are taken from the second and third samples (`x[2] - x[1]`),
//! so an axis needs at least three points to define its step.

/// Evenly spaced samples over `[start, stop]`, endpoint included.
///
/// The last sample is exactly `stop`, independent of accumulated rounding.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// True if every sample is strictly greater than the previous one.
pub fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0])
}

/// True if no sample is smaller than the previous one.
pub fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] >= w[0])
}

/// Grid step taken between the second and third samples.
///
/// Returns `None` for axes shorter than three samples.
#[inline]
pub fn grid_step(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    Some(values[2] - values[1])
}

/// Minimum and maximum of a sample vector, ignoring NaN.
pub fn bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(-1.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], -1.0);
        assert_eq!(v[4], 1.0);
        assert!((v[2]).abs() < 1e-15);
    }

    #[test]
    fn test_linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
    }

    #[test]
    fn test_monotonicity_checks() {
        assert!(is_strictly_increasing(&[0.0, 1.0, 2.0]));
        assert!(!is_strictly_increasing(&[0.0, 0.0, 2.0]));
        assert!(is_non_decreasing(&[0.0, 0.0, 2.0]));
        assert!(!is_non_decreasing(&[0.0, -1.0]));
    }

    #[test]
    fn test_grid_step_needs_three_points() {
        assert_eq!(grid_step(&[0.0, 1.0]), None);
        assert_eq!(grid_step(&[0.0, 1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(bounds(&[]), None);
        assert_eq!(bounds(&[2.0, -1.0, f64::NAN, 5.0]), Some((-1.0, 5.0)));
    }
}

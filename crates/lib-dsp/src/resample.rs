//! Field resampling onto the time-aligned z grid.
//!
//! The wake integral advances one z step per time step, so the field must be
//! sampled at as many z points as there are time samples. Each time column
//! is linearly interpolated from the native z grid onto
//! `linspace(zmin, zmax, nt)`. Resampling is applied even when the native
//! grid already has `nt` points.

use crate::error::{DspError, DspResult};
use crate::interpolation::interpolate_single;
use lib_types::axis::{self, linspace};
use lib_types::FieldMap;
use ndarray::{Array2, Zip};

/// Resample a field onto `num_points` uniform z samples over the same range.
///
/// The time axis is carried over unchanged. Columns are processed in
/// parallel; each writes only its own output column.
pub fn resample_field(field: &FieldMap, num_points: usize) -> DspResult<FieldMap> {
    if field.values.nrows() != field.z.len() {
        return Err(DspError::malformed(
            "field map",
            format!(
                "{} field rows for a z axis of {} points",
                field.values.nrows(),
                field.z.len()
            ),
        ));
    }
    if field.values.ncols() != field.t.len() {
        return Err(DspError::malformed(
            "field map",
            format!(
                "{} field columns for a t axis of {} points",
                field.values.ncols(),
                field.t.len()
            ),
        ));
    }
    if num_points < 2 {
        return Err(DspError::InsufficientData { needed: 2, got: num_points });
    }
    if !axis::is_strictly_increasing(&field.z) {
        return Err(DspError::malformed("z axis", "positions must be strictly increasing"));
    }
    if field.z.len() < 2 {
        return Err(DspError::InsufficientData { needed: 2, got: field.z.len() });
    }

    let zmin = field.z[0];
    let zmax = field.z[field.z.len() - 1];
    let z_new = linspace(zmin, zmax, num_points);

    tracing::debug!(
        "Resampling field: {} -> {} z points over [{:.4e}, {:.4e}] m, {} time columns",
        field.z.len(),
        num_points,
        zmin,
        zmax,
        field.nt()
    );

    let mut values = Array2::<f64>::zeros((num_points, field.nt()));
    let z_native = &field.z;

    Zip::from(values.columns_mut())
        .and(field.values.columns())
        .par_for_each(|mut dst, src| {
            let column = src.to_vec();
            for (k, &z) in z_new.iter().enumerate() {
                dst[k] = interpolate_single(z_native, &column, z);
            }
        });

    Ok(FieldMap::new(values, z_new, field.t.clone()))
}

/// Resample a field so its z cardinality equals its time cardinality.
pub fn resample_to_time_grid(field: &FieldMap) -> DspResult<FieldMap> {
    resample_field(field, field.nt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_field(nz: usize, nt: usize) -> FieldMap {
        let z = linspace(-0.05, 0.05, nz);
        let t: Vec<f64> = (0..nt).map(|i| i as f64 * 1e-12).collect();
        let values = Array2::from_shape_fn((nz, nt), |(iz, it)| {
            3.0 * z[iz] + 0.5 * it as f64 - 1.0
        });
        FieldMap::new(values, z, t)
    }

    #[test]
    fn test_linear_field_is_reproduced() {
        let field = linear_field(11, 40);
        let resampled = resample_to_time_grid(&field).unwrap();

        assert_eq!(resampled.values.dim(), (40, 40));
        assert_eq!(resampled.z.len(), 40);
        for (k, &z) in resampled.z.iter().enumerate() {
            for it in 0..40 {
                let expected = 3.0 * z + 0.5 * it as f64 - 1.0;
                assert!(
                    (resampled.values[[k, it]] - expected).abs() < 1e-12,
                    "Mismatch at z={}, t={}: {} vs {}",
                    k,
                    it,
                    resampled.values[[k, it]],
                    expected
                );
            }
        }
    }

    #[test]
    fn test_matching_cardinality_is_identity() {
        let field = linear_field(25, 25);
        let resampled = resample_to_time_grid(&field).unwrap();

        assert_eq!(resampled.z, field.z);
        assert_eq!(resampled.values, field.values);
    }

    #[test]
    fn test_range_is_preserved() {
        let field = linear_field(7, 30);
        let resampled = resample_to_time_grid(&field).unwrap();

        assert_eq!(resampled.z[0], field.z[0]);
        assert_eq!(resampled.z[29], field.z[6]);
        assert_eq!(resampled.t, field.t);
    }

    #[test]
    fn test_non_monotonic_axis_rejected() {
        let mut field = linear_field(5, 10);
        field.z.swap(1, 2);
        assert!(matches!(
            resample_to_time_grid(&field),
            Err(DspError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_empty_axis_rejected() {
        let field = FieldMap::new(Array2::zeros((0, 4)), Vec::new(), vec![0.0, 1.0, 2.0, 3.0]);
        assert!(resample_to_time_grid(&field).is_err());
    }
}

//! Space-time field maps.
//!
//! A [`FieldMap`] stores one field component sampled along the beam axis
//! over the whole simulation run, indexed `[z_index, t_index]`. Simulation
//! dumps are written time-major (`[time][space]`); use
//! [`FieldMap::from_time_major`] to transpose on load.

use crate::axis;
use crate::units::Seconds;
use ndarray::{Array2, ArrayView1, Axis};

/// A real field component on a (z, t) grid.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMap {
    /// Field samples, shape `[z.len(), t.len()]`.
    pub values: Array2<f64>,

    /// Longitudinal sample positions [m].
    pub z: Vec<f64>,

    /// Sample times [s].
    pub t: Vec<f64>,
}

impl FieldMap {
    /// Create a field map.
    ///
    /// # Panics
    ///
    /// Panics if the array shape doesn't match the axis lengths.
    pub fn new(values: Array2<f64>, z: Vec<f64>, t: Vec<f64>) -> Self {
        assert_eq!(
            values.nrows(),
            z.len(),
            "Field row count {} doesn't match z axis length {}",
            values.nrows(),
            z.len()
        );
        assert_eq!(
            values.ncols(),
            t.len(),
            "Field column count {} doesn't match t axis length {}",
            values.ncols(),
            t.len()
        );
        Self { values, z, t }
    }

    /// Build from time-major rows (`rows[t_index][z_index]`).
    ///
    /// Returns `None` if the rows are ragged or their count doesn't match `t`.
    pub fn from_time_major(rows: &[Vec<f64>], z: Vec<f64>, t: Vec<f64>) -> Option<Self> {
        if rows.len() != t.len() {
            return None;
        }
        let nz = z.len();
        if rows.iter().any(|row| row.len() != nz) {
            return None;
        }

        let values = Array2::from_shape_fn((nz, t.len()), |(iz, it)| rows[it][iz]);
        Some(Self { values, z, t })
    }

    /// Number of z samples.
    #[inline]
    pub fn nz_points(&self) -> usize {
        self.z.len()
    }

    /// Number of time samples.
    #[inline]
    pub fn nt(&self) -> usize {
        self.t.len()
    }

    /// Time step (`t[2] - t[1]`).
    #[inline]
    pub fn dt(&self) -> Option<Seconds> {
        axis::grid_step(&self.t).map(Seconds)
    }

    /// Spatial extent `(zmin, zmax)`.
    pub fn z_bounds(&self) -> Option<(f64, f64)> {
        axis::bounds(&self.z)
    }

    /// Time trace at a z index.
    pub fn trace(&self, z_index: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(0), z_index)
    }
}

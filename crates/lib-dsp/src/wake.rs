//! Longitudinal wake potential by direct retarded-time integration.
//!
//! For a test charge trailing the source by `s`, the wake potential is the
//! line integral of `Ez` along the beam axis, each point sampled at the time
//! the test charge passes it:
//!
//! ```text
//! W(s) = 1/q * sum_k Ez[k, it(k, s)] * dz
//! t_s(k, s) = (z[k] + s)/c - zmin/c - t[0] + init_time
//! it(k, s) = floor(t_s / dt)              (only where t_s > 0)
//! ```
//!
//! Points whose retarded time is not positive have not been reached by the
//! field yet and contribute nothing. The time-bin index always uses floor
//! semantics; rounding would attribute contributions to the wrong sample.
//!
//! Every offset is an independent gather over z, so offsets are evaluated in
//! parallel and each writes only its own output slot.

use crate::error::{DspError, DspResult};
use crate::resample::resample_to_time_grid;
use lib_types::axis::{self, linspace};
use lib_types::units::{Coulombs, Meters, Seconds, SPEED_OF_LIGHT};
use lib_types::wake::{OffsetAxis, WakePotential};
use lib_types::FieldMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// What to do when a retarded time maps past the last time sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Drop the contribution.
    #[default]
    Skip,
    /// Use the last recorded time sample.
    Clamp,
    /// Fail with [`DspError::NumericDomain`].
    Error,
}

/// Physical parameters of the wake integral.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WakeParams {
    /// Time at which the bunch centre enters the structure.
    pub init_time: Seconds,

    /// Source charge used for normalisation.
    pub charge: Coulombs,

    /// Out-of-range time-bin handling.
    pub boundary: BoundaryPolicy,
}

impl Default for WakeParams {
    fn default() -> Self {
        Self {
            init_time: Seconds::ZERO,
            charge: Coulombs::default(),
            boundary: BoundaryPolicy::default(),
        }
    }
}

/// Build the offset axis for a run of `nt` samples spaced `dt` over a
/// structure of length `extent`.
///
/// The negative segment holds `floor(init_time/dt)` samples over
/// `[-init_time*c, 0]`; the positive segment holds
/// `floor(wake_length/(dt*c))` samples over `[0, wake_length]` with
/// `wake_length = nt*dt*c - extent - init_time*c`.
pub fn offset_axis(nt: usize, dt: Seconds, extent: Meters, init_time: Seconds) -> DspResult<OffsetAxis> {
    if !(dt.0 > 0.0) {
        return Err(DspError::malformed("time axis", format!("time step must be positive, got {}", dt.0)));
    }
    if init_time.0 < 0.0 || !init_time.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "init_time must be finite and non-negative, got {} s",
            init_time.0
        )));
    }

    let c = SPEED_OF_LIGHT;
    let lead = init_time.light_distance().0;
    let wake_length = nt as f64 * dt.0 * c - extent.0 - lead;
    if !(wake_length > 0.0) {
        return Err(DspError::InvalidConfig(format!(
            "simulated time too short: {:.4} ns of field cannot cover a {:.2} mm structure \
             after init_time {:.4} ns",
            nt as f64 * dt.as_ns(),
            extent.as_mm(),
            init_time.as_ns()
        )));
    }

    let ns_neg = (init_time.0 / dt.0).floor() as usize;
    let ns_pos = (wake_length / (dt.0 * c)).floor() as usize;

    let mut s = linspace(-lead, 0.0, ns_neg);
    s.extend(linspace(0.0, wake_length, ns_pos));

    if s.len() < 3 {
        return Err(DspError::InsufficientData { needed: 3, got: s.len() });
    }
    // ds is read from s[2] - s[1]; two negative samples put both at zero
    if !(s[2] - s[1] > 0.0) {
        return Err(DspError::InvalidConfig(format!(
            "offset step vanishes with ns_neg = {} for init_time {:.4} ps at dt {:.4} ps",
            ns_neg,
            init_time.as_ps(),
            dt.as_ps()
        )));
    }

    tracing::debug!(
        "Offset axis: {} negative + {} positive samples, wake length {:.3} mm",
        ns_neg,
        ns_pos,
        wake_length * 1e3
    );

    Ok(OffsetAxis {
        s,
        ns_neg,
        ns_pos,
        wake_length: Meters(wake_length),
    })
}

/// Wake integrator over a field already resampled to `nt` z points.
pub struct WakeIntegrator<'a> {
    field: &'a FieldMap,
    params: WakeParams,
    dz: f64,
    dt: f64,
    zmin: f64,
    t0: f64,
}

impl<'a> WakeIntegrator<'a> {
    /// Create an integrator for a time-aligned field.
    ///
    /// The field must have as many z samples as time samples (see
    /// [`resample_to_time_grid`]) and both axes must be strictly increasing.
    pub fn new(field: &'a FieldMap, params: WakeParams) -> DspResult<Self> {
        let nz = field.nz_points();
        let nt = field.nt();

        if field.values.dim() != (nz, nt) {
            return Err(DspError::malformed(
                "field map",
                format!("array shape {:?} doesn't match axes ({}, {})", field.values.dim(), nz, nt),
            ));
        }
        if nz != nt {
            return Err(DspError::malformed(
                "field map",
                format!("field has {} z samples for {} time samples; resample first", nz, nt),
            ));
        }
        if nt < 3 {
            return Err(DspError::InsufficientData { needed: 3, got: nt });
        }
        if !axis::is_strictly_increasing(&field.z) {
            return Err(DspError::malformed("z axis", "positions must be strictly increasing"));
        }
        if !axis::is_strictly_increasing(&field.t) {
            return Err(DspError::malformed("time axis", "times must be strictly increasing"));
        }
        if params.charge.0 == 0.0 || !params.charge.0.is_finite() {
            return Err(DspError::InvalidConfig(format!(
                "source charge must be finite and non-zero, got {} C",
                params.charge.0
            )));
        }

        let dz = field.z[2] - field.z[1];
        let dt = field.t[2] - field.t[1];

        Ok(Self {
            field,
            params,
            dz,
            dt,
            zmin: field.z[0],
            t0: field.t[0],
        })
    }

    /// Offset axis matching this field and `init_time`.
    pub fn offset_axis(&self) -> DspResult<OffsetAxis> {
        let zmax = self.field.z[self.field.z.len() - 1];
        offset_axis(
            self.field.nt(),
            Seconds(self.dt),
            Meters(zmax - self.zmin),
            self.params.init_time,
        )
    }

    /// Evaluate W(s) at every offset in `s`.
    pub fn integrate(&self, s: &[f64]) -> DspResult<WakePotential> {
        if s.is_empty() {
            return Err(DspError::InsufficientData { needed: 1, got: 0 });
        }
        if !axis::is_non_decreasing(s) {
            return Err(DspError::malformed("offset axis", "offsets must be non-decreasing"));
        }

        let results: Vec<(f64, usize)> = s
            .par_iter()
            .enumerate()
            .map(|(n, &s_n)| self.wake_at(n, s_n))
            .collect::<DspResult<Vec<_>>>()?;

        let (values, skipped): (Vec<f64>, Vec<usize>) = results.into_iter().unzip();
        let skipped: usize = skipped.iter().sum();
        if skipped > 0 {
            tracing::warn!(
                "{} field contributions mapped past the last time sample and were {}",
                skipped,
                match self.params.boundary {
                    BoundaryPolicy::Clamp => "clamped",
                    _ => "skipped",
                }
            );
        }

        tracing::info!(
            "Wake potential: {} offsets, max |W| = {:.4e} V/pC",
            values.len(),
            values.iter().map(|v| v.abs()).fold(0.0, f64::max)
        );

        Ok(WakePotential::new(s.to_vec(), values))
    }

    /// Wake potential at one offset, plus the number of out-of-range bins hit.
    fn wake_at(&self, n: usize, s_n: f64) -> DspResult<(f64, usize)> {
        let c = SPEED_OF_LIGHT;
        let nt = self.field.nt();
        let init_time = self.params.init_time.0;

        let mut integral = 0.0;
        let mut out_of_range = 0;

        for (k, &z_k) in self.field.z.iter().enumerate() {
            let t_s = (z_k + s_n) / c - self.zmin / c - self.t0 + init_time;
            if t_s <= 0.0 {
                continue;
            }

            let mut it = (t_s / self.dt).floor() as usize;
            if it >= nt {
                out_of_range += 1;
                match self.params.boundary {
                    BoundaryPolicy::Skip => continue,
                    BoundaryPolicy::Clamp => it = nt - 1,
                    BoundaryPolicy::Error => {
                        return Err(DspError::NumericDomain {
                            offset_index: n,
                            z_index: k,
                            time_index: it,
                            nt,
                        });
                    }
                }
            }

            integral += self.field.values[[k, it]] * self.dz;
        }

        Ok((integral / self.params.charge.as_pc(), out_of_range))
    }
}

/// Full wake computation from a field on its native z grid.
///
/// Resamples the field to the time grid, builds the offset axis and
/// integrates. Returns the offset axis alongside the wake potential.
pub fn compute_wake_potential(field: &FieldMap, params: WakeParams) -> DspResult<(OffsetAxis, WakePotential)> {
    let resampled = resample_to_time_grid(field)?;
    let integrator = WakeIntegrator::new(&resampled, params)?;
    let offsets = integrator.offset_axis()?;
    let wake = integrator.integrate(&offsets.s)?;
    Ok((offsets, wake))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    const C: f64 = SPEED_OF_LIGHT;

    /// Square field map with `n` z and t samples, z spacing `c * dt / 4`.
    fn square_field(n: usize, dt: f64, f: impl Fn(usize, usize) -> f64) -> FieldMap {
        let z = linspace(0.0, (n - 1) as f64 * C * dt / 4.0, n);
        let t: Vec<f64> = (0..n).map(|i| i as f64 * dt).collect();
        let values = Array2::from_shape_fn((n, n), |(k, it)| f(k, it));
        FieldMap::new(values, z, t)
    }

    fn params(init_time: f64) -> WakeParams {
        WakeParams {
            init_time: Seconds(init_time),
            charge: Coulombs::from_nc(1.0),
            boundary: BoundaryPolicy::Skip,
        }
    }

    #[test]
    fn test_offset_axis_segments() {
        let dt = Seconds(1e-12);
        let init_time = Seconds(10.5e-12);
        let extent = Meters(50.0 * C * 1e-12);

        let axis = offset_axis(200, dt, extent, init_time).unwrap();

        assert_eq!(axis.ns_neg, 10);
        let expected_wl = 200.0 * 1e-12 * C - extent.0 - init_time.0 * C;
        assert!((axis.wake_length.0 - expected_wl).abs() < 1e-12);
        assert_eq!(axis.ns_pos, (expected_wl / (1e-12 * C)).floor() as usize);
        assert_eq!(axis.len(), axis.ns_neg + axis.ns_pos);

        // s = 0 closes the negative segment and opens the positive one
        assert_eq!(axis.s[axis.ns_neg - 1], 0.0);
        assert_eq!(axis.s[axis.zero_index()], 0.0);
        assert!((axis.s[0] + init_time.0 * C).abs() < 1e-15);
        assert!(axis::is_non_decreasing(&axis.s));
    }

    #[test]
    fn test_offset_axis_rejects_zero_step() {
        // floor(2.5 ps / 1 ps) = 2 negative samples: [-lead, 0] then 0 again
        let result = offset_axis(400, Seconds(1e-12), Meters(0.01), Seconds(2.5e-12));
        match result {
            Err(DspError::InvalidConfig(msg)) => assert!(msg.contains("ns_neg = 2"), "{}", msg),
            other => panic!("expected InvalidConfig, got {:?}", other),
        }

        // one or three negative samples keep a positive step
        assert!(offset_axis(400, Seconds(1e-12), Meters(0.01), Seconds(1.5e-12)).is_ok());
        assert!(offset_axis(400, Seconds(1e-12), Meters(0.01), Seconds(3.5e-12)).is_ok());
    }

    #[test]
    fn test_offset_axis_rejects_short_runs() {
        let result = offset_axis(10, Seconds(1e-12), Meters(1.0), Seconds(0.0));
        assert!(matches!(result, Err(DspError::InvalidConfig(_))));
    }

    #[test]
    fn test_field_must_be_time_aligned() {
        let z = linspace(0.0, 1.0, 4);
        let t = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let field = FieldMap::new(Array2::zeros((4, 5)), z, t);
        assert!(matches!(
            WakeIntegrator::new(&field, params(0.0)),
            Err(DspError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_no_contribution_before_field_arrives() {
        let n = 64;
        let dt = 1e-12;
        let init_time = 5.0 * dt;
        let field = square_field(n, dt, |_, _| 1.0);
        let integrator = WakeIntegrator::new(&field, params(init_time)).unwrap();

        let extent = field.z[n - 1] - field.z[0];
        let horizon = -extent - init_time * C;

        // offsets well before, at and after the causal horizon
        let s: Vec<f64> = (0..40)
            .map(|i| horizon - 20.0 * C * dt + i as f64 * C * dt)
            .collect();
        let wake = integrator.integrate(&s).unwrap();

        for (s_n, w) in wake.s.iter().zip(wake.values.iter()) {
            if *s_n < horizon - 0.5 * C * dt {
                assert_eq!(*w, 0.0, "non-zero wake {} at s = {} before horizon", w, s_n);
            }
        }
        // past the horizon the uniform field is picked up
        assert!(wake.values[39] > 0.0);
    }

    #[test]
    fn test_single_pulse_maps_to_one_offset() {
        let n = 80;
        let dt = 1e-12;
        let init_time = 4.0 * dt;
        let (k0, i0) = (30, 50);
        let field = square_field(n, dt, |k, it| if k == k0 && it == i0 { 1.0 } else { 0.0 });
        let integrator = WakeIntegrator::new(&field, params(init_time)).unwrap();

        let z0 = field.z[k0];
        let t_pulse = field.t[i0];
        let expected = C * (t_pulse - init_time + field.t[0]) - (z0 - field.z[0]);

        // grid whose 10th sample sits in the middle of the pulse's bin
        let s: Vec<f64> = (0..21)
            .map(|i| expected + 0.5 * C * dt + (i as f64 - 10.0) * C * dt)
            .collect();
        let wake = integrator.integrate(&s).unwrap();

        let nonzero: Vec<usize> = wake
            .values
            .iter()
            .enumerate()
            .filter(|(_, w)| **w != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(nonzero, vec![10]);
        assert!((wake.s[10] - expected).abs() <= C * dt);

        let dz = field.z[2] - field.z[1];
        assert!((wake.values[10] - dz / 1000.0).abs() < 1e-18);
    }

    #[test]
    fn test_boundary_policies() {
        let n = 16;
        let dt = 1e-12;
        let field = square_field(n, dt, |_, it| it as f64);

        // far trailing offset: every retarded time lies past the record
        let s = vec![0.0, 0.5 * C * n as f64 * dt, 10.0 * C * n as f64 * dt];

        let skip = WakeIntegrator::new(&field, params(0.0)).unwrap().integrate(&s).unwrap();
        assert_eq!(skip.values[2], 0.0);

        let clamp_params = WakeParams { boundary: BoundaryPolicy::Clamp, ..params(0.0) };
        let clamp = WakeIntegrator::new(&field, clamp_params).unwrap().integrate(&s).unwrap();
        let dz = field.z[2] - field.z[1];
        let expected = n as f64 * (n - 1) as f64 * dz / 1000.0;
        assert!((clamp.values[2] - expected).abs() < 1e-12 * expected);

        let error_params = WakeParams { boundary: BoundaryPolicy::Error, ..params(0.0) };
        let result = WakeIntegrator::new(&field, error_params).unwrap().integrate(&s);
        assert!(matches!(result, Err(DspError::NumericDomain { nt: 16, .. })));
    }

    #[test]
    fn test_wake_scales_with_field() {
        let n = 48;
        let dt = 2e-12;
        let init_time = 6.0 * dt;
        let shape = |k: usize, it: usize| ((k as f64) * 0.3).sin() * ((it as f64) * 0.17).cos();
        let base = square_field(n, dt, shape);
        let scaled = square_field(n, dt, |k, it| -2.5 * shape(k, it));

        let (_, w1) = compute_wake_potential(&base, params(init_time)).unwrap();
        let (_, w2) = compute_wake_potential(&scaled, params(init_time)).unwrap();

        let tolerance = 1e-12 * w1.max_abs();
        assert!(w1.max_abs() > 0.0);
        for (a, b) in w1.values.iter().zip(w2.values.iter()) {
            assert!((b + 2.5 * a).abs() <= tolerance);
        }
    }

    #[test]
    fn test_last_offset_is_evaluated() {
        let n = 40;
        let dt = 1e-12;
        let field = square_field(n, dt, |_, _| 1.0);
        let (offsets, wake) = compute_wake_potential(&field, params(3.0 * dt)).unwrap();

        assert_eq!(wake.len(), offsets.len());
        assert!(*wake.values.last().unwrap() != 0.0);
    }
}

//! Field probe: time trace at a fixed z position and its dominant frequency.

use crate::error::{DspError, DspResult};
use crate::fft::{decimate, rfftfreq, FftEngine};
use lib_types::units::{Hertz, Seconds};
use lib_types::FieldMap;
use serde::Serialize;

/// Default decimation applied to the trace before the spectrum.
pub const DEFAULT_PROBE_STRIDE: usize = 5;

/// Field samples recorded at one z position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeTrace {
    pub z_index: usize,

    /// Probe position [m].
    pub z: f64,

    /// Sample times [s].
    pub t: Vec<f64>,

    /// Longitudinal field [V/m].
    pub ez: Vec<f64>,

    /// `sqrt(Ez^2 + Ex^2 + Ey^2)` when the transverse components are known.
    pub magnitude: Option<Vec<f64>>,
}

/// Amplitude spectrum of a probe trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbeSpectrum {
    pub frequencies: Vec<Hertz>,
    pub amplitude: Vec<f64>,

    /// Strongest bin below Nyquist.
    pub dominant: Option<(Hertz, f64)>,
}

/// Index of the centre of the native grid (`nz / 2` for `nz + 1` points).
#[inline]
pub fn center_index(field: &FieldMap) -> usize {
    field.nz_points().saturating_sub(1) / 2
}

/// Grid index of the cell containing `position`, or `None` outside the grid.
pub fn index_at(field: &FieldMap, position: f64) -> Option<usize> {
    let dz = field.z.get(2)? - field.z.get(1)?;
    if !(dz > 0.0) {
        return None;
    }
    let offset = (position - field.z[0]) / dz;
    if offset < 0.0 || !offset.is_finite() {
        return None;
    }
    let index = offset as usize;
    (index < field.nz_points()).then_some(index)
}

/// Extract the time trace at `z_index`, with `|E|` if both transverse
/// components are supplied on the same grid.
pub fn field_probe(
    ez: &FieldMap,
    ex: Option<&FieldMap>,
    ey: Option<&FieldMap>,
    z_index: usize,
) -> DspResult<ProbeTrace> {
    if z_index >= ez.nz_points() {
        return Err(DspError::InvalidConfig(format!(
            "probe index {} outside a z grid of {} points",
            z_index,
            ez.nz_points()
        )));
    }

    let trace = ez.trace(z_index).to_vec();
    let magnitude = match (ex, ey) {
        (Some(ex), Some(ey)) => {
            for (name, other) in [("Ex", ex), ("Ey", ey)] {
                if other.values.dim() != ez.values.dim() {
                    return Err(DspError::malformed(
                        "transverse field",
                        format!(
                            "{} has shape {:?}, Ez has shape {:?}",
                            name,
                            other.values.dim(),
                            ez.values.dim()
                        ),
                    ));
                }
            }
            let tx = ex.trace(z_index);
            let ty = ey.trace(z_index);
            Some(
                trace
                    .iter()
                    .zip(tx.iter().zip(ty.iter()))
                    .map(|(z, (x, y))| (z * z + x * x + y * y).sqrt())
                    .collect(),
            )
        }
        _ => None,
    };

    tracing::debug!(
        "Probe at z[{}] = {:.4} mm, {} samples",
        z_index,
        ez.z[z_index] * 1e3,
        trace.len()
    );

    Ok(ProbeTrace {
        z_index,
        z: ez.z[z_index],
        t: ez.t.clone(),
        ez: trace,
        magnitude,
    })
}

/// Amplitude spectrum of `trace` after keeping every `stride`-th sample.
///
/// The dominant frequency is the argmax over bins `0..n/2 - 1` of the
/// decimated length `n`, which leaves out the Nyquist region.
pub fn probe_spectrum(trace: &[f64], dt: Seconds, stride: usize) -> DspResult<ProbeSpectrum> {
    if stride == 0 {
        return Err(DspError::InvalidConfig("probe stride must be at least 1".into()));
    }
    if !(dt.0 > 0.0) {
        return Err(DspError::malformed("time axis", format!("step dt = {} must be positive", dt.0)));
    }

    let samples = decimate(trace, stride);
    if samples.len() < 2 {
        return Err(DspError::InsufficientData {
            needed: 2,
            got: samples.len(),
        });
    }

    let mut engine = FftEngine::new();
    let spectrum = engine.rfft(&samples)?;
    let amplitude: Vec<f64> = spectrum.iter().map(|c| c.norm()).collect();
    let frequencies: Vec<Hertz> = rfftfreq(samples.len(), dt.0 * stride as f64)
        .into_iter()
        .map(Hertz)
        .collect();

    let search = (samples.len() / 2).saturating_sub(1);
    let dominant = amplitude[..search.min(amplitude.len())]
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &a)| match best {
            Some((_, b)) if a <= b => best,
            _ => Some((i, a)),
        })
        .map(|(i, a)| (frequencies[i], a));

    if let Some((f, _)) = dominant {
        tracing::info!("Probe dominant frequency: {:.4} GHz", f.as_ghz());
    }

    Ok(ProbeSpectrum {
        frequencies,
        amplitude,
        dominant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::axis::linspace;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn tone_field(nz: usize, nt: usize, dt: f64, f0: f64) -> FieldMap {
        let z = linspace(-0.05, 0.05, nz);
        let t: Vec<f64> = (0..nt).map(|i| i as f64 * dt).collect();
        let values = Array2::from_shape_fn((nz, nt), |(iz, it)| {
            (iz as f64 + 1.0) * (2.0 * PI * f0 * t[it]).sin()
        });
        FieldMap::new(values, z, t)
    }

    #[test]
    fn test_center_index() {
        let field = tone_field(41, 4, 1e-12, 1e9);
        assert_eq!(center_index(&field), 20);
    }

    #[test]
    fn test_index_at_cavity_edges() {
        // 0.5 mm cells over [-50, 50] mm
        let field = tone_field(201, 4, 1e-12, 1e9);
        assert_eq!(index_at(&field, -0.0149), Some(70));
        assert_eq!(index_at(&field, 0.0151), Some(130));
        assert_eq!(index_at(&field, -0.06), None);
        assert_eq!(index_at(&field, 0.06), None);
    }

    #[test]
    fn test_trace_and_magnitude() {
        let ez = tone_field(5, 8, 1e-11, 1e9);
        let mut ex = ez.clone();
        ex.values.fill(3.0);
        let mut ey = ez.clone();
        ey.values.fill(4.0);

        let probe = field_probe(&ez, Some(&ex), Some(&ey), 2).unwrap();
        assert_eq!(probe.ez, ez.trace(2).to_vec());
        assert_eq!(probe.z, ez.z[2]);

        // Ez is zero at t = 0, leaving |(3, 4)|
        let magnitude = probe.magnitude.unwrap();
        assert!((magnitude[0] - 5.0).abs() < 1e-12);

        let bare = field_probe(&ez, Some(&ex), None, 2).unwrap();
        assert!(bare.magnitude.is_none());
    }

    #[test]
    fn test_out_of_range_probe_rejected() {
        let ez = tone_field(5, 8, 1e-11, 1e9);
        assert!(field_probe(&ez, None, None, 5).is_err());
    }

    #[test]
    fn test_dominant_frequency_of_tone() {
        // 1.25 GHz tone sampled at 5 ps; after stride 5 the bin width is
        // 1 / (n * 25 ps)
        let dt = 5e-12;
        let field = tone_field(3, 4001, dt, 1.25e9);
        let trace = field.trace(1).to_vec();

        let spectrum = probe_spectrum(&trace, Seconds(dt), DEFAULT_PROBE_STRIDE).unwrap();
        let (f, _) = spectrum.dominant.unwrap();
        let bin = spectrum.frequencies[1].0;

        assert_eq!(spectrum.amplitude.len(), 800 / 2 + 1);
        assert!((f.0 - 1.25e9).abs() <= bin, "dominant at {} Hz", f.0);
    }

    #[test]
    fn test_zero_stride_rejected() {
        assert!(matches!(
            probe_spectrum(&[0.0; 16], Seconds(1e-12), 0),
            Err(DspError::InvalidConfig(_))
        ));
    }
}

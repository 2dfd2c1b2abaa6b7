//! Numeric comparison of computed results against reference solver output.

use crate::error::{DspError, DspResult};
use crate::interpolation::interpolate_linear;
use lib_types::units::Hertz;
use lib_types::wake::WakePotential;
use lib_types::{ImpedanceSpectrum, ReferenceData};
use serde::Serialize;

/// Agreement metrics between computed and reference curves.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Our resonant peak.
    pub peak_frequency: Option<Hertz>,

    /// Argmax of the reference impedance.
    pub reference_peak_frequency: Option<Hertz>,

    /// `peak_frequency - reference_peak_frequency`.
    pub peak_shift: Option<Hertz>,

    /// `max(Z) / max(Z_ref)`.
    pub norm_ratio: Option<f64>,

    /// RMS difference of the peak-normalised wakes over the common s range.
    pub wake_rms: Option<f64>,

    /// Reference wake samples inside the common s range.
    pub overlap_points: usize,
}

/// Compare our wake and impedance with a reference dataset.
pub fn compare(
    wake: &WakePotential,
    spectrum: &ImpedanceSpectrum,
    reference: &ReferenceData,
) -> DspResult<ComparisonSummary> {
    if reference.s.len() != reference.wake.len() {
        return Err(DspError::malformed(
            "reference wake",
            format!("{} offsets for {} wake samples", reference.s.len(), reference.wake.len()),
        ));
    }
    if reference.frequencies.len() != reference.impedance.len() {
        return Err(DspError::malformed(
            "reference impedance",
            format!(
                "{} frequencies for {} impedance samples",
                reference.frequencies.len(),
                reference.impedance.len()
            ),
        ));
    }

    let mut summary = ComparisonSummary {
        peak_frequency: spectrum.peak().map(|p| p.frequency),
        ..Default::default()
    };

    if reference.has_impedance() {
        let reference_peak = argmax(&reference.impedance);
        summary.reference_peak_frequency = reference_peak.map(|(i, _)| reference.frequencies[i]);
        summary.norm_ratio = match (spectrum.max_finite(), reference_peak) {
            (Some(ours), Some((_, theirs))) if theirs != 0.0 => Some(ours / theirs),
            _ => None,
        };
    }
    if let (Some(ours), Some(theirs)) = (summary.peak_frequency, summary.reference_peak_frequency) {
        summary.peak_shift = Some(ours - theirs);
    }

    if reference.has_wake() {
        let (rms, overlap) = wake_rms(wake, &reference.s, &reference.wake)?;
        summary.wake_rms = rms;
        summary.overlap_points = overlap;
        if overlap == 0 {
            tracing::warn!("Reference wake does not overlap the computed offset range");
        }
    }

    tracing::info!(
        "Comparison: peak {:?} GHz vs reference {:?} GHz, norm ratio {:?}, wake rms {:?}",
        summary.peak_frequency.map(|f| f.as_ghz()),
        summary.reference_peak_frequency.map(|f| f.as_ghz()),
        summary.norm_ratio,
        summary.wake_rms
    );

    Ok(summary)
}

fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

/// RMS of `W/max W - W_ref/max W_ref` on the reference offsets that fall
/// inside our s range.
fn wake_rms(wake: &WakePotential, s_ref: &[f64], w_ref: &[f64]) -> DspResult<(Option<f64>, usize)> {
    let peak = wake.max();
    if !(peak > 0.0) || !peak.is_finite() {
        return Ok((None, 0));
    }
    let ours = wake.peak_normalized();

    // the offset axis repeats s = 0; keep the first of equal offsets
    let mut xs = Vec::with_capacity(ours.len());
    let mut ys = Vec::with_capacity(ours.len());
    for (&s, &w) in ours.s.iter().zip(ours.values.iter()) {
        if xs.last().map_or(true, |&last| s > last) {
            xs.push(s);
            ys.push(w);
        }
    }
    if xs.len() < 2 {
        return Ok((None, 0));
    }

    let ref_peak = w_ref.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(ref_peak > 0.0) || !ref_peak.is_finite() {
        return Ok((None, 0));
    }

    let (lo, hi) = (xs[0], xs[xs.len() - 1]);
    let (targets, reference): (Vec<f64>, Vec<f64>) = s_ref
        .iter()
        .zip(w_ref.iter())
        .filter(|(s, _)| **s >= lo && **s <= hi)
        .map(|(s, w)| (*s, w / ref_peak))
        .unzip();
    if targets.is_empty() {
        return Ok((None, 0));
    }

    let interpolated = interpolate_linear(&xs, &ys, &targets)?;
    let sum_sq: f64 = interpolated
        .iter()
        .zip(reference.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum();

    Ok((Some((sum_sq / targets.len() as f64).sqrt()), targets.len()))
}

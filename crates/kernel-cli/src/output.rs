//! Result output formatting and writing.

use crate::orchestrator::{ProbeReport, ResolvedParameters, RunResults};
use crate::OutputFormat;
use anyhow::Result;
use lib_dsp::ComparisonSummary;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Scalar results of a run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary<'a> {
    pub name: &'a str,
    pub parameters: &'a ResolvedParameters,
    pub wake_samples: usize,
    pub ns_neg: usize,
    pub ns_pos: usize,
    pub wake_length_mm: f64,
    pub sigma_t_ps: f64,
    /// Loss factor [V/pC].
    pub k: f64,
    pub peak_frequency_ghz: Option<f64>,
    pub peak_impedance_ohm: Option<f64>,
    pub degenerate_bins: usize,
    pub probe_dominant_ghz: Option<f64>,
    pub comparison: Option<&'a ComparisonSummary>,
}

impl<'a> RunSummary<'a> {
    pub fn new(results: &'a RunResults) -> Self {
        let peak = results.impedance.peak();
        Self {
            name: &results.name,
            parameters: &results.parameters,
            wake_samples: results.wake.len(),
            ns_neg: results.offsets.ns_neg,
            ns_pos: results.offsets.ns_pos,
            wake_length_mm: results.offsets.wake_length.as_mm(),
            sigma_t_ps: results.charge.sigma_t() * 1e12,
            k: results.loss_factor,
            peak_frequency_ghz: peak.map(|p| p.frequency.as_ghz()),
            peak_impedance_ohm: peak.map(|p| p.impedance.0),
            degenerate_bins: results.impedance.degenerate_bins.len(),
            probe_dominant_ghz: results
                .probe
                .as_ref()
                .and_then(|p| p.spectrum.dominant)
                .map(|(f, _)| f.as_ghz()),
            comparison: results.comparison.as_ref(),
        }
    }
}

/// Write run results to the output directory.
pub fn write_results(results: &RunResults, output_dir: &Path, format: OutputFormat) -> Result<()> {
    let wake_path = output_dir.join("wake_potential.csv");
    let mut f = std::fs::File::create(&wake_path)?;
    writeln!(f, "s_mm,W_V_per_pC")?;
    for (s, w) in results.wake.s.iter().zip(results.wake.values.iter()) {
        writeln!(f, "{},{}", s * 1e3, w)?;
    }
    tracing::info!("Wrote wake potential to {:?}", wake_path);

    let lambda_path = output_dir.join("charge_distribution.csv");
    let mut f = std::fs::File::create(&lambda_path)?;
    writeln!(f, "s_mm,lambda_C_per_m")?;
    for (s, l) in results.charge.s.iter().zip(results.charge.density.iter()) {
        writeln!(f, "{},{}", s * 1e3, l)?;
    }
    tracing::info!("Wrote charge distribution to {:?}", lambda_path);

    // bins in stored order; degenerate bins read "inf"
    let impedance_path = output_dir.join("impedance.csv");
    let mut f = std::fs::File::create(&impedance_path)?;
    writeln!(f, "f_GHz,Z_Ohm")?;
    for (freq, z) in results.impedance.frequencies.iter().zip(results.impedance.magnitude.iter()) {
        writeln!(f, "{},{}", freq.as_ghz(), z)?;
    }
    tracing::info!("Wrote impedance to {:?}", impedance_path);

    if let Some(probe) = &results.probe {
        write_probe(probe, output_dir)?;
    }

    let summary = RunSummary::new(results);
    match format {
        OutputFormat::Text => {
            let path = output_dir.join("summary.txt");
            let mut f = std::fs::File::create(&path)?;
            write_summary_text(&mut f, &summary)?;
            tracing::info!("Wrote summary to {:?}", path);
        }
        OutputFormat::Json => {
            let path = output_dir.join("summary.json");
            let mut f = std::fs::File::create(&path)?;
            writeln!(f, "{}", serde_json::to_string_pretty(&summary)?)?;
            tracing::info!("Wrote summary to {:?}", path);
        }
        OutputFormat::Csv => {
            let path = output_dir.join("summary.csv");
            let mut f = std::fs::File::create(&path)?;
            write_summary_csv(&mut f, &summary)?;
            tracing::info!("Wrote summary to {:?}", path);
        }
    }

    Ok(())
}

fn write_probe(probe: &ProbeReport, output_dir: &Path) -> Result<()> {
    let path = output_dir.join("probe.csv");
    let mut f = std::fs::File::create(&path)?;

    writeln!(f, "t_ns,Ez,E_abs")?;
    for (i, (t, ez)) in probe.trace.t.iter().zip(probe.trace.ez.iter()).enumerate() {
        match &probe.trace.magnitude {
            Some(abs) => writeln!(f, "{},{},{}", t * 1e9, ez, abs[i])?,
            None => writeln!(f, "{},{},", t * 1e9, ez)?,
        }
    }
    tracing::info!("Wrote probe trace to {:?}", path);

    let path = output_dir.join("probe_spectrum.csv");
    let mut f = std::fs::File::create(&path)?;
    writeln!(f, "f_GHz,amplitude")?;
    for (freq, a) in probe.spectrum.frequencies.iter().zip(probe.spectrum.amplitude.iter()) {
        writeln!(f, "{},{}", freq.as_ghz(), a)?;
    }

    if !probe.discontinuities.is_empty() {
        let path = output_dir.join("probe_edges.csv");
        let mut f = std::fs::File::create(&path)?;

        let header: Vec<String> = probe
            .discontinuities
            .iter()
            .map(|edge| format!("Ez_at_{:.3}_mm", edge.z * 1e3))
            .collect();
        writeln!(f, "t_ns,{}", header.join(","))?;
        for (i, t) in probe.trace.t.iter().enumerate() {
            let row: Vec<String> = probe.discontinuities.iter().map(|edge| edge.ez[i].to_string()).collect();
            writeln!(f, "{},{}", t * 1e9, row.join(","))?;
        }
        tracing::info!("Wrote cavity edge traces to {:?}", path);
    }

    Ok(())
}

fn write_summary_text(f: &mut impl Write, summary: &RunSummary) -> Result<()> {
    let p = summary.parameters;

    writeln!(f, "Wake-Kernel Run Summary: {}", summary.name)?;
    writeln!(f, "==================================")?;
    writeln!(f)?;
    writeln!(f, "Parameters:")?;
    writeln!(f, "  Charge:       {} nC", p.charge_nc)?;
    writeln!(f, "  sigma_z:      {:.4} mm ({:.3} ps)", p.sigmaz * 1e3, summary.sigma_t_ps)?;
    writeln!(f, "  init_time:    {:.4} ns", p.init_time * 1e9)?;
    writeln!(
        f,
        "  Cavity:       {:.1} x {:.1} x {:.1} mm",
        p.geometry.w_cavity * 1e3,
        p.geometry.h_cavity * 1e3,
        p.geometry.l_cavity * 1e3
    )?;
    writeln!(
        f,
        "  Beam pipe:    {:.1} x {:.1} x {:.1} mm",
        p.geometry.w_pipe * 1e3,
        p.geometry.h_pipe * 1e3,
        p.geometry.l_pipe * 1e3
    )?;
    writeln!(f)?;
    writeln!(f, "Wake:")?;
    writeln!(
        f,
        "  Offsets:      {} ({} negative, {} positive)",
        summary.wake_samples, summary.ns_neg, summary.ns_pos
    )?;
    writeln!(f, "  Wake length:  {:.3} mm", summary.wake_length_mm)?;
    writeln!(f, "  Loss factor:  {:.6e} V/pC", summary.k)?;
    writeln!(f)?;
    writeln!(f, "Impedance:")?;
    match (summary.peak_frequency_ghz, summary.peak_impedance_ohm) {
        (Some(freq), Some(z)) => {
            writeln!(f, "  Peak:         {:.4} GHz", freq)?;
            writeln!(f, "  |Z| at peak:  {:.4} Ohm", z)?;
        }
        _ => writeln!(f, "  Peak:         none")?,
    }
    writeln!(f, "  Degenerate:   {} bins", summary.degenerate_bins)?;

    if let Some(dominant) = summary.probe_dominant_ghz {
        writeln!(f)?;
        writeln!(f, "Probe:")?;
        writeln!(f, "  Dominant:     {:.4} GHz", dominant)?;
    }

    if let Some(c) = summary.comparison {
        writeln!(f)?;
        writeln!(f, "Reference comparison:")?;
        write_comparison_text(f, c)?;
    }

    Ok(())
}

fn write_comparison_text(f: &mut impl Write, c: &ComparisonSummary) -> Result<()> {
    let ghz = |v: Option<lib_types::Hertz>| v.map_or("n/a".to_string(), |h| format!("{:.4} GHz", h.as_ghz()));
    let num = |v: Option<f64>| v.map_or("n/a".to_string(), |x| format!("{:.4}", x));

    writeln!(f, "  Peak:          {}", ghz(c.peak_frequency))?;
    writeln!(f, "  Reference:     {}", ghz(c.reference_peak_frequency))?;
    writeln!(f, "  Shift:         {}", ghz(c.peak_shift))?;
    writeln!(f, "  Norm ratio:    {}", num(c.norm_ratio))?;
    writeln!(f, "  Wake RMS:      {} ({} points)", num(c.wake_rms), c.overlap_points)?;
    Ok(())
}

fn write_summary_csv(f: &mut impl Write, summary: &RunSummary) -> Result<()> {
    let opt = |v: Option<f64>| v.map_or(String::new(), |x| x.to_string());

    writeln!(f, "metric,value")?;
    writeln!(f, "sigmaz_m,{}", summary.parameters.sigmaz)?;
    writeln!(f, "init_time_s,{}", summary.parameters.init_time)?;
    writeln!(f, "wake_samples,{}", summary.wake_samples)?;
    writeln!(f, "wake_length_mm,{}", summary.wake_length_mm)?;
    writeln!(f, "k_V_per_pC,{}", summary.k)?;
    writeln!(f, "peak_frequency_GHz,{}", opt(summary.peak_frequency_ghz))?;
    writeln!(f, "peak_impedance_Ohm,{}", opt(summary.peak_impedance_ohm))?;
    writeln!(f, "degenerate_bins,{}", summary.degenerate_bins)?;
    writeln!(f, "probe_dominant_GHz,{}", opt(summary.probe_dominant_ghz))?;
    if let Some(c) = summary.comparison {
        writeln!(f, "reference_peak_GHz,{}", opt(c.reference_peak_frequency.map(|h| h.as_ghz())))?;
        writeln!(f, "peak_shift_GHz,{}", opt(c.peak_shift.map(|h| h.as_ghz())))?;
        writeln!(f, "norm_ratio,{}", opt(c.norm_ratio))?;
        writeln!(f, "wake_rms,{}", opt(c.wake_rms))?;
    }
    Ok(())
}

/// Print results to stdout.
pub fn print_results(results: &RunResults, format: OutputFormat) -> Result<()> {
    let summary = RunSummary::new(results);
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => write_summary_text(&mut stdout, &summary)?,
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string_pretty(&summary)?)?,
        OutputFormat::Csv => write_summary_csv(&mut stdout, &summary)?,
    }
    Ok(())
}

/// Print a comparison to stdout.
pub fn print_comparison(comparison: &ComparisonSummary, format: OutputFormat) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match format {
        OutputFormat::Text => {
            writeln!(stdout, "\n=== Reference Comparison ===\n")?;
            write_comparison_text(&mut stdout, comparison)?;
        }
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string_pretty(comparison)?)?,
        OutputFormat::Csv => {
            let opt = |v: Option<f64>| v.map_or(String::new(), |x| x.to_string());
            writeln!(stdout, "metric,value")?;
            writeln!(stdout, "peak_GHz,{}", opt(comparison.peak_frequency.map(|h| h.as_ghz())))?;
            writeln!(stdout, "reference_peak_GHz,{}", opt(comparison.reference_peak_frequency.map(|h| h.as_ghz())))?;
            writeln!(stdout, "peak_shift_GHz,{}", opt(comparison.peak_shift.map(|h| h.as_ghz())))?;
            writeln!(stdout, "norm_ratio,{}", opt(comparison.norm_ratio))?;
            writeln!(stdout, "wake_rms,{}", opt(comparison.wake_rms))?;
            writeln!(stdout, "overlap_points,{}", comparison.overlap_points)?;
        }
    }
    Ok(())
}

/// Print a probe report to stdout.
pub fn print_probe(report: &ProbeReport, format: OutputFormat) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    let dominant = report.spectrum.dominant;
    match format {
        OutputFormat::Text => {
            writeln!(stdout, "Probe at z[{}] = {:.4} mm", report.trace.z_index, report.trace.z * 1e3)?;
            writeln!(stdout, "  Samples:      {}", report.trace.ez.len())?;
            let peak = report.trace.ez.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            writeln!(stdout, "  max |Ez|:     {:.4e} V/m", peak)?;
            if let Some(abs) = &report.trace.magnitude {
                writeln!(stdout, "  max |E|:      {:.4e} V/m", abs.iter().fold(0.0_f64, |m, v| m.max(*v)))?;
            }
            match dominant {
                Some((f, a)) => writeln!(stdout, "  Dominant:     {:.4} GHz (amplitude {:.4e})", f.as_ghz(), a)?,
                None => writeln!(stdout, "  Dominant:     none")?,
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "z_index": report.trace.z_index,
                "z_m": report.trace.z,
                "samples": report.trace.ez.len(),
                "dominant_ghz": dominant.map(|(f, _)| f.as_ghz()),
                "dominant_amplitude": dominant.map(|(_, a)| a),
            });
            writeln!(stdout, "{}", serde_json::to_string_pretty(&json)?)?;
        }
        OutputFormat::Csv => {
            writeln!(stdout, "f_GHz,amplitude")?;
            for (freq, a) in report.spectrum.frequencies.iter().zip(report.spectrum.amplitude.iter()) {
                writeln!(stdout, "{},{}", freq.as_ghz(), a)?;
            }
        }
    }
    Ok(())
}

//! Post-processing pipeline.
//!
//! Stages run once, in order: parameter resolution, wake integration,
//! charge distribution, loss factor, impedance, then the optional field
//! probe and reference comparison.

use crate::config::{ParameterSource, RunConfig};
use anyhow::{Context, Result};
use lib_dsp::probe::{self, ProbeSpectrum, ProbeTrace};
use lib_dsp::{charge_distribution, compare, compute_wake_potential, impedance, loss_factor};
use lib_dsp::{ComparisonSummary, WakeParams};
use lib_io::FieldDataset;
use lib_types::units::{Meters, Seconds};
use lib_types::{ChargeDistribution, ImpedanceSpectrum, OffsetAxis, ReferenceData, WakePotential};
use serde::Serialize;
use std::path::Path;

/// Physical parameters after applying overrides.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedParameters {
    pub charge_nc: f64,
    pub sigmaz: f64,
    pub init_time: f64,
    pub geometry: ResolvedGeometry,
}

/// Structure dimensions after applying overrides [m].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedGeometry {
    pub w_pipe: f64,
    pub h_pipe: f64,
    pub l_pipe: f64,
    pub w_cavity: f64,
    pub h_cavity: f64,
    pub l_cavity: f64,
}

/// Field probe output.
#[derive(Clone, Debug, Serialize)]
pub struct ProbeReport {
    /// Trace at the configured (or centre) position.
    pub trace: ProbeTrace,
    pub spectrum: ProbeSpectrum,

    /// Traces at the cavity entrance and exit, where they fall on the grid.
    pub discontinuities: Vec<ProbeTrace>,
}

/// Everything a run produces.
#[derive(Clone, Debug)]
pub struct RunResults {
    pub name: String,
    pub parameters: ResolvedParameters,
    pub offsets: OffsetAxis,
    pub wake: WakePotential,
    pub charge: ChargeDistribution,
    /// Loss factor [V/pC].
    pub loss_factor: f64,
    pub impedance: ImpedanceSpectrum,
    pub probe: Option<ProbeReport>,
    pub comparison: Option<ComparisonSummary>,
}

/// Pipeline driver.
pub struct Orchestrator {
    config: RunConfig,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Load inputs and run every stage.
    pub fn run(&self) -> Result<RunResults> {
        let dataset = load_dataset(&self.config.input.dataset)?;
        let reference = self.load_reference()?;

        self.process(&dataset, reference.as_ref())
    }

    /// Run every stage on an already loaded dataset.
    pub fn process(&self, dataset: &FieldDataset, reference: Option<&ReferenceData>) -> Result<RunResults> {
        let parameters = self.resolve_parameters(dataset)?;
        tracing::debug!("Resolved parameters: {:?}", parameters);

        let params = WakeParams {
            init_time: Seconds(parameters.init_time),
            charge: self.config.beam.charge(),
            boundary: self.config.wake.boundary,
        };

        tracing::info!("Computing wake potential...");
        let (offsets, wake) = compute_wake_potential(&dataset.ez, params).context("Wake integration failed")?;

        let charge = charge_distribution(&wake, params.charge, Meters(parameters.sigmaz))
            .context("Failed to build charge distribution")?;
        let k = loss_factor(&charge, &wake).context("Loss factor failed")?;

        tracing::info!("Computing impedance...");
        let spectrum = impedance(&wake, &charge, &self.config.impedance.to_config())
            .context("Impedance transform failed")?;

        let probe = if self.config.probe.enabled {
            Some(self.run_probe(dataset, parameters.geometry.l_cavity)?)
        } else {
            None
        };

        let comparison = reference
            .map(|r| compare(&wake, &spectrum, r))
            .transpose()
            .context("Reference comparison failed")?;

        Ok(RunResults {
            name: self.config.name.clone(),
            parameters,
            offsets,
            wake,
            charge,
            loss_factor: k,
            impedance: spectrum,
            probe,
            comparison,
        })
    }

    fn resolve_parameters(&self, dataset: &FieldDataset) -> Result<ResolvedParameters> {
        let beam = &self.config.beam;
        let geometry = &self.config.geometry;
        let loaded = &dataset.geometry;

        let resolve = |name: &'static str, source: &ParameterSource, value: Option<f64>| {
            source
                .resolve(name, value)
                .with_context(|| format!("Cannot resolve parameter {}", name))
        };

        Ok(ResolvedParameters {
            charge_nc: beam.charge_nc,
            sigmaz: resolve("sigmaz", &beam.sigmaz, dataset.beam.sigmaz)?,
            init_time: resolve("init_time", &beam.init_time, dataset.beam.init_time)?,
            geometry: ResolvedGeometry {
                w_pipe: resolve("w_pipe", &geometry.w_pipe, loaded.w_pipe)?,
                h_pipe: resolve("h_pipe", &geometry.h_pipe, loaded.h_pipe)?,
                l_pipe: resolve("L_pipe", &geometry.l_pipe, loaded.l_pipe)?,
                w_cavity: resolve("w_cavity", &geometry.w_cavity, loaded.w_cavity)?,
                h_cavity: resolve("h_cavity", &geometry.h_cavity, loaded.h_cavity)?,
                l_cavity: resolve("L_cavity", &geometry.l_cavity, loaded.l_cavity)?,
            },
        })
    }

    fn run_probe(&self, dataset: &FieldDataset, l_cavity: f64) -> Result<ProbeReport> {
        let settings = &self.config.probe;
        let report = probe_dataset(dataset, settings.z_index, settings.stride)?;

        let discontinuities = [-l_cavity / 2.0, l_cavity / 2.0]
            .into_iter()
            .filter_map(|edge| probe::index_at(&dataset.ez, edge))
            .map(|index| probe::field_probe(&dataset.ez, None, None, index))
            .collect::<Result<Vec<_>, _>>()
            .context("Cavity edge probe failed")?;

        Ok(ProbeReport {
            discontinuities,
            ..report
        })
    }

    fn load_reference(&self) -> Result<Option<ReferenceData>> {
        let input = &self.config.input;

        if let Some(path) = &input.reference {
            let reference = lib_io::load_reference(path)
                .with_context(|| format!("Failed to load reference {:?}", path))?;
            return Ok(Some(reference));
        }
        if input.reference_wake.is_some() || input.reference_impedance.is_some() {
            let reference =
                lib_io::load_reference_tables(input.reference_wake.as_deref(), input.reference_impedance.as_deref())
                    .context("Failed to load reference tables")?;
            return Ok(Some(reference));
        }
        Ok(None)
    }
}

/// Load a dataset, telling malformed content apart from unreadable files.
pub fn load_dataset(path: &Path) -> Result<FieldDataset> {
    lib_io::load_dataset(path).map_err(|err| {
        let what = if err.is_malformed_input() { "Malformed dataset" } else { "Failed to read dataset" };
        anyhow::Error::new(err).context(format!("{} {:?}", what, path))
    })
}

/// Probe a dataset at `z_index` (default the centre) without cavity edges.
pub fn probe_dataset(dataset: &FieldDataset, z_index: Option<usize>, stride: usize) -> Result<ProbeReport> {
    let index = z_index.unwrap_or_else(|| probe::center_index(&dataset.ez));
    let trace = probe::field_probe(&dataset.ez, dataset.ex.as_ref(), dataset.ey.as_ref(), index)
        .context("Field probe failed")?;

    let dt = dataset
        .ez
        .dt()
        .context("Field has too few time samples for a probe spectrum")?;
    let spectrum = probe::probe_spectrum(&trace.ez, dt, stride).context("Probe spectrum failed")?;

    Ok(ProbeReport {
        trace,
        spectrum,
        discontinuities: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use lib_io::{BeamScalars, Geometry};
    use lib_types::axis::linspace;
    use lib_types::units::Hertz;
    use lib_types::FieldMap;
    use ndarray::Array2;
    use std::f64::consts::PI;

    const NZ: usize = 20;
    const NT: usize = 200;
    const DT: f64 = 1e-12;

    /// Damped 5 GHz ringing over a 20 mm structure, 200 ps of field.
    fn dataset() -> FieldDataset {
        let z = linspace(-0.01, 0.01, NZ + 1);
        let t: Vec<f64> = (0..NT).map(|i| i as f64 * DT).collect();
        let values = Array2::from_shape_fn((NZ + 1, NT), |(iz, it)| {
            let envelope = (-(t[it] / 80e-12)).exp();
            -1e3 * envelope * (2.0 * PI * 5e9 * t[it] + z[iz] * 100.0).cos()
        });
        let ez = FieldMap::new(values, z, t);

        FieldDataset {
            ex: None,
            ey: None,
            bx: None,
            by: None,
            rho: None,
            x: None,
            y: None,
            nt: NT,
            nz: NZ,
            beam: BeamScalars {
                sigmaz: Some(5e-3),
                ..Default::default()
            },
            geometry: Geometry::default(),
            ez,
        }
    }

    fn config(extra: &str) -> RunConfig {
        let content = format!(
            "[input]\ndataset = \"out.json\"\n\n[beam]\ninit_time = {{ override = 1e-11 }}\n{}",
            extra
        );
        parse_config(&content, false).unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let orchestrator = Orchestrator::new(config("sigmaz = \"loaded\"\n")).unwrap();
        let results = orchestrator.process(&dataset(), None).unwrap();

        // 10 ps before the reference time, 1 ps steps
        assert_eq!(results.offsets.ns_neg, 10);
        assert_eq!(results.wake.len(), results.offsets.len());
        assert_eq!(results.charge.len(), results.wake.len());
        assert_eq!(results.parameters.sigmaz, 5e-3);
        assert_eq!(results.parameters.init_time, 1e-11);
        assert_eq!(results.parameters.geometry.l_cavity, 30e-3);

        assert!(results.loss_factor.is_finite());
        assert!(!results.impedance.is_empty());
        assert!(results.impedance.peak().is_some());
        assert!(results.probe.is_none());
        assert!(results.comparison.is_none());
    }

    #[test]
    fn test_missing_loaded_parameter_fails() {
        // the dataset carries no L_cavity
        let orchestrator = Orchestrator::new(config("\n[geometry]\nl_cavity = \"loaded\"\n")).unwrap();
        let err = orchestrator.process(&dataset(), None).unwrap_err();
        assert!(format!("{:#}", err).contains("L_cavity"));
    }

    #[test]
    fn test_probe_and_comparison() {
        let orchestrator = Orchestrator::new(config(
            "\n[geometry]\nl_cavity = { override = 0.01 }\n\n[probe]\nenabled = true\nstride = 1\n",
        ))
        .unwrap();

        let data = dataset();
        let first = orchestrator.process(&data, None).unwrap();
        let reference = ReferenceData {
            s: first.wake.s.clone(),
            wake: first.wake.values.iter().map(|w| 2.0 * w).collect(),
            frequencies: vec![Hertz::from_ghz(1.0), Hertz::from_ghz(2.0)],
            impedance: vec![1.0, 4.0],
            ..Default::default()
        };

        let results = orchestrator.process(&data, Some(&reference)).unwrap();

        let report = results.probe.unwrap();
        assert_eq!(report.trace.z_index, NZ / 2);
        assert_eq!(report.discontinuities.len(), 2);
        let (f, _) = report.spectrum.dominant.unwrap();
        let bin = report.spectrum.frequencies[1].0;
        assert!((f.0 - 5e9).abs() <= bin, "dominant at {} GHz", f.as_ghz());

        let summary = results.comparison.unwrap();
        assert_eq!(summary.reference_peak_frequency, Some(Hertz::from_ghz(2.0)));
        // scaling the reference does not change the normalised wake
        assert!(summary.wake_rms.unwrap() < 1e-9);
    }
}

//! Run configuration loading and validation.

use anyhow::{Context, Result};
use lib_dsp::impedance::{DegeneratePolicy, DftConvention, ImpedanceConfig, ImpedanceMethod};
use lib_dsp::probe::DEFAULT_PROBE_STRIDE;
use lib_dsp::wake::BoundaryPolicy;
use lib_dsp::{DspError, DspResult};
use lib_types::units::{Coulombs, Hertz, SPEED_OF_LIGHT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level run configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run name, echoed in the summary.
    #[serde(default = "default_name")]
    pub name: String,

    /// Input files.
    pub input: InputConfig,

    /// Source bunch parameters.
    #[serde(default)]
    pub beam: BeamConfig,

    /// Structure dimensions.
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Wake integration settings.
    #[serde(default)]
    pub wake: WakeConfig,

    /// Impedance transform settings.
    #[serde(default)]
    pub impedance: ImpedanceSection,

    /// Field probe settings.
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_name() -> String {
    "wake-kernel run".to_string()
}

/// Input file locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field dataset (JSON).
    pub dataset: PathBuf,

    /// Reference results as a JSON object.
    #[serde(default)]
    pub reference: Option<PathBuf>,

    /// Reference wake as an ASCII export (s in mm, W in V/pC).
    #[serde(default)]
    pub reference_wake: Option<PathBuf>,

    /// Reference impedance as an ASCII export (f in GHz, |Z| in Ohm).
    #[serde(default)]
    pub reference_impedance: Option<PathBuf>,
}

impl InputConfig {
    /// True if any reference source is configured.
    pub fn has_reference(&self) -> bool {
        self.reference.is_some() || self.reference_wake.is_some() || self.reference_impedance.is_some()
    }
}

/// Where a physical parameter comes from.
///
/// In TOML: `sigmaz = "loaded"` or `sigmaz = { override = 0.0187 }`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// Use the value stored in the dataset.
    Loaded,
    /// Replace the dataset value.
    Override(f64),
}

impl ParameterSource {
    /// Resolve against the value found in the dataset.
    pub fn resolve(&self, name: &'static str, loaded: Option<f64>) -> DspResult<f64> {
        match *self {
            Self::Loaded => loaded.ok_or_else(|| {
                DspError::malformed(name, "not present in the dataset and no override configured")
            }),
            Self::Override(value) => {
                match loaded {
                    Some(stored) => tracing::warn!(
                        "Overriding {}: dataset value {:e} replaced by {:e}",
                        name,
                        stored,
                        value
                    ),
                    None => tracing::warn!("Overriding {}: no dataset value, using {:e}", name, value),
                }
                Ok(value)
            }
        }
    }
}

/// Source bunch parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeamConfig {
    /// Bunch charge [nC].
    #[serde(default = "default_charge_nc")]
    pub charge_nc: f64,

    /// RMS bunch length [m].
    #[serde(default = "default_sigmaz")]
    pub sigmaz: ParameterSource,

    /// Time the bunch centre enters the structure [s].
    #[serde(default = "default_init_time")]
    pub init_time: ParameterSource,
}

fn default_charge_nc() -> f64 { 1.0 }
fn default_sigmaz() -> ParameterSource { ParameterSource::Override(1e-9 / 16.0 * SPEED_OF_LIGHT) }
fn default_init_time() -> ParameterSource { ParameterSource::Override(5.332370636221942e-10) }

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            charge_nc: default_charge_nc(),
            sigmaz: default_sigmaz(),
            init_time: default_init_time(),
        }
    }
}

impl BeamConfig {
    pub fn charge(&self) -> Coulombs {
        Coulombs::from_nc(self.charge_nc)
    }
}

/// Structure dimensions [m].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeometryConfig {
    #[serde(default = "default_pipe_width")]
    pub w_pipe: ParameterSource,
    #[serde(default = "default_pipe_width")]
    pub h_pipe: ParameterSource,
    #[serde(default = "default_pipe_length", alias = "L_pipe")]
    pub l_pipe: ParameterSource,
    #[serde(default = "default_cavity_width")]
    pub w_cavity: ParameterSource,
    #[serde(default = "default_cavity_width")]
    pub h_cavity: ParameterSource,
    #[serde(default = "default_cavity_length", alias = "L_cavity")]
    pub l_cavity: ParameterSource,
}

fn default_pipe_width() -> ParameterSource { ParameterSource::Override(15e-3) }
fn default_pipe_length() -> ParameterSource { ParameterSource::Override(50e-3) }
fn default_cavity_width() -> ParameterSource { ParameterSource::Override(50e-3) }
fn default_cavity_length() -> ParameterSource { ParameterSource::Override(30e-3) }

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            w_pipe: default_pipe_width(),
            h_pipe: default_pipe_width(),
            l_pipe: default_pipe_length(),
            w_cavity: default_cavity_width(),
            h_cavity: default_cavity_width(),
            l_cavity: default_cavity_length(),
        }
    }
}

/// Wake integration settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WakeConfig {
    /// Handling of retarded times beyond the last time sample.
    #[serde(default)]
    pub boundary: BoundaryPolicy,
}

/// Impedance transform settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImpedanceSection {
    #[serde(default)]
    pub method: ImpedanceMethod,

    /// Highest frequency of interest [GHz].
    #[serde(default = "default_f_max_ghz")]
    pub f_max_ghz: f64,

    /// Direct DFT bin count.
    #[serde(default = "default_n_samples")]
    pub n_samples: usize,

    /// Zeros appended before the direct DFT.
    #[serde(default = "default_padding")]
    pub padding: usize,

    /// Zeros appended before the padded FFT.
    #[serde(default = "default_fft_pad")]
    pub fft_pad: usize,

    #[serde(default)]
    pub convention: DftConvention,

    #[serde(default)]
    pub degenerate: DegeneratePolicy,
}

fn default_f_max_ghz() -> f64 { 5.0 }
fn default_n_samples() -> usize { 1000 }
fn default_padding() -> usize { 1 }
fn default_fft_pad() -> usize { 10_000 }

impl Default for ImpedanceSection {
    fn default() -> Self {
        Self {
            method: ImpedanceMethod::default(),
            f_max_ghz: default_f_max_ghz(),
            n_samples: default_n_samples(),
            padding: default_padding(),
            fft_pad: default_fft_pad(),
            convention: DftConvention::default(),
            degenerate: DegeneratePolicy::default(),
        }
    }
}

impl ImpedanceSection {
    pub fn to_config(&self) -> ImpedanceConfig {
        ImpedanceConfig {
            method: self.method,
            f_max: Hertz::from_ghz(self.f_max_ghz),
            n_samples: self.n_samples,
            padding: self.padding,
            fft_pad: self.fft_pad,
            convention: self.convention,
            degenerate: self.degenerate,
        }
    }
}

/// Field probe settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Native-grid z index; defaults to the centre.
    #[serde(default)]
    pub z_index: Option<usize>,

    /// Decimation before the probe spectrum.
    #[serde(default = "default_stride")]
    pub stride: usize,
}

fn default_stride() -> usize { DEFAULT_PROBE_STRIDE }

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            z_index: None,
            stride: default_stride(),
        }
    }
}

/// Load configuration from a file.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content, path.extension().map_or(false, |e| e == "json"))?;

    validate_config(&config)?;

    Ok(config)
}

/// Parse configuration text, JSON or TOML.
pub fn parse_config(content: &str, is_json: bool) -> Result<RunConfig> {
    let config: RunConfig = if is_json {
        serde_json::from_str(content).with_context(|| "Failed to parse config as JSON")?
    } else {
        toml::from_str(content).with_context(|| "Failed to parse config as TOML")?
    };
    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if !config.input.dataset.exists() {
        anyhow::bail!("Dataset file not found: {:?}", config.input.dataset);
    }
    for path in [
        &config.input.reference,
        &config.input.reference_wake,
        &config.input.reference_impedance,
    ]
    .into_iter()
    .flatten()
    {
        if !path.exists() {
            anyhow::bail!("Reference file not found: {:?}", path);
        }
    }

    check_parameters(config)
}

/// Checks that do not touch the filesystem.
fn check_parameters(config: &RunConfig) -> Result<()> {
    if config.beam.charge_nc == 0.0 || !config.beam.charge_nc.is_finite() {
        anyhow::bail!("Bunch charge must be finite and non-zero (got {} nC)", config.beam.charge_nc);
    }
    if let ParameterSource::Override(sigmaz) = config.beam.sigmaz {
        if !(sigmaz > 0.0) {
            anyhow::bail!("sigmaz override must be positive (got {} m)", sigmaz);
        }
    }
    if let ParameterSource::Override(init_time) = config.beam.init_time {
        if !(init_time >= 0.0) {
            anyhow::bail!("init_time override must be non-negative (got {} s)", init_time);
        }
    }
    if !(config.impedance.f_max_ghz > 0.0) {
        anyhow::bail!("f_max_ghz must be positive (got {})", config.impedance.f_max_ghz);
    }
    if config.impedance.method == ImpedanceMethod::DirectDft && config.impedance.n_samples == 0 {
        anyhow::bail!("n_samples must be at least 1 for the direct DFT");
    }
    if config.probe.stride == 0 {
        anyhow::bail!("Probe stride must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[input]
dataset = "out.json"
"#;

    #[test]
    fn test_defaults_reproduce_reference_scenario() {
        let config = parse_config(MINIMAL, false).unwrap();

        assert_eq!(config.beam.charge_nc, 1.0);
        match config.beam.sigmaz {
            ParameterSource::Override(v) => assert!((v - 0.01873702862).abs() < 1e-9),
            other => panic!("unexpected sigmaz source {:?}", other),
        }
        assert_eq!(config.beam.init_time, ParameterSource::Override(5.332370636221942e-10));
        assert_eq!(config.geometry.l_cavity, ParameterSource::Override(30e-3));
        assert_eq!(config.geometry.w_pipe, ParameterSource::Override(15e-3));
        assert_eq!(config.wake.boundary, BoundaryPolicy::Skip);
        assert_eq!(config.impedance.method, ImpedanceMethod::PaddedFft);
        assert_eq!(config.probe.stride, 5);
        assert!(!config.probe.enabled);
    }

    #[test]
    fn test_parameter_sources_parse() {
        let content = r#"
name = "cube cavity"

[input]
dataset = "out.json"
reference_impedance = "z.txt"

[beam]
sigmaz = "loaded"
init_time = { override = 1e-10 }

[geometry]
L_cavity = { override = 0.04 }

[wake]
boundary = "clamp"

[impedance]
method = "direct_dft"
convention = "angular"
degenerate = "fail"
f_max_ghz = 3.0
"#;
        let config = parse_config(content, false).unwrap();

        assert_eq!(config.name, "cube cavity");
        assert!(config.input.has_reference());
        assert_eq!(config.beam.sigmaz, ParameterSource::Loaded);
        assert_eq!(config.beam.init_time, ParameterSource::Override(1e-10));
        assert_eq!(config.geometry.l_cavity, ParameterSource::Override(0.04));
        assert_eq!(config.wake.boundary, BoundaryPolicy::Clamp);

        let impedance = config.impedance.to_config();
        assert_eq!(impedance.method, ImpedanceMethod::DirectDft);
        assert_eq!(impedance.convention, DftConvention::Angular);
        assert_eq!(impedance.degenerate, DegeneratePolicy::Fail);
        assert!((impedance.f_max.as_ghz() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_config() {
        let content = r#"{
            "input": { "dataset": "out.json" },
            "beam": { "charge_nc": 2.0, "sigmaz": { "override": 0.01 } },
            "probe": { "enabled": true, "z_index": 12 }
        }"#;
        let config = parse_config(content, true).unwrap();

        assert_eq!(config.beam.charge_nc, 2.0);
        assert_eq!(config.beam.sigmaz, ParameterSource::Override(0.01));
        assert!(config.probe.enabled);
        assert_eq!(config.probe.z_index, Some(12));
    }

    #[test]
    fn test_resolve() {
        assert_eq!(ParameterSource::Loaded.resolve("sigmaz", Some(0.02)).unwrap(), 0.02);
        assert_eq!(ParameterSource::Override(0.03).resolve("sigmaz", Some(0.02)).unwrap(), 0.03);
        assert_eq!(ParameterSource::Override(0.03).resolve("sigmaz", None).unwrap(), 0.03);
        assert!(matches!(
            ParameterSource::Loaded.resolve("sigmaz", None),
            Err(DspError::MalformedInput { what: "sigmaz", .. })
        ));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut config = parse_config(MINIMAL, false).unwrap();
        config.beam.charge_nc = 0.0;
        assert!(check_parameters(&config).is_err());

        let mut config = parse_config(MINIMAL, false).unwrap();
        config.beam.sigmaz = ParameterSource::Override(-1.0);
        assert!(check_parameters(&config).is_err());

        let mut config = parse_config(MINIMAL, false).unwrap();
        config.probe.stride = 0;
        assert!(check_parameters(&config).is_err());
    }

    #[test]
    fn test_load_config_checks_files() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("out.json");
        std::fs::write(&dataset, "{}").unwrap();

        let config_path = dir.path().join("run.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "[input]\ndataset = {:?}", dataset.to_str().unwrap()).unwrap();
        assert!(load_config(&config_path).is_ok());

        let missing = dir.path().join("missing.toml");
        std::fs::write(&missing, "[input]\ndataset = \"/nonexistent/out.json\"\n").unwrap();
        assert!(load_config(&missing).is_err());
    }
}

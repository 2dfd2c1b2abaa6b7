//! Wake-Kernel CLI: wake potential, loss factor and impedance of a cavity
//! from a time-domain field simulation.
//!
//! This is the main entry point for the wake-kernel post-processor.

mod config;
mod orchestrator;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lib_dsp::probe::DEFAULT_PROBE_STRIDE;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "wake-kernel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full post-processing pipeline
    Run {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Print the shapes and scalars of a field dataset
    Inspect {
        /// Path to the dataset (JSON)
        dataset: PathBuf,
    },

    /// Probe the longitudinal field at one z position
    Probe {
        /// Path to the dataset (JSON)
        dataset: PathBuf,

        /// Grid index along z (default: centre)
        #[arg(long)]
        z_index: Option<usize>,

        /// Decimation stride before the spectrum
        #[arg(long, default_value_t = DEFAULT_PROBE_STRIDE)]
        stride: usize,
    },

    /// Run the pipeline and compare against the configured reference
    Compare {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Run { config, output } => {
            run_pipeline(&config, &output, cli.format)?;
        }
        Commands::Inspect { dataset } => {
            inspect(&dataset, cli.format)?;
        }
        Commands::Probe { dataset, z_index, stride } => {
            probe(&dataset, z_index, stride, cli.format)?;
        }
        Commands::Compare { config } => {
            compare(&config, cli.format)?;
        }
    }

    Ok(())
}

fn run_pipeline(config_path: &Path, output_dir: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    let orchestrator = orchestrator::Orchestrator::new(config)?;

    tracing::info!("Starting run...");
    let results = orchestrator.run()?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    output::write_results(&results, output_dir, format)?;
    output::print_results(&results, format)?;

    tracing::info!("Run complete. Results written to {:?}", output_dir);
    Ok(())
}

fn inspect(path: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Inspecting dataset: {:?}", path);

    let dataset = orchestrator::load_dataset(path)?;
    let (zmin, zmax) = dataset.ez.z_bounds().unwrap_or((0.0, 0.0));
    let (t0, t1) = (dataset.ez.t[0], dataset.ez.t[dataset.nt - 1]);
    let dt = dataset.ez.dt().map(|dt| dt.0);

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "components": dataset.components(),
                "nt": dataset.nt,
                "nz": dataset.nz,
                "z_range_m": [zmin, zmax],
                "t_range_s": [t0, t1],
                "dt_s": dt,
                "sigmaz": dataset.beam.sigmaz,
                "init_time": dataset.beam.init_time,
                "xtest": dataset.beam.xtest,
                "ytest": dataset.beam.ytest,
                "w_cavity": dataset.geometry.w_cavity,
                "h_cavity": dataset.geometry.h_cavity,
                "L_cavity": dataset.geometry.l_cavity,
                "w_pipe": dataset.geometry.w_pipe,
                "h_pipe": dataset.geometry.h_pipe,
                "L_pipe": dataset.geometry.l_pipe,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Csv => {
            let opt = |v: Option<f64>| v.map_or(String::new(), |x| x.to_string());
            println!("key,value");
            println!("nt,{}", dataset.nt);
            println!("nz,{}", dataset.nz);
            println!("zmin_m,{}", zmin);
            println!("zmax_m,{}", zmax);
            println!("t0_s,{}", t0);
            println!("t1_s,{}", t1);
            println!("sigmaz,{}", opt(dataset.beam.sigmaz));
            println!("init_time,{}", opt(dataset.beam.init_time));
            println!("L_cavity,{}", opt(dataset.geometry.l_cavity));
        }
        OutputFormat::Text => {
            println!("Field Dataset: {}", path.display());
            println!("  Components: {}", dataset.components().join(", "));
            println!("  Time steps: {}", dataset.nt);
            println!("  z points:   {} (nz = {})", dataset.nz + 1, dataset.nz);
            println!("  z range:    {:.4} .. {:.4} mm", zmin * 1e3, zmax * 1e3);
            println!("  t range:    {:.4} .. {:.4} ns", t0 * 1e9, t1 * 1e9);
            if let Some(dt) = dt {
                println!("  dt:         {:.4} ps", dt * 1e12);
            }
            if let (Some(x), Some(y)) = (&dataset.x, &dataset.y) {
                println!("  Transverse: {} x {} points", x.len(), y.len());
            }

            println!("\n  Scalars:");
            let scalars = [
                ("sigmaz", dataset.beam.sigmaz),
                ("init_time", dataset.beam.init_time),
                ("xtest", dataset.beam.xtest),
                ("ytest", dataset.beam.ytest),
                ("w_cavity", dataset.geometry.w_cavity),
                ("h_cavity", dataset.geometry.h_cavity),
                ("L_cavity", dataset.geometry.l_cavity),
                ("w_pipe", dataset.geometry.w_pipe),
                ("h_pipe", dataset.geometry.h_pipe),
                ("L_pipe", dataset.geometry.l_pipe),
            ];
            for (name, value) in scalars {
                match value {
                    Some(v) => println!("    {:<10} {:e}", name, v),
                    None => println!("    {:<10} -", name),
                }
            }
        }
    }

    Ok(())
}

fn probe(path: &Path, z_index: Option<usize>, stride: usize, format: OutputFormat) -> Result<()> {
    tracing::info!("Probing dataset: {:?}", path);

    let dataset = orchestrator::load_dataset(path)?;
    let report = orchestrator::probe_dataset(&dataset, z_index, stride)?;

    output::print_probe(&report, format)
}

fn compare(config_path: &Path, format: OutputFormat) -> Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);

    let config = config::load_config(config_path)?;
    if !config.input.has_reference() {
        anyhow::bail!("No reference configured in {:?}; set input.reference or the reference tables", config_path);
    }

    let results = orchestrator::Orchestrator::new(config)?.run()?;
    let comparison = results
        .comparison
        .as_ref()
        .context("Pipeline produced no comparison")?;

    output::print_comparison(comparison, format)
}

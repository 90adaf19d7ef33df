//! # openpmd
//!
//! A command-line tool for inspecting and writing openPMD series.
//!
//! ## Usage
//!
//! ```bash
//! # Print series attributes and iterations
//! openpmd info diags/run%T.json
//!
//! # Write a small demo series
//! openpmd demo diags/demo.json --iterations 5
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use openpmd::attributable::Attributes;
use openpmd::config::Config;
use openpmd::io::AccessType;
use openpmd::series::{Series, SeriesOptions};

/// openpmd - Backend-agnostic openPMD series tool
#[derive(Parser)]
#[command(name = "openpmd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display series attributes and iterations
    Info {
        /// Series path, e.g. `diags/run%T.json`
        #[arg(value_name = "SERIES")]
        series: String,
    },

    /// Write a demo series
    Demo {
        /// Series path, e.g. `diags/demo.json`
        #[arg(value_name = "SERIES", default_value = "demo.json")]
        series: String,

        /// Number of iterations to write
        #[arg(short = 'n', long, default_value = "3")]
        iterations: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let options = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            SeriesOptions::from_config(&config)
        }
        None => SeriesOptions::default(),
    };

    match cli.command {
        Commands::Info { series } => run_info(&series, options),
        Commands::Demo { series, iterations } => run_demo(&series, iterations, options),
    }
}

/// Print a summary of an existing series
fn run_info(path: &str, options: SeriesOptions) -> Result<()> {
    let series = Series::with_options(path, AccessType::ReadOnly, options)
        .with_context(|| format!("Failed to open series {}", path))?;

    println!("Series:     {}", series.name());
    println!("Directory:  {}", series.directory().display());
    println!("Backend:    {}", series.backend_kind());
    println!("Encoding:   {}", series.iteration_encoding());
    println!();
    println!("Attributes:");
    for name in series.attributable().attribute_names() {
        if let Some(value) = series.get_attribute(name) {
            println!("  {:<22} {}", name, value);
        }
    }
    println!();
    println!("Iterations: {}", series.iterations().len());
    for (index, iteration) in series.iterations().iter() {
        println!(
            "  {:>8}  time={} dt={} meshes={} particles={}",
            index,
            iteration.time()?,
            iteration.dt()?,
            iteration.meshes().written(),
            iteration.particles().written()
        );
    }
    Ok(())
}

/// Write a series with `count` iterations
fn run_demo(path: &str, count: u64, options: SeriesOptions) -> Result<()> {
    info!("Writing demo series {} with {} iterations", path, count);

    let mut series = Series::with_options(path, AccessType::Create, options)
        .with_context(|| format!("Failed to create series {}", path))?;
    series
        .set_author("openpmd demo")
        .set_software("openpmd")
        .set_software_version(env!("CARGO_PKG_VERSION"));

    for index in 0..count {
        let iteration = series.iterations_mut().get_or_create(index * 100);
        iteration.set_time(index as f64 * 0.5).set_dt(0.5);
        iteration
            .meshes_mut()
            .set_attribute("geometry", "cartesian");
        iteration
            .particles_mut()
            .set_attribute("species", vec!["electrons".to_string()]);
    }

    series.close().context("Failed to write series")?;
    info!("Done");
    Ok(())
}

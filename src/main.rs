//! Orbit propagator comparator
//!
//! Reads a YAML configuration, propagates the orbit it describes with the
//! numerical and the DSST propagators, and prints both final states with
//! their wall-clock run times.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use orbit_comparator::{DataContext, OrbitComparator, OrbitComparatorInputs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML configuration, looked up in the working directory, then in resources/
    config: PathBuf,

    /// Directory crawled for auxiliary data (default: ~/orekit-data)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Gravity coefficient file to use instead of crawling the data directory
    #[arg(long)]
    gravity_file: Option<PathBuf>,
}

/// Configuration path as given, else under `resources/`
fn resolve_config(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    let resource = Path::new("resources").join(path);
    if resource.is_file() {
        return Ok(resource);
    }
    Err(anyhow!("Configuration file {:?} not found (also looked in resources/)", path))
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args.config)?;
    log::info!("Read inputs in: {}", config.display());
    let inputs = OrbitComparatorInputs::from_file(&config)
        .with_context(|| format!("Failed to load {}", config.display()))?;
    let settings = inputs.validate().context("Invalid configuration")?;
    log::info!("Read inputs done!");

    let mut data = DataContext::resolve(args.data_dir);
    if let Some(path) = args.gravity_file {
        data = data.with_gravity_file(path);
    }

    let report = OrbitComparator::new(settings, data)
        .run()
        .context("Propagation failed")?;
    println!("{}", report);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

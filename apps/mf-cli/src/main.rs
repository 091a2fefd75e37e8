mod error;

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use error::{CliError, CliResult};
use mf_constants::constants;
use mf_data::{AnalysisConfig, CsvConfig, Dataset, UnitMap, load_units_csv, load_yaml, save_units_csv, write_units_csv};
use mf_flux::Analysis;
use tracing::info;

#[derive(Parser)]
#[command(name = "mf-cli")]
#[command(about = "microflux CLI - eddy-covariance fluxes from turbulence data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Units CSV: column names, then units, then data rows
    data: PathBuf,
    /// Analysis configuration YAML (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Field delimiter of the data file
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Columns to drop while reading (repeatable)
    #[arg(long = "skip")]
    skip: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an analysis configuration file
    Validate {
        /// Path to the configuration YAML
        config: PathBuf,
    },
    /// Add derived thermodynamic columns to a dataset
    Preprocess {
        #[command(flatten)]
        input: InputArgs,
        /// Output units CSV
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Compute fluxes, one row per averaging window
    Fluxes {
        #[command(flatten)]
        input: InputArgs,
        /// Output units CSV (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the physical constants table
    Constants,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Preprocess { input, output } => cmd_preprocess(&input, &output),
        Commands::Fluxes { input, output } => cmd_fluxes(&input, output.as_deref()),
        Commands::Constants => cmd_constants(),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<AnalysisConfig> {
    match path {
        Some(path) => load_yaml(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_input(input: &InputArgs) -> CliResult<(Dataset, UnitMap)> {
    let csv = CsvConfig {
        delimiter: input.delimiter,
        ..CsvConfig::default()
    }
    .with_skip_columns(input.skip.iter().cloned());
    let (ds, units) = load_units_csv(&input.data, &csv).map_err(|source| CliError::Read {
        path: input.data.clone(),
        source,
    })?;
    info!(rows = ds.len(), columns = ds.n_columns(), "loaded {}", input.data.display());
    Ok((ds, units))
}

fn cmd_validate(path: &Path) -> CliResult<()> {
    println!("Validating configuration: {}", path.display());
    let config = load_config(Some(path))?;
    config.validate()?;
    println!("✓ Configuration is valid");
    Ok(())
}

fn cmd_preprocess(input: &InputArgs, output: &Path) -> CliResult<()> {
    let analysis = Analysis::new(load_config(input.config.as_deref())?)?;
    let (ds, units) = load_input(input)?;

    let start = Instant::now();
    let (out, out_units) = analysis.preprocess_only(&ds, &units)?;
    save_units_csv(output, &out, &out_units)?;

    println!(
        "✓ Wrote {} columns ({} added) to {} in {:.1} ms",
        out.n_columns(),
        out.n_columns() - ds.n_columns(),
        output.display(),
        start.elapsed().as_secs_f64() * 1e3
    );
    Ok(())
}

fn cmd_fluxes(input: &InputArgs, output: Option<&Path>) -> CliResult<()> {
    let analysis = Analysis::new(load_config(input.config.as_deref())?)?;
    let (ds, units) = load_input(input)?;

    let start = Instant::now();
    let table = analysis.run(&ds, &units)?;
    let out = table.to_dataset()?;
    info!(windows = table.len(), elapsed_ms = start.elapsed().as_millis() as u64, "fluxes computed");

    if let Some(path) = output {
        save_units_csv(path, &out, table.units())?;
        println!("✓ Wrote {} windows to {}", table.len(), path.display());
    } else {
        write_units_csv(io::stdout().lock(), &out, table.units())?;
    }
    Ok(())
}

fn cmd_constants() -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    for (name, value) in constants().iter() {
        writeln!(stdout, "{:<30} {}", name, value)?;
    }
    Ok(())
}

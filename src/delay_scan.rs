use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use eldest::{
    config::{ RunConfig, Sources },
    driver::{ self, Setup },
    units::atu_to_second,
};

/// Photoelectron spectra after both pulses as a function of pump-probe delay.
#[derive(Parser)]
#[command(name = "delay_scan", version, long_about = None)]
struct Cli {
    /// TOML run file; `grid.delay_step` sets the delay step
    config: PathBuf,

    /// Precomputed Franck-Condon tables (JSON)
    #[arg(long, value_name = "FILE")]
    fc: Option<PathBuf>,

    /// Tabulated Γ(R): R [bohr] and Γ [hartree] per line
    #[arg(long, value_name = "FILE")]
    gamma: Option<PathBuf>,

    /// Output directory, overriding the run file
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let run_config
        = RunConfig::from_file(&cli.config)
        .with_context(|| format!("reading run file {}", cli.config.display()))?;
    let sources
        = Sources::load(cli.fc.as_deref(), cli.gamma.as_deref())
        .context("reading external tables")?;
    let mut run = run_config.to_atomic(sources).context("invalid run")?;
    if let Some(dir) = cli.out { run.output.dir = dir; }

    let setup = Setup::new(&run).context("setting up decay channels")?;
    driver::log_channels(&setup);
    let (d_min, d_max) = driver::delay_range(&run.ir);
    log::info!(
        "scanning delays from {:.4e} s to {:.4e} s",
        atu_to_second(d_min), atu_to_second(d_max),
    );

    let spectra = driver::delay_scan(&run, &setup).context("delay scan")?;
    log::info!(
        "{} spectra written to {}",
        spectra.len(), run.output.dir.display(),
    );
    Ok(())
}

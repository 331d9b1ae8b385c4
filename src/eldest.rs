use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use eldest::{
    config::{ self, RunConfig, Sources },
    driver::{ self, Setup },
};

/// Time-resolved ICD/RICD photoelectron spectra.
#[derive(Parser)]
#[command(name = "eldest", version, long_about = None)]
struct Cli {
    /// TOML run file
    config: PathBuf,

    /// Precomputed Franck-Condon tables (JSON)
    #[arg(long, value_name = "FILE")]
    fc: Option<PathBuf>,

    /// Tabulated Γ(R): R [bohr] and Γ [hartree] per line
    #[arg(long, value_name = "FILE")]
    gamma: Option<PathBuf>,

    /// Write the computed Franck-Condon tables here
    #[arg(long, value_name = "FILE")]
    fc_out: Option<PathBuf>,

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
    if let (Some(path), Some(vib)) = (cli.fc_out.as_ref(), setup.get_vibronic()) {
        config::write_fc(path, &vib.to_file())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Franck-Condon tables written to {}", path.display());
    }

    let spectra = driver::time_scan(&run, &setup).context("time scan")?;
    log::info!(
        "{} spectra written to {}",
        spectra.len(), run.output.dir.display(),
    );
    Ok(())
}

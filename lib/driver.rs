//! Time and pump-probe delay scans.
//!
//! A [`Setup`] reduces the electronic model of a [`Run`] to a list of
//! [`Channel`]s (and, where defined, the resonance levels the wavepacket is
//! projected on). [`time_scan`] then follows the observation time from the
//! start of the XUV pulse to `t_max` through the temporal regimes, and
//! [`delay_scan`] evaluates the spectrum after both pulses for a range of IR
//! delays around the XUV peak.
//!
//! Everything computed before the loops (overlap tables, channel weights,
//! per-energy dressings and Fourier caches) is read-only inside them.

use std::{
    f64::consts::PI,
    fs::File,
    io::{ BufWriter, Write },
    path::{ Path, PathBuf },
};
use num_complex::Complex64 as C64;
use crate::{
    amplitude::*,
    config::{ Model, Run },
    coupled::CoupledResonances,
    error::{ ConfigError, EldestError },
    pulse::IrPulse,
    regime::{ RegimeMachine, TemporalRegime },
    spectrum::{ Spectrum, SpectrumWriter },
    units::{ atu_to_second, hartree_to_ev },
    utils::arange,
    vibronic::VibronicStructure,
};

pub type DriverResult<T> = Result<T, EldestError>;

/// Name of the wavepacket projection file.
pub const WAVEPACKET_FILE: &str = "wp_res.dat";

/// Channels and resonance levels of a run.
#[derive(Clone, Debug)]
pub struct Setup {
    channels: Vec<Channel>,
    levels: Vec<Pole>,
    vib: Option<VibronicStructure>,
    coupled: Option<CoupledResonances>,
}

impl Setup {
    /// Build the channels of the run's electronic model, computing (or
    /// reading) the vibronic structure if there is one.
    pub fn new(run: &Run) -> DriverResult<Self> {
        match &run.model {
            Model::Single { e_r, e_fin, couplings } => {
                Ok(Self {
                    channels: vec![Channel::single(*e_r, *e_fin, couplings)],
                    levels: vec![wavepacket_single(*e_r, couplings)],
                    vib: None,
                    coupled: None,
                })
            },
            Model::Coupled { params, e_fin } => {
                let coupled = CoupledResonances::new(params)?;
                Ok(Self {
                    channels: vec![coupled.channel(*e_fin)],
                    levels: Vec::new(),
                    vib: None,
                    coupled: Some(coupled),
                })
            },
            Model::Vibronic { params, couplings, fc } => {
                let vib
                    = match fc {
                        Some(file) => {
                            log::info!("Franck-Condon overlaps are read from file");
                            VibronicStructure::from_file(params, file)?
                        },
                        None => {
                            log::info!("Franck-Condon overlaps are computed from scratch");
                            VibronicStructure::new(params, &run.integ)?
                        },
                    };
                Ok(Self {
                    channels: Channel::vibronic(&vib, couplings),
                    levels: wavepacket_levels(&vib, couplings),
                    vib: Some(vib),
                    coupled: None,
                })
            },
        }
    }

    pub fn get_channels(&self) -> &[Channel] { &self.channels }

    /// Resonance levels, weighted for the wavepacket projection.
    pub fn get_levels(&self) -> &[Pole] { &self.levels }

    pub fn get_vibronic(&self) -> Option<&VibronicStructure> { self.vib.as_ref() }

    pub fn get_coupled(&self) -> Option<&CoupledResonances> { self.coupled.as_ref() }
}

/// Kinetic energies of a run.
pub fn energy_grid(run: &Run) -> Vec<f64> {
    arange(run.grid.e_min, run.grid.e_max, run.grid.e_step).to_vec()
}

/// Observation times of a time scan, from the start of the XUV pulse.
pub fn time_grid(run: &Run) -> Vec<f64> {
    arange(run.xuv.start(), run.grid.t_max, run.grid.t_step).to_vec()
}

/// Range of IR delays covered by a delay scan: half a carrier period of a
/// sin² pulse, or one carrier period of a Gaussian one, centered on the XUV
/// peak.
pub fn delay_range(ir: &IrPulse) -> (f64, f64) {
    let half
        = if ir.get_envelope().is_sinsq() {
            ir.duration() / (2.0 * ir.get_n_cycles())
        } else {
            PI / ir.get_omega()
        };
    (-half, half)
}

fn output_err(path: &Path) -> impl FnOnce(std::io::Error) -> EldestError {
    let path = path.to_path_buf();
    move |source| EldestError::Output { path, source }
}

// writes `level  t[s]  Re Im` lines
struct WavepacketWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl WavepacketWriter {
    fn new(dir: &Path) -> DriverResult<Self> {
        std::fs::create_dir_all(dir).map_err(output_err(dir))?;
        let path = dir.join(WAVEPACKET_FILE);
        let file = File::create(&path).map_err(output_err(&path))?;
        Ok(Self { path, out: BufWriter::new(file) })
    }

    fn write(&mut self, t: f64, amps: &[C64]) -> DriverResult<()> {
        let t_s = atu_to_second(t);
        amps.iter().enumerate()
            .try_for_each(|(l, a)| {
                writeln!(self.out, "{}   {:.18}   {:.15e} {:+.15e}", l, t_s, a.re, a.im)
            })
            .and_then(|_| self.out.flush())
            .map_err(output_err(&self.path))
    }
}

fn spectrum(
    engine: &AmplitudeEngine,
    samples: &[EnergySample],
    channels: &[Channel],
    t: f64,
    label: f64,
    regime: TemporalRegime,
) -> DriverResult<Spectrum>
{
    let formula = engine.formula(regime);
    let mut spec = Spectrum::new(label);
    for sample in samples.iter() {
        let intensity = engine.intensity(sample, channels, t, &formula)?;
        spec.push(sample.get_e_kin(), intensity);
    }
    Ok(spec)
}

/// Follow the observation time through the temporal regimes, writing one
/// spectrum per time step and, if requested, the wavepacket projection.
///
/// Returns the spectra in time order (empty if only the wavepacket is
/// requested).
pub fn time_scan(run: &Run, setup: &Setup) -> DriverResult<Vec<Spectrum>> {
    let engine = AmplitudeEngine::new(run.xuv, run.ir, run.integ, run.fourier)?;
    let out = &run.output;
    let spectra_wanted = !out.wavepacket_only;
    let samples: Vec<EnergySample>
        = if spectra_wanted {
            energy_grid(run).into_iter()
                .map(|e| engine.sample(e))
                .collect::<DriverResult<_>>()?
        } else {
            Vec::new()
        };
    let mut writer
        = spectra_wanted
        .then(|| SpectrumWriter::new(&out.dir, &out.name, out.per_step))
        .transpose()?;
    let mut wp_writer
        = (out.wavepacket || out.wavepacket_only)
        .then(|| WavepacketWriter::new(&out.dir))
        .transpose()?;

    let mut machine = RegimeMachine::new(*engine.get_timing());
    let mut spectra: Vec<Spectrum> = Vec::new();
    for t in time_grid(run) {
        let regime = machine.advance(t)?;
        log::info!("t = {:.6e} s", atu_to_second(t));
        if let Some(w) = writer.as_mut() {
            let spec = spectrum(&engine, &samples, &setup.channels, t, t, regime)?;
            w.write(&spec)?;
            spec.log_maxima();
            spectra.push(spec);
        }
        if let Some(w) = wp_writer.as_mut() {
            let amps: Vec<C64>
                = setup.levels.iter()
                .map(|level| engine.wavepacket(level, t))
                .collect::<DriverResult<_>>()?;
            w.write(t, &amps)?;
        }
    }
    Ok(spectra)
}

/// Evaluate the spectrum after both pulses for each IR delay in
/// [`delay_range`], stepping by `grid.delay_step`.
///
/// The time column of the records holds the delay.
pub fn delay_scan(run: &Run, setup: &Setup) -> DriverResult<Vec<Spectrum>> {
    let step
        = run.grid.delay_step
        .ok_or(ConfigError::MissingKey("grid.delay_step"))?;
    let (d_min, d_max) = delay_range(&run.ir);
    let ir0 = run.ir.with_delay(d_min);
    let engine0 = AmplitudeEngine::overlapping(run.xuv, ir0, run.integ, run.fourier)?;
    let samples0: Vec<EnergySample>
        = energy_grid(run).into_iter()
        .map(|e| engine0.sample(e))
        .collect::<DriverResult<_>>()?;
    let out = &run.output;
    let mut writer = SpectrumWriter::new(&out.dir, &out.name, out.per_step)?;

    let mut spectra: Vec<Spectrum> = Vec::new();
    for delay in arange(d_min, d_max, step).to_vec() {
        let engine = engine0.with_delay(delay)?;
        let samples: Vec<EnergySample>
            = samples0.iter()
            .map(|s| s.with_delay(delay))
            .collect::<DriverResult<_>>()?;
        let t = engine.get_timing().end().max(delay + run.ir.duration());
        log::info!(
            "delay = {:.6e} s, observed at t = {:.6e} s",
            atu_to_second(delay), atu_to_second(t),
        );
        let spec
            = spectrum(
                &engine, &samples, &setup.channels, t, delay,
                TemporalRegime::AfterIr,
            )?;
        writer.write(&spec)?;
        spec.log_maxima();
        spectra.push(spec);
    }
    Ok(spectra)
}

/// Log the energies and widths of the channels' poles.
pub fn log_channels(setup: &Setup) {
    let n_poles: usize = setup.channels.iter().map(|ch| ch.poles.len()).sum();
    log::info!(
        "{} final channels with {} resonance poles",
        setup.channels.len(), n_poles,
    );
    for (mu, ch) in setup.channels.iter().enumerate().take(5) {
        log::debug!(
            "channel {}: E_fin = {:.6} eV, {} poles",
            mu, hartree_to_ev(ch.e_fin), ch.poles.len(),
        );
    }
}

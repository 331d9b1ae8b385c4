//! Run configuration.
//!
//! A run is described by a single TOML file in conventional units (eV, s,
//! W/cm², Å, amu) and deserialized into a [`RunConfig`]. [`RunConfig::to_atomic`]
//! validates it against any external inputs (a precomputed Franck-Condon table
//! or a tabulated Γ(R)) and converts everything once to atomic units.
//!
//! ```toml
//! [xuv]
//! energy = 44.0          # eV
//! cycles = 3.0
//! intensity = 1e13       # W/cm²
//! shape = "sinsq"
//!
//! [ir]
//! energy = 1.6
//! cycles = 10.0
//! intensity = 1e12
//! shape = "sinsq"
//! delay = 5e-15          # s
//!
//! [resonance]
//! energy = 44.0
//! lifetime = 2e-15
//! q = 5.0
//! final_energy = 20.0
//!
//! [grid]
//! t_max = 1e-14
//! t_step = 2e-16
//! e_min = 20.0
//! e_max = 27.0
//! e_step = 0.02
//! ```

use std::{
    fs,
    path::{ Path, PathBuf },
};
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    amplitude::Couplings,
    coupled::CoupledParams,
    dressing::FourierParams,
    error::ConfigError,
    interp::{ DEF_ORDER, Table },
    pulse::{ Envelope, IrPulse, XuvField, XuvPulse },
    quad::{ Integrator, Method, QuadParams },
    regime::Timing,
    units::*,
    vibronic::*,
};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// XUV pulse, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XuvConfig {
    /// Photon energy Ω [eV].
    pub energy: f64,
    pub cycles: f64,
    /// Peak intensity [W/cm²].
    pub intensity: f64,
    pub shape: Envelope,
    #[serde(default = "default_field")]
    pub field: XuvField,
    /// FWHM of a Gaussian envelope [s], overriding `cycles`.
    #[serde(default)]
    pub fwhm: Option<f64>,
}

fn default_field() -> XuvField { XuvField::Convoluted }

/// IR pulse, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IrConfig {
    /// Photon energy ω [eV].
    pub energy: f64,
    pub cycles: f64,
    /// Peak intensity [W/cm²]; zero switches the IR pulse off.
    pub intensity: f64,
    pub shape: Envelope,
    /// Carrier-envelope phase [rad].
    #[serde(default)]
    pub phase: f64,
    /// Delay Δt of the IR peak after the XUV peak [s].
    #[serde(default)]
    pub delay: f64,
    /// FWHM of a Gaussian envelope [s], overriding `cycles`.
    #[serde(default)]
    pub fwhm: Option<f64>,
}

/// Electronic resonance and final state, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResonanceConfig {
    /// Resonance energy *E*_r [eV].
    pub energy: f64,
    /// Lifetime τ = 1/Γ [s].
    pub lifetime: f64,
    /// Ground → resonance dipole [au].
    #[serde(default = "default_rdg")]
    pub rdg: f64,
    /// Fano asymmetry parameter.
    pub q: f64,
    /// Electronic energy of the final state [eV].
    pub final_energy: f64,
}

fn default_rdg() -> f64 { 1.0 }

/// Second resonance coupled to the first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoupledConfig {
    /// Energy of the second resonance [eV].
    pub energy: f64,
    /// Lifetime of the second resonance [s].
    pub lifetime: f64,
    /// Interaction matrix element *w* between the two resonances [eV].
    pub coupling: f64,
}

/// Morse potential, in conventional units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MorseConfig {
    /// Well depth [eV].
    pub de: f64,
    /// Range parameter [1/Å].
    pub alpha: f64,
    /// Equilibrium distance [Å].
    pub req: f64,
}

/// Final electronic state, in conventional units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FinalConfig {
    /// Bound final state at `resonance.final_energy`.
    Morse { de: f64, alpha: f64, req: f64 },
    /// Repulsive final state `a / R + b`.
    Repulsive {
        /// [eV Å]
        a: f64,
        /// [eV]
        b: f64,
        /// Turning-point step [Å].
        step: f64,
        /// Overlap magnitude below which a pseudo-state is negligible.
        threshold: f64,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
}

fn default_max_steps() -> usize { DEF_MAX_STEPS }

/// R-dependence of the decay width.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GammaKind {
    #[default]
    Const,
    R6,
    External,
}

/// Nuclear motion, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VibronicConfig {
    /// Nuclear masses [amu].
    pub mass1: f64,
    pub mass2: f64,
    pub ground: MorseConfig,
    pub resonance: MorseConfig,
    #[serde(rename = "final")]
    pub final_state: FinalConfig,
    #[serde(default)]
    pub gamma: GammaKind,
    #[serde(default)]
    pub partial: Option<Partial>,
    /// Read the overlaps from a file instead of computing them.
    #[serde(default)]
    pub fc_precalc: bool,
    /// Bounds of the overlap integrals [Å].
    #[serde(default = "default_r_min")]
    pub r_min: f64,
    #[serde(default = "default_r_max")]
    pub r_max: f64,
}

fn default_r_min() -> f64 { FC_R_MIN }

fn default_r_max() -> f64 { FC_R_MAX }

/// Time and energy grids, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Last observation time [s].
    pub t_max: f64,
    /// Observation time step [s].
    pub t_step: f64,
    /// Kinetic energy grid [eV].
    pub e_min: f64,
    pub e_max: f64,
    pub e_step: f64,
    /// Step of a pump-probe delay scan [s].
    #[serde(default)]
    pub delay_step: Option<f64>,
}

/// Integration strategies and tolerances.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default = "default_inner")]
    pub inner: Method,
    #[serde(default = "default_outer")]
    pub outer: Method,
    #[serde(flatten)]
    pub params: QuadParams,
}

fn default_inner() -> Method { Method::Analytic }

fn default_outer() -> Method { Method::Quadrature }

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            inner: default_inner(),
            outer: default_outer(),
            params: QuadParams::default(),
        }
    }
}

/// Output files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory all files are written to.
    pub dir: PathBuf,
    /// Name of the consolidated spectrum file.
    pub name: String,
    /// Also write one file per time step.
    pub per_step: bool,
    /// Write the projection of the resonance wavepacket on each level.
    pub wavepacket: bool,
    /// Compute only the wavepacket projection, skipping spectra.
    pub wavepacket_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            name: String::from("full.dat"),
            per_step: false,
            wavepacket: false,
            wavepacket_only: false,
        }
    }
}

/// Complete description of a run, in conventional units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub xuv: XuvConfig,
    pub ir: IrConfig,
    pub resonance: ResonanceConfig,
    #[serde(default)]
    pub coupled: Option<CoupledConfig>,
    #[serde(default)]
    pub vibronic: Option<VibronicConfig>,
    pub grid: GridConfig,
    #[serde(default)]
    pub integration: IntegrationConfig,
    #[serde(default)]
    pub fourier: FourierParams,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Optional external inputs accompanying a run file.
#[derive(Clone, Debug, Default)]
pub struct Sources {
    /// Precomputed Franck-Condon tables.
    pub fc: Option<FcFile>,
    /// Tabulated Γ(R).
    pub gamma: Option<Table>,
}

impl Sources {
    /// Read whichever of the two inputs are given.
    pub fn load(fc: Option<&Path>, gamma: Option<&Path>) -> ConfigResult<Self> {
        Ok(Self {
            fc: fc.map(read_fc).transpose()?,
            gamma: gamma.map(read_gamma_table).transpose()?,
        })
    }
}

/// Grids, in atomic units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Grid {
    pub t_max: f64,
    pub t_step: f64,
    pub e_min: f64,
    pub e_max: f64,
    pub e_step: f64,
    pub delay_step: Option<f64>,
}

/// Electronic model of a run, in atomic units.
#[derive(Clone, Debug, PartialEq)]
pub enum Model {
    /// One resonance decaying into one final state.
    Single { e_r: f64, e_fin: f64, couplings: Couplings },
    /// Two coupled resonances decaying into one final state.
    Coupled { params: CoupledParams, e_fin: f64 },
    /// One resonance with nuclear motion in all three electronic states.
    Vibronic {
        params: VibronicParams,
        couplings: Couplings,
        fc: Option<FcFile>,
    },
}

impl Model {
    pub fn is_single(&self) -> bool { matches!(self, Self::Single { .. }) }

    pub fn is_coupled(&self) -> bool { matches!(self, Self::Coupled { .. }) }

    pub fn is_vibronic(&self) -> bool { matches!(self, Self::Vibronic { .. }) }
}

/// A validated run, in atomic units.
#[derive(Clone, Debug)]
pub struct Run {
    pub xuv: XuvPulse,
    pub ir: IrPulse,
    pub integ: Integrator,
    pub fourier: FourierParams,
    pub model: Model,
    pub grid: Grid,
    pub output: OutputConfig,
}

impl RunConfig {
    /// Parse a run file.
    pub fn from_file<P>(path: P) -> ConfigResult<Self>
    where P: AsRef<Path>
    {
        let path = path.as_ref();
        let text
            = fs::read_to_string(path)
            .map_err(|err| ConfigError::io(path, err))?;
        Self::from_str(&text)
    }

    /// Parse the contents of a run file.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Check the combination of optional inputs against the requested models.
    pub fn check_sources(&self, sources: &Sources) -> ConfigResult<()> {
        let fc = sources.fc.as_ref();
        let has_gamma = sources.gamma.is_some();
        let Some(vib) = self.vibronic.as_ref() else {
            if fc.is_some() { return Err(ConfigError::FcNotRequested); }
            if has_gamma {
                return Err(ConfigError::GammaNotExternal("none".into()));
            }
            return Ok(());
        };
        if fc.is_some() && !vib.fc_precalc {
            return Err(ConfigError::FcNotRequested);
        }
        if vib.fc_precalc && fc.is_none() {
            return Err(ConfigError::FcNotProvided);
        }
        if has_gamma && vib.gamma != GammaKind::External {
            return Err(ConfigError::GammaNotExternal(format!("{:?}", vib.gamma)));
        }
        if vib.gamma == GammaKind::External && fc.is_none() && !has_gamma {
            return Err(ConfigError::ExternalWithoutSource);
        }
        if fc.is_some() && has_gamma {
            return Err(ConfigError::BothSources);
        }
        if let Some(file) = fc {
            match (vib.partial, file.res_fin_bare.is_some()) {
                (Some(_), false) => {
                    return Err(ConfigError::Partial(
                        "the Franck-Condon table has no resonance-final \
                        overlaps without Γ(R)".into()
                    ));
                },
                (None, true) => {
                    return Err(ConfigError::Partial(
                        "the Franck-Condon table has resonance-final overlaps \
                        without Γ(R), but no partial treatment was requested"
                        .into()
                    ));
                },
                _ => { },
            }
        }
        if vib.partial.is_some() && vib.gamma == GammaKind::Const {
            return Err(ConfigError::Partial(
                "partial treatment needs an R-dependent width model".into()
            ));
        }
        Ok(())
    }

    /// Validate against the optional inputs and convert to atomic units.
    pub fn to_atomic(&self, sources: Sources) -> ConfigResult<Run> {
        self.check_sources(&sources)?;
        if self.coupled.is_some() && self.vibronic.is_some() {
            return Err(ConfigError::Conflict("coupled", "vibronic"));
        }
        let xuv = self.xuv_pulse()?;
        let ir = self.ir_pulse()?;
        Timing::new(&xuv, &ir)?;
        let integ
            = Integrator::new(
                self.integration.inner, self.integration.outer,
                self.integration.params,
            )?;
        ConfigError::check_positive("fourier.step", self.fourier.step)?;
        let grid = self.grid()?;

        let res = &self.resonance;
        ConfigError::check_positive("resonance.lifetime", res.lifetime)?;
        if res.q == 0.0 || !res.q.is_finite() {
            return Err(ConfigError::BadValue { name: "resonance.q", value: res.q });
        }
        let e_r = ev_to_hartree(res.energy);
        let e_fin = ev_to_hartree(res.final_energy);
        let gamma = 1.0 / second_to_atu(res.lifetime);
        let couplings = Couplings::new(res.rdg, res.q, gamma);

        let model
            = if let Some(cpl) = self.coupled.as_ref() {
                ConfigError::check_positive("coupled.lifetime", cpl.lifetime)?;
                ConfigError::check_nonnegative("coupled.coupling", cpl.coupling)?;
                let params = CoupledParams {
                    e_a: e_r,
                    e_b: ev_to_hartree(cpl.energy),
                    gamma_a: gamma,
                    gamma_b: 1.0 / second_to_atu(cpl.lifetime),
                    interact: ev_to_hartree(cpl.coupling).powi(2),
                    rdg: res.rdg,
                    q: res.q,
                };
                Model::Coupled { params, e_fin }
            } else if let Some(vib) = self.vibronic.as_ref() {
                let params = vibronic_params(vib, e_r, e_fin, couplings.v, &xuv, sources.gamma)?;
                Model::Vibronic { params, couplings, fc: sources.fc }
            } else {
                Model::Single { e_r, e_fin, couplings }
            };

        Ok(Run {
            xuv,
            ir,
            integ,
            fourier: self.fourier,
            model,
            grid,
            output: self.output.clone(),
        })
    }

    fn xuv_pulse(&self) -> ConfigResult<XuvPulse> {
        let x = &self.xuv;
        ConfigError::check_positive("xuv.energy", x.energy)?;
        ConfigError::check_positive("xuv.cycles", x.cycles)?;
        ConfigError::check_nonnegative("xuv.intensity", x.intensity)?;
        if let Some(fwhm) = x.fwhm {
            ConfigError::check_positive("xuv.fwhm", fwhm)?;
        }
        let xuv = XuvPulse::new(
            ev_to_hartree(x.energy),
            x.cycles,
            wcm2_to_aiu(x.intensity),
            x.shape,
            x.field,
            x.fwhm.map(second_to_atu),
        );
        log::info!(
            "XUV: T = {:.6e} s, A0 = {:.6e} au, reaches up to {:.5} eV",
            atu_to_second(xuv.duration()), xuv.a0(), hartree_to_ev(xuv.ex_max()),
        );
        if xuv.get_envelope().is_gauss() {
            log::info!(
                "XUV: σ = {:.6e} s, FWHM = {:.6e} s",
                atu_to_second(xuv.sigma()), atu_to_second(xuv.fwhm()),
            );
        }
        Ok(xuv)
    }

    fn ir_pulse(&self) -> ConfigResult<IrPulse> {
        let l = &self.ir;
        ConfigError::check_positive("ir.energy", l.energy)?;
        ConfigError::check_positive("ir.cycles", l.cycles)?;
        ConfigError::check_nonnegative("ir.intensity", l.intensity)?;
        if let Some(fwhm) = l.fwhm {
            ConfigError::check_positive("ir.fwhm", fwhm)?;
        }
        let ir = IrPulse::new(
            ev_to_hartree(l.energy),
            l.cycles,
            wcm2_to_aiu(l.intensity),
            l.shape,
            l.phase,
            second_to_atu(l.delay),
            l.fwhm.map(second_to_atu),
        );
        log::info!(
            "IR: T = {:.6e} s, A0 = {:.6e} au, from {:.6e} s to {:.6e} s",
            atu_to_second(ir.duration()), ir.a0(),
            atu_to_second(ir.start()), atu_to_second(ir.end()),
        );
        Ok(ir)
    }

    fn grid(&self) -> ConfigResult<Grid> {
        let g = &self.grid;
        ConfigError::check_positive("grid.t_step", g.t_step)?;
        ConfigError::check_positive("grid.e_step", g.e_step)?;
        ConfigError::check_positive("grid.e_min", g.e_min)?;
        ConfigError::check_nonnegative("grid.e_max - grid.e_min", g.e_max - g.e_min)?;
        if let Some(step) = g.delay_step {
            ConfigError::check_positive("grid.delay_step", step)?;
        }
        Ok(Grid {
            t_max: second_to_atu(g.t_max),
            t_step: second_to_atu(g.t_step),
            e_min: ev_to_hartree(g.e_min),
            e_max: ev_to_hartree(g.e_max),
            e_step: ev_to_hartree(g.e_step),
            delay_step: g.delay_step.map(second_to_atu),
        })
    }
}

fn morse(pot: &MorseConfig, mu: f64) -> ConfigResult<Morse> {
    // 1/Å -> 1/bohr
    let alpha = bohr_to_angstrom(pot.alpha);
    Ok(Morse::new(ev_to_hartree(pot.de), alpha, angstrom_to_bohr(pot.req), mu)?)
}

fn vibronic_params(
    vib: &VibronicConfig,
    e_r: f64,
    e_fin: f64,
    v_er: f64,
    xuv: &XuvPulse,
    table: Option<Table>,
) -> ConfigResult<VibronicParams>
{
    ConfigError::check_positive("vibronic.mass1", vib.mass1)?;
    ConfigError::check_positive("vibronic.mass2", vib.mass2)?;
    let mu = red_mass_au(vib.mass1, vib.mass2);
    log::info!("reduced mass: {:.6} au", mu);
    let final_pot
        = match vib.final_state {
            FinalConfig::Morse { de, alpha, req } => FinalPotential::Morse {
                pot: morse(&MorseConfig { de, alpha, req }, mu)?,
                e_fin,
            },
            FinalConfig::Repulsive { a, b, step, threshold, max_steps } => {
                ConfigError::check_positive("vibronic.final.step", step)?;
                ConfigError::check_positive("vibronic.final.threshold", threshold)?;
                FinalPotential::Repulsive {
                    pot: Repulsive::new(
                        ev_to_hartree(angstrom_to_bohr(a)),
                        ev_to_hartree(b),
                        mu,
                    )?,
                    step: angstrom_to_bohr(step),
                    threshold,
                    max_steps,
                }
            },
        };
    let gamma
        = match vib.gamma {
            GammaKind::Const => GammaModel::Const,
            GammaKind::R6 => GammaModel::R6,
            GammaKind::External => GammaModel::External(table),
        };
    let bounds = FcBounds {
        r_min: angstrom_to_bohr(vib.r_min),
        r_max: angstrom_to_bohr(vib.r_max),
    };
    ConfigError::check_positive("vibronic.r_max - vibronic.r_min", bounds.r_max - bounds.r_min)?;
    Ok(VibronicParams {
        ground: morse(&vib.ground, mu)?,
        resonance: morse(&vib.resonance, mu)?,
        final_pot,
        e_r,
        v_er,
        gamma,
        partial: vib.partial,
        ex_max: xuv.ex_max(),
        bounds,
    })
}

/// Read a precomputed Franck-Condon table file.
pub fn read_fc<P>(path: P) -> ConfigResult<FcFile>
where P: AsRef<Path>
{
    let path = path.as_ref();
    let text
        = fs::read_to_string(path)
        .map_err(|err| ConfigError::io(path, err))?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a Franck-Condon table file.
pub fn write_fc<P>(path: P, file: &FcFile) -> ConfigResult<()>
where P: AsRef<Path>
{
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(file)?;
    fs::write(path, text).map_err(|err| ConfigError::io(path, err))
}

/// Parse a two-column Γ(R) table (R in bohr, Γ in hartree).
///
/// Blank lines and lines starting with `#` are skipped.
///
/// ```
/// use eldest::config::parse_gamma_table;
///
/// let text = "# R Gamma\n1.0 0.4\n2.0 0.3\n3.0 0.2\n4.0 0.1\n";
/// let table = parse_gamma_table(text).unwrap();
/// assert!((table.eval(2.5) - 0.25).abs() < 1e-12);
/// ```
pub fn parse_gamma_table(text: &str) -> ConfigResult<Table> {
    let mut r: Vec<f64> = Vec::new();
    let mut g: Vec<f64> = Vec::new();
    for (k, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        let mut cols = line.split_whitespace().map(|c| c.parse::<f64>());
        match (cols.next(), cols.next(), cols.next()) {
            (Some(Ok(rk)), Some(Ok(gk)), None) => {
                r.push(rk);
                g.push(gk);
            },
            _ => { return Err(ConfigError::GammaTable(k + 1)); },
        }
    }
    let r: nd::Array1<f64> = r.into();
    let g: nd::Array1<f64> = g.into();
    Ok(Table::new(r, g, DEF_ORDER)?)
}

/// Read a Γ(R) table file.
pub fn read_gamma_table<P>(path: P) -> ConfigResult<Table>
where P: AsRef<Path>
{
    let path = path.as_ref();
    let text
        = fs::read_to_string(path)
        .map_err(|err| ConfigError::io(path, err))?;
    parse_gamma_table(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        [xuv]
        energy = 44.0
        cycles = 3.0
        intensity = 1e13
        shape = "sinsq"

        [ir]
        energy = 1.6
        cycles = 10.0
        intensity = 1e12
        shape = "sinsq"
        delay = 5e-14

        [resonance]
        energy = 44.0
        lifetime = 2e-15
        q = 5.0
        final_energy = 20.0

        [grid]
        t_max = 1e-14
        t_step = 2e-16
        e_min = 20.0
        e_max = 27.0
        e_step = 0.02
    "#;

    const VIB: &str = r#"
        [vibronic]
        mass1 = 20.0
        mass2 = 20.0
        gamma = "external"
        fc_precalc = true
        ground = { de = 0.1, alpha = 1.5, req = 3.0 }
        resonance = { de = 0.3, alpha = 1.5, req = 2.5 }
        final = { type = "repulsive", a = 5.0, b = 20.0, step = 0.05, threshold = 1e-3 }
    "#;

    fn fc_file(bare: bool) -> FcFile {
        FcFile {
            gs_res: vec![vec![1.0]],
            gs_fin: vec![vec![1.0]],
            res_fin: vec![vec![1.0]],
            res_fin_bare: bare.then(|| vec![vec![1.0]]),
            levels: vec![0.0],
            converged: true,
        }
    }

    #[test]
    fn single_resonance_run() {
        let cfg = RunConfig::from_str(BASE).unwrap();
        let run = cfg.to_atomic(Sources::default()).unwrap();
        assert!(run.model.is_single());
        assert_eq!(run.integ.inner, Method::Analytic);
        assert_eq!(run.output.name, "full.dat");
        assert!((run.grid.e_min - ev_to_hartree(20.0)).abs() < 1e-15);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = format!("{BASE}\n[output]\nper_stpe = true\n");
        assert!(matches!(RunConfig::from_str(&text), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn source_combinations() {
        let vib = RunConfig::from_str(&format!("{BASE}{VIB}")).unwrap();
        let base = RunConfig::from_str(BASE).unwrap();
        let table = parse_gamma_table("1 1\n2 1\n3 1\n4 1\n").unwrap();

        let fc = Sources { fc: Some(fc_file(false)), gamma: None };
        assert!(matches!(base.check_sources(&fc), Err(ConfigError::FcNotRequested)));
        assert!(vib.check_sources(&fc).is_ok());

        let none = Sources::default();
        assert!(matches!(vib.check_sources(&none), Err(ConfigError::FcNotProvided)));

        let both = Sources { fc: Some(fc_file(false)), gamma: Some(table.clone()) };
        assert!(matches!(vib.check_sources(&both), Err(ConfigError::BothSources)));

        let mut no_fc = vib.clone();
        if let Some(v) = no_fc.vibronic.as_mut() { v.fc_precalc = false; }
        assert!(matches!(
            no_fc.check_sources(&none),
            Err(ConfigError::ExternalWithoutSource),
        ));
        let mut r6 = no_fc.clone();
        if let Some(v) = r6.vibronic.as_mut() { v.gamma = GammaKind::R6; }
        let gamma = Sources { fc: None, gamma: Some(table) };
        assert!(matches!(
            r6.check_sources(&gamma),
            Err(ConfigError::GammaNotExternal(_)),
        ));

        let bare = Sources { fc: Some(fc_file(true)), gamma: None };
        assert!(matches!(vib.check_sources(&bare), Err(ConfigError::Partial(_))));
        let mut partial = vib.clone();
        if let Some(v) = partial.vibronic.as_mut() { v.partial = Some(Partial::Exponent); }
        assert!(partial.check_sources(&bare).is_ok());
        assert!(matches!(partial.check_sources(&fc), Err(ConfigError::Partial(_))));
    }

    #[test]
    fn coupled_and_vibronic_conflict() {
        let text = format!(
            "{BASE}{VIB}\n[coupled]\nenergy = 44.5\nlifetime = 5e-15\ncoupling = 0.01\n");
        let cfg = RunConfig::from_str(&text).unwrap();
        let sources = Sources { fc: Some(fc_file(false)), gamma: None };
        assert!(matches!(
            cfg.to_atomic(sources),
            Err(ConfigError::Conflict("coupled", "vibronic")),
        ));
    }

    #[test]
    fn ir_must_not_lead_the_xuv() {
        let text = BASE.replace("delay = 5e-14", "delay = 0.0");
        let cfg = RunConfig::from_str(&text).unwrap();
        assert!(matches!(
            cfg.to_atomic(Sources::default()),
            Err(ConfigError::Regime(_)),
        ));
    }

    #[test]
    fn malformed_gamma_table() {
        assert!(matches!(
            parse_gamma_table("1.0 0.5\n2.0\n"),
            Err(ConfigError::GammaTable(2)),
        ));
        assert!(matches!(
            parse_gamma_table("1.0 0.5\n0.5 0.4\n0.7 0.3\n0.9 0.1\n"),
            Err(ConfigError::Interp(_)),
        ));
    }

    #[test]
    fn fc_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fc.json");
        let file = fc_file(true);
        write_fc(&path, &file).unwrap();
        assert_eq!(read_fc(&path).unwrap(), file);
    }
}

//! Vibrational structure of the ground, resonance, and final electronic states.
//!
//! Ground and resonance states are Morse oscillators,
//! ```text
//! V(R) = De (1 - exp(-α (R - Req)))²
//! ```
//! whose bound levels and normalized eigenfunctions are known in closed form.
//! The final state is either another Morse oscillator or a repulsive curve
//! `V(R) = a / R + b`, whose continuum is discretized into energy-normalized
//! pseudo-states: each one is the Airy function of the potential linearized
//! about a classical turning point *R*ₘ, with energy `a / R`ₘ above the
//! asymptote. Turning points are stepped outward by a fixed Δ*R*, so a sum over
//! pseudo-states approximates an energy integral with the density-of-states
//! weight `ΔR E`ₘ`² / a`.
//!
//! All Franck-Condon overlaps are computed once, before any amplitude, and are
//! read-only afterwards. Overlaps that cannot be evaluated carry a validity
//! flag and contribute nothing to the sums built from them.

use std::f64::consts::PI;
use log::{ debug, info, warn };
use ndarray as nd;
use serde::{ Deserialize, Serialize };
use crate::{
    error::*,
    interp::Table,
    quad::Integrator,
    special::{ airy_ai, laguerre, ln_gamma },
    units::{ angstrom_to_bohr, atu_to_second, hartree_to_ev },
};

pub type VibResult<T> = Result<T, VibError>;

/// Default lower bound of Franck-Condon integrals, in Ångström.
pub const FC_R_MIN: f64 = 1.5;
/// Default upper bound of Franck-Condon integrals, in Ångström.
pub const FC_R_MAX: f64 = 30.0;
/// Width of the panels Franck-Condon integrals are split into, in bohr.
pub const FC_PANEL: f64 = 0.25;
/// Amount by which the lower integration bound is raised after an overlap
/// fails to evaluate, in bohr.
pub const FC_TIGHTEN_STEP: f64 = 0.01;
/// Maximum number of times the lower integration bound is raised.
pub const FC_TIGHTEN_MAX: usize = 100;
/// Number of consecutive all-negligible pseudo-states that ends the continuum
/// discretization.
pub const STOP_STEPS: usize = 3;
/// Default cap on the number of continuum pseudo-states.
pub const DEF_MAX_STEPS: usize = 10_000;

/// Morse parameter λ = √(2μ De) / α.
pub fn lambda_param(de: f64, alpha: f64, mu: f64) -> f64 {
    (2.0 * mu * de).sqrt() / alpha
}

/// Energy of the `n`-th Morse level above the bottom of the well.
///
/// ```
/// use eldest::vibronic::eigenvalue;
///
/// // harmonic limit: level spacing ≈ α √(2 De / μ) for deep wells
/// let (de, alpha, mu) = (10.0, 0.1, 1000.0);
/// let omega = alpha * (2.0 * de / mu).sqrt();
/// let d = eigenvalue(1, de, alpha, mu) - eigenvalue(0, de, alpha, mu);
/// assert!((d - omega).abs() / omega < 1e-3);
/// ```
pub fn eigenvalue(n: usize, de: f64, alpha: f64, mu: f64) -> f64 {
    let omega = alpha * (2.0 * de / mu).sqrt();
    let x = n as f64 + 0.5;
    omega * x - alpha.powi(2) / (2.0 * mu) * x * x
}

/// A Morse oscillator with well depth `de`, range parameter `alpha`,
/// equilibrium distance `req`, and reduced mass `mu`, all in atomic units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Morse {
    de: f64,
    alpha: f64,
    req: f64,
    mu: f64,
    lambda: f64,
}

impl Morse {
    /// Create a new `Morse`, checking that it supports at least one bound
    /// state.
    pub fn new(de: f64, alpha: f64, req: f64, mu: f64) -> VibResult<Self> {
        let lambda = lambda_param(de, alpha, mu);
        (de > 0.0 && alpha > 0.0 && mu > 0.0 && lambda > 0.5)
            .then_some(())
            .ok_or(VibError::NoBoundStates { de, alpha, mu })?;
        if (lambda - 0.5).fract() == 0.0 {
            warn!(
                "vibronic::Morse::new: level {} lies at the dissociation limit \
                (λ = {lambda}) and is not normalizable; dropping it",
                lambda - 0.5,
            );
        }
        Ok(Self { de, alpha, req, mu, lambda })
    }

    pub fn get_de(&self) -> f64 { self.de }

    pub fn get_alpha(&self) -> f64 { self.alpha }

    pub fn get_req(&self) -> f64 { self.req }

    pub fn get_mu(&self) -> f64 { self.mu }

    pub fn lambda(&self) -> f64 { self.lambda }

    /// Highest bound vibrational quantum number, the largest `n < λ - 1/2`.
    ///
    /// This is `floor(λ - 1/2)` except when `λ - 1/2` is an integer, where the
    /// level at the dissociation limit is left out.
    pub fn n_max(&self) -> usize {
        ((self.lambda - 0.5).ceil() as usize).saturating_sub(1)
    }

    /// Energy of level `n` above the bottom of the well.
    pub fn eigenvalue(&self, n: usize) -> f64 {
        eigenvalue(n, self.de, self.alpha, self.mu)
    }

    /// Energies of all bound levels, in ascending order.
    pub fn levels(&self) -> nd::Array1<f64> {
        (0..=self.n_max()).map(|n| self.eigenvalue(n)).collect()
    }

    pub fn potential(&self, r: f64) -> f64 {
        self.de * (1.0 - (-self.alpha * (r - self.req)).exp()).powi(2)
    }

    /// Normalized wavefunction of level `n` at `r`.
    ///
    /// Evaluated in log space to keep the prefactor and the Laguerre
    /// polynomial from overflowing separately at small `r`. Returns NaN for
    /// `n` beyond the last bound level.
    pub fn wavefunction(&self, n: usize, r: f64) -> f64 {
        let nf = n as f64;
        let a = 2.0 * self.lambda - 2.0 * nf - 1.0;
        if a <= 0.0 { return f64::NAN; }
        let z = 2.0 * self.lambda * (-self.alpha * (r - self.req)).exp();
        let l = laguerre(n, a, z);
        if l == 0.0 { return 0.0; }
        let ln_norm
            = 0.5 * (
                (self.alpha * a).ln()
                + ln_gamma(nf + 1.0)
                - ln_gamma(2.0 * self.lambda - nf)
            );
        let ln_psi
            = ln_norm + (self.lambda - nf - 0.5) * z.ln() - z / 2.0
            + l.abs().ln();
        l.signum() * ln_psi.exp()
    }
}

/// A purely repulsive curve `V(R) = a / R + b` for a particle of reduced mass
/// `mu`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Repulsive {
    a: f64,
    b: f64,
    mu: f64,
}

impl Repulsive {
    pub fn new(a: f64, b: f64, mu: f64) -> VibResult<Self> {
        (a > 0.0).then_some(()).ok_or(VibError::BadCoefficient(a))?;
        (mu > 0.0).then_some(()).ok_or(VibError::BadCoefficient(mu))?;
        Ok(Self { a, b, mu })
    }

    pub fn get_a(&self) -> f64 { self.a }

    pub fn get_b(&self) -> f64 { self.b }

    pub fn get_mu(&self) -> f64 { self.mu }

    pub fn potential(&self, r: f64) -> f64 { self.a / r + self.b }

    /// Energy above the asymptote of the pseudo-state turning at `r_turn`.
    pub fn energy(&self, r_turn: f64) -> f64 { self.a / r_turn }

    /// Energy-normalized pseudo-state turning at `r_turn`, evaluated at `r`.
    pub fn wavefunction(&self, r_turn: f64, r: f64) -> f64 {
        let slope = self.a / r_turn.powi(2);
        let scale = (2.0 * self.mu * slope).cbrt();
        (2.0 * self.mu).cbrt() / slope.powf(1.0 / 6.0)
            * airy_ai(scale * (r_turn - r))
    }
}

/// A single vibrational state whose wavefunction can be sampled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VibState {
    /// Bound Morse level `n`.
    Bound(Morse, usize),
    /// Continuum pseudo-state of a repulsive curve with the given turning
    /// point.
    Continuum(Repulsive, f64),
}

impl VibState {
    pub fn eval(&self, r: f64) -> f64 {
        match self {
            Self::Bound(pot, n) => pot.wavefunction(*n, r),
            Self::Continuum(pot, r_turn) => pot.wavefunction(*r_turn, r),
        }
    }
}

/// Integration range of Franck-Condon overlaps, in bohr.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FcBounds {
    pub r_min: f64,
    pub r_max: f64,
}

impl Default for FcBounds {
    fn default() -> Self {
        Self {
            r_min: angstrom_to_bohr(FC_R_MIN),
            r_max: angstrom_to_bohr(FC_R_MAX),
        }
    }
}

/// Result of a single Franck-Condon integral.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FcOverlap {
    /// Value of the overlap; NaN if not `valid`.
    pub value: f64,
    /// Lower integration bound that was finally used.
    pub r_min: f64,
    pub valid: bool,
}

/// Compute the overlap `⟨a| w(R) |b⟩` over `bounds`.
///
/// If the integral is not finite, the lower bound is raised in steps of
/// [`FC_TIGHTEN_STEP`] and the integral retried; after [`FC_TIGHTEN_MAX`]
/// attempts the overlap is returned flagged as invalid.
pub fn franck_condon<W>(
    a: &VibState,
    b: &VibState,
    bounds: FcBounds,
    weight: W,
    integ: &Integrator,
) -> VibResult<FcOverlap>
where W: Fn(f64) -> f64
{
    let f = |r: f64| a.eval(r) * weight(r) * b.eval(r);
    let mut r_min = bounds.r_min;
    for _ in 0..=FC_TIGHTEN_MAX {
        let value = panels(&f, r_min, bounds.r_max, integ)?;
        if value.is_finite() {
            return Ok(FcOverlap { value, r_min, valid: true });
        }
        r_min += FC_TIGHTEN_STEP;
    }
    warn!(
        "vibronic::franck_condon: overlap {:?} | {:?} is not finite down to R = {}",
        a, b, r_min,
    );
    Ok(FcOverlap { value: f64::NAN, r_min, valid: false })
}

fn panels<F>(f: F, a: f64, b: f64, integ: &Integrator) -> VibResult<f64>
where F: Fn(f64) -> f64
{
    let n = ((b - a) / FC_PANEL).ceil().max(1.0) as usize;
    let h = (b - a) / n as f64;
    (0..n).try_fold(0.0, |acc, k| {
        let lo = a + k as f64 * h;
        integ.real(&f, lo, lo + h).map(|v| acc + v)
    })
    .map_err(VibError::from)
}

/// Dense table of overlaps indexed by (source level, target level).
#[derive(Clone, Debug, PartialEq)]
pub struct FcTable {
    values: nd::Array2<f64>,
    valid: nd::Array2<bool>,
}

impl FcTable {
    fn from_overlaps(rows: &[Vec<FcOverlap>], ncols: usize) -> Self {
        let shape = (rows.len(), ncols);
        let values = nd::Array2::from_shape_fn(shape, |(i, j)| rows[i][j].value);
        let valid = nd::Array2::from_shape_fn(shape, |(i, j)| rows[i][j].valid);
        Self { values, valid }
    }

    /// Create a table from bare values, flagging all non-finite ones.
    pub fn from_values(values: nd::Array2<f64>) -> Self {
        let valid = values.mapv(f64::is_finite);
        Self { values, valid }
    }

    fn from_rows(rows: &[Vec<f64>], nrows: usize, ncols: usize)
        -> VibResult<Self>
    {
        LengthError::check_len(rows.len(), nrows)?;
        rows.iter()
            .try_for_each(|row| LengthError::check_len(row.len(), ncols))?;
        let values
            = nd::Array2::from_shape_fn((nrows, ncols), |(i, j)| rows[i][j]);
        Ok(Self::from_values(values))
    }

    fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn get_values(&self) -> nd::ArrayView2<f64> { self.values.view() }

    pub fn nrows(&self) -> usize { self.values.nrows() }

    pub fn ncols(&self) -> usize { self.values.ncols() }

    pub fn is_valid(&self, i: usize, j: usize) -> bool { self.valid[[i, j]] }

    /// Overlap at `(i, j)`, or zero if it is flagged invalid.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if self.valid[[i, j]] { self.values[[i, j]] } else { 0.0 }
    }

    /// Number of invalid overlaps.
    pub fn n_invalid(&self) -> usize {
        self.valid.iter().filter(|v| !**v).count()
    }
}

/// R-dependence of the resonance-final coupling.
#[derive(Clone, Debug, PartialEq)]
pub enum GammaModel {
    /// R-independent coupling.
    Const,
    /// Coupling falling off as *R*⁻³ (decay width as *R*⁻⁶).
    R6,
    /// Coupling `√(Γ(R) / 2π)` from a tabulated width. The table may be
    /// absent when the overlaps are read from a file instead of computed.
    External(Option<Table>),
}

impl GammaModel {
    pub fn is_const(&self) -> bool { matches!(self, Self::Const) }

    pub fn is_r6(&self) -> bool { matches!(self, Self::R6) }

    pub fn is_external(&self) -> bool { matches!(self, Self::External(_)) }

    /// Value of the R-dependent factor of the coupling at `r`.
    pub fn coupling(&self, r: f64) -> f64 {
        match self {
            Self::Const => 1.0,
            Self::R6 => r.powi(-3),
            Self::External(Some(table))
                => (table.eval(r).max(0.0) / (2.0 * PI)).sqrt(),
            Self::External(None) => f64::NAN,
        }
    }

    /// Electronic coupling that multiplies [`Self::coupling`], given the
    /// R-independent coupling `v_er` and the resonance equilibrium distance.
    pub fn scale(&self, v_er: f64, res_req: f64) -> f64 {
        match self {
            Self::Const => v_er,
            Self::R6 => v_er * res_req.powi(3),
            Self::External(_) => 1.0,
        }
    }
}

/// Where an R-dependent width enters when it is only partially accounted for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partial {
    /// Only in the amplitude prefactors; widths use bare overlaps.
    Prefactor,
    /// Only in the widths; prefactors use bare overlaps.
    Exponent,
}

impl Partial {
    pub fn is_prefactor(&self) -> bool { matches!(self, Self::Prefactor) }

    pub fn is_exponent(&self) -> bool { matches!(self, Self::Exponent) }
}

/// Electronic final-state curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FinalPotential {
    /// Bound final state at electronic energy `e_fin`.
    Morse { pot: Morse, e_fin: f64 },
    /// Repulsive final state discretized with turning-point step `step`,
    /// stopping once all overlaps stay below `threshold`.
    Repulsive {
        pot: Repulsive,
        step: f64,
        threshold: f64,
        max_steps: usize,
    },
}

impl FinalPotential {
    pub fn is_morse(&self) -> bool { matches!(self, Self::Morse { .. }) }

    pub fn is_repulsive(&self) -> bool { matches!(self, Self::Repulsive { .. }) }

    /// Electronic energy the vibrational energies are measured from.
    pub fn e_fin(&self) -> f64 {
        match self {
            Self::Morse { e_fin, .. } => *e_fin,
            Self::Repulsive { pot, .. } => pot.get_b(),
        }
    }
}

/// Everything needed to build a [`VibronicStructure`], in atomic units.
#[derive(Clone, Debug, PartialEq)]
pub struct VibronicParams {
    pub ground: Morse,
    pub resonance: Morse,
    pub final_pot: FinalPotential,
    /// Electronic resonance energy.
    pub e_r: f64,
    /// R-independent resonance-final coupling, `√(Γ / 2π)`.
    pub v_er: f64,
    pub gamma: GammaModel,
    pub partial: Option<Partial>,
    /// Highest photon energy carried by the XUV pulse.
    pub ex_max: f64,
    pub bounds: FcBounds,
}

/// Vibrational levels of the final electronic state.
#[derive(Clone, Debug, PartialEq)]
pub struct FinalStates {
    e_fin: f64,
    levels: nd::Array1<f64>,
    dos: nd::Array1<f64>,
    converged: bool,
}

impl FinalStates {
    fn new(final_pot: &FinalPotential, levels: nd::Array1<f64>, converged: bool)
        -> Self
    {
        let dos = match final_pot {
            FinalPotential::Morse { .. } => nd::Array1::ones(levels.len()),
            FinalPotential::Repulsive { pot, step, .. }
                => levels.mapv(|e| step * e * e / pot.get_a()),
        };
        Self { e_fin: final_pot.e_fin(), levels, dos, converged }
    }

    /// Electronic energy of the final state.
    pub fn get_e_fin(&self) -> f64 { self.e_fin }

    /// Vibrational energies, ascending.
    pub fn get_levels(&self) -> nd::ArrayView1<f64> { self.levels.view() }

    /// Density-of-states weights (all ones for bound levels).
    pub fn get_dos(&self) -> nd::ArrayView1<f64> { self.dos.view() }

    /// `false` if a continuum discretization hit its step cap or an invalid
    /// overlap before settling.
    pub fn is_converged(&self) -> bool { self.converged }

    pub fn len(&self) -> usize { self.levels.len() }

    pub fn is_empty(&self) -> bool { self.levels.is_empty() }

    /// Total energy of level `mu`.
    pub fn energy(&self, mu: usize) -> f64 { self.e_fin + self.levels[mu] }
}

/// Serialized form of the overlap tables, used to skip their computation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FcFile {
    pub gs_res: Vec<Vec<f64>>,
    pub gs_fin: Vec<Vec<f64>>,
    pub res_fin: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res_fin_bare: Option<Vec<Vec<f64>>>,
    /// Final-state vibrational energies.
    pub levels: Vec<f64>,
    #[serde(default = "default_converged")]
    pub converged: bool,
}

fn default_converged() -> bool { true }

/// Precomputed levels, overlaps, indirect-pathway sums, and effective widths.
#[derive(Clone, Debug, PartialEq)]
pub struct VibronicStructure {
    gs_levels: nd::Array1<f64>,
    res_levels: nd::Array1<f64>,
    fin: FinalStates,
    gs_res: FcTable,
    gs_fin: FcTable,
    res_fin: FcTable,
    res_fin_bare: Option<FcTable>,
    n_fin_max: Vec<Option<usize>>,
    e_r: f64,
    v_er: f64,
    v_er_bare: f64,
    partial: Option<Partial>,
    indir_sums: nd::Array1<f64>,
    widths: nd::Array1<f64>,
}

struct Overlaps {
    levels: nd::Array1<f64>,
    gs_fin: FcTable,
    res_fin: FcTable,
    res_fin_bare: Option<FcTable>,
    converged: bool,
}

impl VibronicStructure {
    /// Compute all levels and overlaps.
    pub fn new(params: &VibronicParams, integ: &Integrator)
        -> VibResult<Self>
    {
        if matches!(params.gamma, GammaModel::External(None)) {
            return Err(VibError::NoGammaTable);
        }
        let ground = params.ground;
        let resonance = params.resonance;
        log_levels("ground", &ground);
        log_levels("resonance", &resonance);
        let rows: Vec<Vec<FcOverlap>>
            = (0..=ground.n_max())
            .map(|k| {
                (0..=resonance.n_max())
                    .map(|l| {
                        franck_condon(
                            &VibState::Bound(resonance, l),
                            &VibState::Bound(ground, k),
                            params.bounds,
                            |_| 1.0,
                            integ,
                        )
                    })
                    .collect::<VibResult<Vec<_>>>()
            })
            .collect::<VibResult<_>>()?;
        let gs_res = FcTable::from_overlaps(&rows, resonance.n_max() + 1);
        let overlaps = match params.final_pot {
            FinalPotential::Morse { pot, .. }
                => bound_overlaps(params, &pot, integ)?,
            FinalPotential::Repulsive { pot, step, threshold, max_steps }
                => continuum_overlaps(params, &pot, step, threshold, max_steps, integ)?,
        };
        let fin
            = FinalStates::new(&params.final_pot, overlaps.levels, overlaps.converged);
        Self::assemble(
            params, gs_res, fin, overlaps.gs_fin, overlaps.res_fin, overlaps.res_fin_bare)
    }

    /// Build from a precomputed set of overlap tables, checking their shapes
    /// against the potentials in `params`.
    pub fn from_file(params: &VibronicParams, file: &FcFile)
        -> VibResult<Self>
    {
        let n_gs = params.ground.n_max() + 1;
        let n_res = params.resonance.n_max() + 1;
        let n_fin = file.levels.len();
        if let FinalPotential::Morse { pot, .. } = params.final_pot {
            LengthError::check_len(n_fin, pot.n_max() + 1)?;
        }
        let gs_res = FcTable::from_rows(&file.gs_res, n_gs, n_res)?;
        let gs_fin = FcTable::from_rows(&file.gs_fin, n_gs, n_fin)?;
        let res_fin = FcTable::from_rows(&file.res_fin, n_res, n_fin)?;
        let res_fin_bare
            = file.res_fin_bare.as_ref()
            .map(|rows| FcTable::from_rows(rows, n_res, n_fin))
            .transpose()?;
        let levels: nd::Array1<f64> = file.levels.iter().copied().collect();
        let fin = FinalStates::new(&params.final_pot, levels, file.converged);
        Self::assemble(params, gs_res, fin, gs_fin, res_fin, res_fin_bare)
    }

    /// Serialize the overlap tables.
    pub fn to_file(&self) -> FcFile {
        FcFile {
            gs_res: self.gs_res.to_rows(),
            gs_fin: self.gs_fin.to_rows(),
            res_fin: self.res_fin.to_rows(),
            res_fin_bare: self.res_fin_bare.as_ref().map(FcTable::to_rows),
            levels: self.fin.levels.to_vec(),
            converged: self.fin.converged,
        }
    }

    fn assemble(
        params: &VibronicParams,
        gs_res: FcTable,
        fin: FinalStates,
        gs_fin: FcTable,
        res_fin: FcTable,
        res_fin_bare: Option<FcTable>,
    ) -> VibResult<Self>
    {
        if params.partial.is_some() && res_fin_bare.is_none() {
            return Err(VibError::NoBareTable);
        }
        let res_levels = params.resonance.levels();
        let n_fin_max: Vec<Option<usize>>
            = res_levels.iter()
            .map(|e_l| {
                if params.final_pot.is_morse() {
                    fin.len().checked_sub(1)
                } else {
                    fin.levels.iter()
                        .rposition(|e_mu| fin.e_fin + e_mu <= params.e_r + e_l)
                }
            })
            .collect();
        let mut vib = Self {
            gs_levels: params.ground.levels(),
            res_levels,
            fin,
            gs_res,
            gs_fin,
            res_fin,
            res_fin_bare,
            n_fin_max,
            e_r: params.e_r,
            v_er: params.gamma.scale(params.v_er, params.resonance.get_req()),
            v_er_bare: params.v_er,
            partial: params.partial,
            indir_sums: nd::Array1::zeros(0),
            widths: nd::Array1::zeros(0),
        };
        vib.indir_sums = vib.compute_indir_sums();
        vib.widths = vib.compute_widths();
        vib.log_summary();
        Ok(vib)
    }

    fn channel_range(&self, l: usize) -> std::ops::Range<usize> {
        0..self.n_fin_max[l].map(|m| m + 1).unwrap_or(0)
    }

    fn compute_indir_sums(&self) -> nd::Array1<f64> {
        let table = self.prefactor_table();
        (0..self.n_res())
            .map(|l| {
                self.channel_range(l)
                    .map(|m| table.get(l, m) * self.gs_fin.get(0, m) * self.fin.dos[m])
                    .sum()
            })
            .collect()
    }

    fn compute_widths(&self) -> nd::Array1<f64> {
        let table = self.width_table();
        let v2 = self.width_coupling().powi(2);
        (0..self.n_res())
            .map(|l| {
                self.channel_range(l)
                    .map(|m| v2 * table.get(l, m).powi(2) * self.fin.dos[m])
                    .sum()
            })
            .collect()
    }

    fn log_summary(&self) {
        info!("final state: {} vibrational levels", self.fin.len());
        if !self.fin.converged {
            warn!("vibronic: final-state continuum discretization did not settle");
        }
        let n_bad
            = self.gs_res.n_invalid() + self.gs_fin.n_invalid()
            + self.res_fin.n_invalid();
        if n_bad > 0 {
            warn!("vibronic: {} Franck-Condon overlaps are invalid and are dropped", n_bad);
        }
        info!("effective decay widths:");
        info!("  l  W_l [eV]          tau_l [s]");
        for (l, w) in self.widths.iter().enumerate() {
            info!(
                "{:3}  {:14.10e}  {:14.10e}",
                l, hartree_to_ev(*w), atu_to_second(1.0 / (2.0 * PI * w)),
            );
        }
    }

    /// Ground-state vibrational energies.
    pub fn get_gs_levels(&self) -> nd::ArrayView1<f64> { self.gs_levels.view() }

    /// Resonance-state vibrational energies.
    pub fn get_res_levels(&self) -> nd::ArrayView1<f64> { self.res_levels.view() }

    pub fn get_final(&self) -> &FinalStates { &self.fin }

    /// Overlaps ⟨λ|κ⟩, indexed by (κ, λ).
    pub fn get_gs_res(&self) -> &FcTable { &self.gs_res }

    /// Overlaps ⟨μ|κ⟩, indexed by (κ, μ).
    pub fn get_gs_fin(&self) -> &FcTable { &self.gs_fin }

    /// Overlaps ⟨μ|V(R)|λ⟩, indexed by (λ, μ).
    pub fn get_res_fin(&self) -> &FcTable { &self.res_fin }

    /// Overlaps ⟨μ|λ⟩ without the coupling function, if kept.
    pub fn get_res_fin_bare(&self) -> Option<&FcTable> { self.res_fin_bare.as_ref() }

    /// Highest final level reachable from each resonance level, or `None` if
    /// no final level lies below it.
    pub fn get_n_fin_max(&self) -> &[Option<usize>] { &self.n_fin_max }

    pub fn get_e_r(&self) -> f64 { self.e_r }

    pub fn get_partial(&self) -> Option<Partial> { self.partial }

    pub fn n_gs(&self) -> usize { self.gs_levels.len() }

    pub fn n_res(&self) -> usize { self.res_levels.len() }

    /// Resonance-final table entering the amplitude prefactors.
    pub fn prefactor_table(&self) -> &FcTable {
        match (self.partial, &self.res_fin_bare) {
            (Some(Partial::Exponent), Some(bare)) => bare,
            _ => &self.res_fin,
        }
    }

    /// Electronic coupling entering the amplitude prefactors.
    pub fn prefactor_coupling(&self) -> f64 {
        match self.partial {
            Some(Partial::Exponent) => self.v_er_bare,
            _ => self.v_er,
        }
    }

    /// Resonance-final table entering the effective widths.
    pub fn width_table(&self) -> &FcTable {
        match (self.partial, &self.res_fin_bare) {
            (Some(Partial::Prefactor), Some(bare)) => bare,
            _ => &self.res_fin,
        }
    }

    /// Electronic coupling entering the effective widths.
    pub fn width_coupling(&self) -> f64 {
        match self.partial {
            Some(Partial::Prefactor) => self.v_er_bare,
            _ => self.v_er,
        }
    }

    /// Sums `Σ_μ ⟨λ|μ⟩⟨μ|κ=0⟩ w_μ` over reachable final levels.
    pub fn get_indir_sums(&self) -> nd::ArrayView1<f64> { self.indir_sums.view() }

    /// Effective decay widths W_λ.
    pub fn get_widths(&self) -> nd::ArrayView1<f64> { self.widths.view() }

    /// Lifetimes 1 / (2π W_λ).
    pub fn lifetimes(&self) -> nd::Array1<f64> {
        self.widths.mapv(|w| 1.0 / (2.0 * PI * w))
    }
}

fn log_levels(label: &str, pot: &Morse) {
    info!(
        "{} state: λ = {:.5}, n_max = {}",
        label, pot.lambda(), pot.n_max(),
    );
    for (n, e) in pot.levels().iter().enumerate() {
        info!("  {:3}  {:14.10e} eV", n, hartree_to_ev(*e));
    }
}

fn res_fin_overlaps(
    params: &VibronicParams,
    fin: &VibState,
    integ: &Integrator,
) -> VibResult<(Vec<FcOverlap>, Option<Vec<FcOverlap>>)>
{
    let resonance = params.resonance;
    let weighted: Vec<FcOverlap>
        = (0..=resonance.n_max())
        .map(|l| {
            franck_condon(
                &VibState::Bound(resonance, l),
                fin,
                params.bounds,
                |r| params.gamma.coupling(r),
                integ,
            )
        })
        .collect::<VibResult<_>>()?;
    let bare: Option<Vec<FcOverlap>>
        = params.partial
        .map(|_| {
            (0..=resonance.n_max())
                .map(|l| {
                    franck_condon(
                        &VibState::Bound(resonance, l),
                        fin,
                        params.bounds,
                        |_| 1.0,
                        integ,
                    )
                })
                .collect::<VibResult<Vec<_>>>()
        })
        .transpose()?;
    Ok((weighted, bare))
}

fn gs_fin_overlaps(params: &VibronicParams, fin: &VibState, integ: &Integrator)
    -> VibResult<Vec<FcOverlap>>
{
    let ground = params.ground;
    (0..=ground.n_max())
        .map(|k| {
            franck_condon(
                &VibState::Bound(ground, k),
                fin,
                params.bounds,
                |_| 1.0,
                integ,
            )
        })
        .collect()
}

// column-major collections -> (source, target) tables
fn transpose(cols: &[Vec<FcOverlap>], nrows: usize) -> Vec<Vec<FcOverlap>> {
    (0..nrows)
        .map(|i| cols.iter().map(|col| col[i]).collect())
        .collect()
}

fn bound_overlaps(params: &VibronicParams, pot: &Morse, integ: &Integrator)
    -> VibResult<Overlaps>
{
    log_levels("final", pot);
    let mut gs_cols: Vec<Vec<FcOverlap>> = Vec::new();
    let mut res_cols: Vec<Vec<FcOverlap>> = Vec::new();
    let mut bare_cols: Vec<Vec<FcOverlap>> = Vec::new();
    for m in 0..=pot.n_max() {
        let fin = VibState::Bound(*pot, m);
        gs_cols.push(gs_fin_overlaps(params, &fin, integ)?);
        let (weighted, bare) = res_fin_overlaps(params, &fin, integ)?;
        res_cols.push(weighted);
        if let Some(bare) = bare { bare_cols.push(bare); }
    }
    Ok(collect_overlaps(params, pot.levels(), gs_cols, res_cols, bare_cols, true))
}

fn collect_overlaps(
    params: &VibronicParams,
    levels: nd::Array1<f64>,
    gs_cols: Vec<Vec<FcOverlap>>,
    res_cols: Vec<Vec<FcOverlap>>,
    bare_cols: Vec<Vec<FcOverlap>>,
    converged: bool,
) -> Overlaps
{
    let n_gs = params.ground.n_max() + 1;
    let n_res = params.resonance.n_max() + 1;
    let n_fin = levels.len();
    let gs_fin = FcTable::from_overlaps(&transpose(&gs_cols, n_gs), n_fin);
    let res_fin = FcTable::from_overlaps(&transpose(&res_cols, n_res), n_fin);
    let res_fin_bare
        = params.partial
        .map(|_| FcTable::from_overlaps(&transpose(&bare_cols, n_res), n_fin));
    Overlaps { levels, gs_fin, res_fin, res_fin_bare, converged }
}

fn continuum_overlaps(
    params: &VibronicParams,
    pot: &Repulsive,
    step: f64,
    threshold: f64,
    max_steps: usize,
    integ: &Integrator,
) -> VibResult<Overlaps>
{
    (step > 0.0).then_some(()).ok_or(VibError::BadStep(step))?;
    let b = pot.get_b();
    (params.ex_max > b).then_some(())
        .ok_or(VibError::Unreachable { b, ex_max: params.ex_max })?;
    let r_start = pot.get_a() / (params.ex_max - b);
    let req_max = params.ground.get_req().max(params.resonance.get_req());
    info!(
        "final state: repulsive, R_start = {:.5} bohr, ΔR = {:.5} bohr, \
        first ΔE = {:.5e} eV",
        r_start, step,
        hartree_to_ev(pot.energy(r_start) - pot.energy(r_start + step)),
    );

    // pseudo-states are generated from high to low energy
    let mut energies: Vec<f64> = Vec::new();
    let mut gs_cols: Vec<Vec<FcOverlap>> = Vec::new();
    let mut res_cols: Vec<Vec<FcOverlap>> = Vec::new();
    let mut bare_cols: Vec<Vec<FcOverlap>> = Vec::new();
    // consecutive all-negligible steps; None until some overlap is significant
    let mut flag: Option<usize> = None;
    let mut r_turn = r_start;
    let converged = loop {
        if flag.is_some_and(|n| n >= STOP_STEPS) { break true; }
        if energies.len() >= max_steps {
            warn!(
                "vibronic::continuum_overlaps: no convergence after {} pseudo-states",
                max_steps,
            );
            break false;
        }
        let fin = VibState::Continuum(*pot, r_turn);
        let gs = gs_fin_overlaps(params, &fin, integ)?;
        let (res, bare) = res_fin_overlaps(params, &fin, integ)?;
        let all_valid = gs.iter().chain(res.iter()).all(|fc| fc.valid);
        if r_turn > req_max {
            let negligible
                = gs.iter().chain(res.iter())
                .all(|fc| fc.value.abs() < threshold);
            if negligible {
                if let Some(n) = flag.as_mut() { *n += 1; }
            } else {
                flag = Some(0);
            }
        }
        debug!(
            "R = {:.5} bohr, E_mu = {:.5e} eV, flag = {:?}",
            r_turn, hartree_to_ev(pot.energy(r_turn)), flag,
        );
        energies.push(pot.energy(r_turn));
        gs_cols.push(gs);
        res_cols.push(res);
        if let Some(bare) = bare { bare_cols.push(bare); }
        if !all_valid {
            warn!(
                "vibronic::continuum_overlaps: invalid overlap at R = {}; \
                stopping the discretization",
                r_turn,
            );
            break false;
        }
        r_turn += step;
    };

    energies.reverse();
    gs_cols.reverse();
    res_cols.reverse();
    bare_cols.reverse();
    let levels: nd::Array1<f64> = energies.into_iter().collect();
    Ok(collect_overlaps(params, levels, gs_cols, res_cols, bare_cols, converged))
}

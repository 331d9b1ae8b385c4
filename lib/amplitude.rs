//! Transition amplitudes of the direct and resonance-mediated ionization
//! pathways.
//!
//! For a photoelectron of kinetic energy *E* observed at time *t* with the
//! residual system in a final level of energy *E*_f, let ε = *E* + *E*_f. The
//! amplitude of one final channel is
//! ```text
//! J = d ∫ dt₁ F(t₁) exp(iε(t₁ - t)) D(t₁, t)
//!
//!   + Σ_p w_p ∫ dt₁ F(t₁) ∫ dt₂ exp(-iE_p(t₂ - t₁) - iε(t - t₂)) D(t₂, t)
//!                          t₁
//! ```
//! where *F* is the XUV field, *D* the IR [dressing factor][Dressing], and
//! each pole *p* has complex energy *E*_p = *E*_r - iπ*W* and weight
//! *w*_p collecting the resonant and indirect (interference) prefactors.
//! The outer integral runs from the start of the XUV pulse to the bound the
//! current [`Formula`] prescribes; the inner one is split at the edges of the
//! IR pulse, and each piece is evaluated per the formula's
//! [`SegmentRule`]s.
//!
//! Single-resonance, vibronic, and coupled-resonance runs all reduce to a list
//! of [`Channel`]s, and the measured intensity is `Σ_μ w_μ |J_μ|²` over
//! channels with density-of-states weights *w*_μ.

use std::{ cell::RefCell, f64::consts::PI };
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    dressing::{ Dressing, FourierCache, FourierParams },
    error::EldestError,
    pulse::{ IrPulse, XuvPulse },
    quad::{ Integrator, Method, QuadResult, integrate_complex },
    regime::{ Formula, PhaseRule, Scan, SegmentRule, TemporalRegime, Timing, formula },
    vibronic::VibronicStructure,
};

pub type AmpResult<T> = Result<T, EldestError>;

// |κ| below which the exponential antiderivative degenerates to a linear one
const ZERO_RATE: f64 = 1e-12;

/// A decaying resonance pole with its amplitude weight.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pole {
    /// Complex energy *E* - iπ*W*.
    pub energy: C64,
    pub weight: C64,
}

impl Pole {
    /// Decay width Γ = -2 Im(*E*).
    pub fn width(&self) -> f64 { -2.0 * self.energy.im }
}

/// One final state of the residual system.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Total final-state energy.
    pub e_fin: f64,
    /// Weight of the direct pathway.
    pub direct_weight: C64,
    /// Resonances that decay into this channel.
    pub poles: Vec<Pole>,
    /// Density-of-states weight of the channel's intensity.
    pub dos: f64,
}

/// Dipole couplings of a resonance and its coupling to the continuum.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Couplings {
    /// Ground → resonance dipole.
    pub rdg: f64,
    /// Fano asymmetry parameter.
    pub q: f64,
    /// Resonance-continuum coupling √(Γ / 2π).
    pub v: f64,
}

impl Couplings {
    pub fn new(rdg: f64, q: f64, gamma: f64) -> Self {
        Self { rdg, q, v: (gamma / (2.0 * PI)).sqrt() }
    }

    /// Ground → continuum dipole, `rdg / (q π V)`.
    pub fn cdg(&self) -> f64 { self.rdg / (self.q * PI * self.v) }
}

impl Channel {
    /// The single channel of an isolated resonance at `e_r` decaying into a
    /// final state at `e_fin`.
    pub fn single(e_r: f64, e_fin: f64, couplings: &Couplings) -> Self {
        let Couplings { rdg, v, .. } = *couplings;
        let cdg = couplings.cdg();
        let pole = Pole {
            energy: C64::new(e_r, -PI * v * v),
            weight: C64::new(v * rdg, -PI * v * v * cdg),
        };
        Self {
            e_fin,
            direct_weight: C64::i() * cdg,
            poles: vec![pole],
            dos: 1.0,
        }
    }

    /// One channel per final vibrational level, each fed by every resonance
    /// level lying above it.
    pub fn vibronic(vib: &VibronicStructure, couplings: &Couplings)
        -> Vec<Self>
    {
        let n_res = vib.n_res() as f64;
        let v = vib.prefactor_coupling();
        let cdg = couplings.cdg();
        let table = vib.prefactor_table();
        let fin = vib.get_final();
        let res_levels = vib.get_res_levels();
        let widths = vib.get_widths();
        let indir = vib.get_indir_sums();
        let n_fin_max = vib.get_n_fin_max();
        let level_weights: Vec<C64>
            = (0..vib.n_res())
            .map(|l| {
                C64::new(
                    v * couplings.rdg * vib.get_gs_res().get(0, l),
                    -PI * v * v * cdg * indir[l],
                ) / n_res
            })
            .collect();
        (0..fin.len())
            .map(|m| {
                let poles: Vec<Pole>
                    = (0..vib.n_res())
                    .filter(|l| n_fin_max[*l].is_some_and(|mmax| m <= mmax))
                    .map(|l| Pole {
                        energy: C64::new(
                            vib.get_e_r() + res_levels[l], -PI * widths[l]),
                        weight: level_weights[l] * table.get(l, m),
                    })
                    .collect();
                Self {
                    e_fin: fin.energy(m),
                    direct_weight: C64::i() * cdg * vib.get_gs_fin().get(0, m),
                    poles,
                    dos: fin.get_dos()[m],
                }
            })
            .collect()
    }
}

/// Resonance levels as poles weighted for the projection of the wavepacket
/// onto each of them.
pub fn wavepacket_levels(vib: &VibronicStructure, couplings: &Couplings)
    -> Vec<Pole>
{
    let n_res = vib.n_res() as f64;
    let v = vib.prefactor_coupling();
    let cdg = couplings.cdg();
    let indir = vib.get_indir_sums();
    (0..vib.n_res())
        .map(|l| Pole {
            energy: C64::new(
                vib.get_e_r() + vib.get_res_levels()[l],
                -PI * vib.get_widths()[l],
            ),
            weight: C64::new(
                PI * v * cdg * indir[l],
                couplings.rdg * vib.get_gs_res().get(0, l),
            ) / n_res,
        })
        .collect()
}

/// Wavepacket weight of an isolated resonance.
pub fn wavepacket_single(e_r: f64, couplings: &Couplings) -> Pole {
    let Couplings { rdg, v, .. } = *couplings;
    Pole {
        energy: C64::new(e_r, -PI * v * v),
        weight: C64::new(PI * v * couplings.cdg(), rdg),
    }
}

/// Per-kinetic-energy state shared by every channel and observation time.
#[derive(Clone, Debug)]
pub struct EnergySample {
    e_kin: f64,
    dressing: Dressing,
    cache: Option<FourierCache>,
    phase_end: f64,
}

impl EnergySample {
    pub fn get_e_kin(&self) -> f64 { self.e_kin }

    pub fn get_dressing(&self) -> &Dressing { &self.dressing }

    pub fn get_cache(&self) -> Option<&FourierCache> { self.cache.as_ref() }

    /// Move the IR pulse to a new delay, reusing the Fourier cache.
    pub fn with_delay(&self, delay: f64) -> AmpResult<Self> {
        let dressing = self.dressing.with_delay(delay);
        let phase_end = dressing.phase(dressing.get_ir().end())?;
        Ok(Self { dressing, phase_end, ..self.clone() })
    }

    fn phase(&self, t: f64) -> AmpResult<f64> { Ok(self.dressing.phase(t)?) }
}

// Integrate a fallible integrand with `integrate`; the first error raised
// inside the integrand is returned once the integration is over.
fn try_integrate<F, I>(integrate: I, f: F) -> AmpResult<C64>
where
    F: Fn(f64) -> AmpResult<C64>,
    I: FnOnce(&dyn Fn(f64) -> C64) -> QuadResult<C64>,
{
    let fault: RefCell<Option<EldestError>> = RefCell::new(None);
    let g = |x: f64| {
        f(x).unwrap_or_else(|err| {
            fault.borrow_mut().get_or_insert(err);
            C64::zero()
        })
    };
    let value = integrate(&g)?;
    match fault.into_inner() {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

// exp(-i E_p (x - t₁) - i ε (t - x)), with derivative κ times itself
#[derive(Copy, Clone, Debug)]
struct Kernel {
    eps: f64,
    pole: C64,
    t1: f64,
    t: f64,
}

impl Kernel {
    fn eval(&self, x: f64) -> C64 {
        (-C64::i() * (self.pole * (x - self.t1) + self.eps * (self.t - x))).exp()
    }

    fn kappa(&self) -> C64 { C64::i() * (self.eps - self.pole) }

    fn antiderivative(&self, a: f64, b: f64) -> C64 {
        let kappa = self.kappa();
        if kappa.norm() < ZERO_RATE {
            self.eval(a) * (b - a)
        } else {
            (self.eval(b) - self.eval(a)) / kappa
        }
    }
}

/// Evaluates amplitudes for one pair of pulses.
#[derive(Clone, Debug)]
pub struct AmplitudeEngine {
    xuv: XuvPulse,
    ir: IrPulse,
    timing: Timing,
    integ: Integrator,
    fourier: FourierParams,
    scan: Scan,
}

impl AmplitudeEngine {
    /// Create a new `AmplitudeEngine` for a time scan, checking the pulse
    /// order.
    pub fn new(
        xuv: XuvPulse,
        ir: IrPulse,
        integ: Integrator,
        fourier: FourierParams,
    ) -> AmpResult<Self>
    {
        let timing = Timing::new(&xuv, &ir)?;
        integ.params.check()?;
        Ok(Self { xuv, ir, timing, integ, fourier, scan: Scan::Time })
    }

    /// Create a new `AmplitudeEngine` for a delay scan, where the pulses may
    /// overlap in any order.
    ///
    /// Amplitudes are only meaningful for observation times after both pulses
    /// have ended. Energy samples carry a [`FourierCache`] of the dressing
    /// when the inner integral is closed-form.
    pub fn overlapping(
        xuv: XuvPulse,
        ir: IrPulse,
        integ: Integrator,
        fourier: FourierParams,
    ) -> AmpResult<Self>
    {
        let timing = Timing::overlapping(&xuv, &ir);
        integ.params.check()?;
        Ok(Self { xuv, ir, timing, integ, fourier, scan: Scan::Delay })
    }

    /// Return a copy of `self` with the IR pulse moved to a new delay.
    pub fn with_delay(&self, delay: f64) -> AmpResult<Self> {
        let ir = self.ir.with_delay(delay);
        let timing
            = match self.scan {
                Scan::Time => Timing::new(&self.xuv, &ir)?,
                Scan::Delay => Timing::overlapping(&self.xuv, &ir),
            };
        Ok(Self { ir, timing, ..self.clone() })
    }

    pub fn get_xuv(&self) -> &XuvPulse { &self.xuv }

    pub fn get_ir(&self) -> &IrPulse { &self.ir }

    pub fn get_timing(&self) -> &Timing { &self.timing }

    pub fn get_integrator(&self) -> &Integrator { &self.integ }

    pub fn get_scan(&self) -> Scan { self.scan }

    /// Look up the amplitude formula of a regime for this pulse pair,
    /// integrator, and scan.
    pub fn formula(&self, regime: TemporalRegime) -> Formula {
        formula(regime, self.ir.get_envelope(), self.integ.inner, self.scan)
    }

    fn uses_cache(&self) -> bool {
        !self.ir.is_off()
            && self.integ.inner.is_analytic()
            && self.scan == Scan::Delay
    }

    /// Prepare the dressing of kinetic energy `e_kin`.
    pub fn sample(&self, e_kin: f64) -> AmpResult<EnergySample> {
        let dressing
            = Dressing::new(&self.ir, e_kin, self.integ.inner, &self.integ.params);
        let cache
            = if self.uses_cache() {
                Some(FourierCache::new(
                    &dressing, self.fourier.step, self.fourier.threshold)?)
            } else {
                None
            };
        let phase_end = dressing.phase(self.ir.end())?;
        Ok(EnergySample { e_kin, dressing, cache, phase_end })
    }

    fn observed_phase(&self, sample: &EnergySample, t: f64, formula: &Formula)
        -> AmpResult<f64>
    {
        match formula.phase {
            PhaseRule::Unity => Ok(0.0),
            PhaseRule::Running => sample.phase(t),
            PhaseRule::Frozen => Ok(sample.phase_end),
        }
    }

    fn is_dressed(&self, formula: &Formula) -> bool {
        formula.dressed.is_some() && !self.ir.is_off()
    }

    /// Amplitude of one channel at observation time `t`.
    pub fn amplitude(
        &self,
        sample: &EnergySample,
        channel: &Channel,
        t: f64,
        formula: &Formula,
    ) -> AmpResult<C64>
    {
        let eps = sample.e_kin + channel.e_fin;
        let mut j = channel.direct_weight * self.direct(sample, eps, t, formula)?;
        for pole in channel.poles.iter() {
            j += pole.weight * self.resonant(sample, eps, pole.energy, t, formula)?;
        }
        Ok(j)
    }

    /// Total intensity `Σ_μ w_μ |J_μ|²` over a set of channels.
    pub fn intensity(
        &self,
        sample: &EnergySample,
        channels: &[Channel],
        t: f64,
        formula: &Formula,
    ) -> AmpResult<f64>
    {
        channels.iter()
            .try_fold(0.0, |acc, channel| {
                self.amplitude(sample, channel, t, formula)
                    .map(|j| acc + channel.dos * j.norm_sqr())
            })
    }

    /// Direct-pathway integral for total energy `eps`.
    pub fn direct(
        &self,
        sample: &EnergySample,
        eps: f64,
        t: f64,
        formula: &Formula,
    ) -> AmpResult<C64>
    {
        let lower = self.timing.xuv_start;
        let upper = match formula.xuv_upper(t, &self.timing) {
            Some(upper) if upper > lower => upper,
            _ => return Ok(C64::zero()),
        };
        let phase_t = self.observed_phase(sample, t, formula)?;
        let dressed = self.is_dressed(formula);
        let integrand = |t1: f64| -> AmpResult<C64> {
            let phase_1 = if dressed { sample.phase(t1)? } else { 0.0 };
            Ok(self.xuv.field(t1)
                * C64::from_polar(1.0, eps * (t1 - t) + phase_1 - phase_t))
        };
        try_integrate(|g| self.integ.outer(g, lower, upper), integrand)
    }

    /// Resonant-pathway integral for total energy `eps` through a pole at
    /// complex energy `pole`.
    pub fn resonant(
        &self,
        sample: &EnergySample,
        eps: f64,
        pole: C64,
        t: f64,
        formula: &Formula,
    ) -> AmpResult<C64>
    {
        let lower = self.timing.xuv_start;
        let upper = match formula.xuv_upper(t, &self.timing) {
            Some(upper) if upper > lower => upper,
            _ => return Ok(C64::zero()),
        };
        let phase_t = self.observed_phase(sample, t, formula)?;
        let integrand = |t1: f64| -> AmpResult<C64> {
            let kernel = Kernel { eps, pole, t1, t };
            Ok(self.xuv.field(t1) * self.inner(sample, &kernel, formula)?)
        };
        let outer = try_integrate(|g| self.integ.outer(g, lower, upper), integrand)?;
        Ok(outer * C64::from_polar(1.0, -phase_t))
    }

    // ∫_{t₁}^{t} K(x) exp(iΦ(c(x))) dx, split at the edges of the IR pulse
    fn inner(&self, sample: &EnergySample, kernel: &Kernel, formula: &Formula)
        -> AmpResult<C64>
    {
        let Timing { ir_start, ir_end, .. } = self.timing;
        let (t1, t) = (kernel.t1, kernel.t);
        let mut total = C64::zero();

        let (a, b) = (t1, t.min(ir_start));
        if b > a {
            total += self.undressed(formula.undressed, kernel, a, b)?;
        }

        let (a, b) = (t1.max(ir_start), t.min(ir_end));
        if b > a {
            total += match formula.dressed {
                Some(rule) if !self.ir.is_off()
                    => self.dressed(rule, sample, kernel, a, b)?,
                _ => self.undressed(formula.undressed, kernel, a, b)?,
            };
        }

        let (a, b) = (t1.max(ir_end), t);
        if b > a {
            total += self.undressed(formula.undressed, kernel, a, b)?
                * C64::from_polar(1.0, sample.phase_end);
        }
        Ok(total)
    }

    fn undressed(&self, rule: SegmentRule, kernel: &Kernel, a: f64, b: f64)
        -> AmpResult<C64>
    {
        match rule {
            SegmentRule::Exponential | SegmentRule::FourierSeries
                => Ok(kernel.antiderivative(a, b)),
            SegmentRule::Numeric(method)
                => self.numeric(method, |x| Ok(kernel.eval(x)), a, b),
        }
    }

    fn dressed(
        &self,
        rule: SegmentRule,
        sample: &EnergySample,
        kernel: &Kernel,
        a: f64,
        b: f64,
    ) -> AmpResult<C64>
    {
        let ir_start = self.timing.ir_start;
        let streaked = |x: f64| -> AmpResult<C64> {
            Ok(kernel.eval(x) * C64::from_polar(1.0, sample.phase(x)?))
        };
        match (rule, sample.cache.as_ref()) {
            (SegmentRule::FourierSeries, Some(cache))
                => Ok(cache.integrate_exp(
                    |x| kernel.eval(x), kernel.kappa(), ir_start, a, b)),
            (SegmentRule::Numeric(method), _)
                => self.numeric(method, streaked, a, b),
            _ => self.numeric(Method::Quadrature, streaked, a, b),
        }
    }

    fn numeric<F>(&self, method: Method, f: F, a: f64, b: f64) -> AmpResult<C64>
    where F: Fn(f64) -> AmpResult<C64>
    {
        try_integrate(
            |g| integrate_complex(method, g, a, b, &self.integ.params)
                .map(|(val, _)| val),
            f,
        )
    }

    /// Amplitude of the resonance-state wavepacket on one level at time `t`,
    /// `w ∫ dt₁ F(t₁) exp(-iE(t - t₁))` over the part of the XUV pulse before
    /// `t`.
    pub fn wavepacket(&self, level: &Pole, t: f64) -> AmpResult<C64> {
        let lower = self.timing.xuv_start;
        let upper = t.min(self.timing.xuv_end);
        if upper <= lower { return Ok(C64::zero()); }
        let integrand = |t1: f64| {
            self.xuv.field(t1) * (-C64::i() * level.energy * (t - t1)).exp()
        };
        Ok(level.weight * self.integ.outer(integrand, lower, upper)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::QuadError,
        pulse::{ Envelope, XuvField },
        quad::QuadParams,
        units::{ ev_to_hartree, second_to_atu },
    };

    fn xuv() -> XuvPulse {
        XuvPulse::new(
            ev_to_hartree(44.0), 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted,
            None)
    }

    fn engine(ir: IrPulse, inner: Method) -> AmplitudeEngine {
        let params = QuadParams { limit: 200, ..QuadParams::default() };
        let integ = Integrator::new(inner, Method::Quadrature, params).unwrap();
        AmplitudeEngine::new(xuv(), ir, integ, FourierParams::default()).unwrap()
    }

    fn resonance() -> (f64, Couplings) {
        let gamma = 1.0 / second_to_atu(2e-15);
        (ev_to_hartree(44.0), Couplings::new(1.0, 5.0, gamma))
    }

    #[test]
    fn single_channel_weights() {
        let (e_r, c) = resonance();
        let ch = Channel::single(e_r, 0.0, &c);
        let gamma = 2.0 * PI * c.v * c.v;
        assert!((ch.poles[0].width() - gamma).abs() < 1e-15);
        assert!((ch.direct_weight.im - c.cdg()).abs() < 1e-15);
        assert!((c.cdg() * c.q * PI * c.v - c.rdg).abs() < 1e-12);
    }

    #[test]
    fn nothing_before_the_xuv_pulse() {
        let ir = IrPulse::new(0.057, 3.0, 0.0, Envelope::SinSq, 0.0, 400.0, None);
        let eng = engine(ir, Method::Analytic);
        let (e_r, c) = resonance();
        let ch = Channel::single(e_r, 0.0, &c);
        let t = eng.get_timing().xuv_start - 10.0;
        let f = eng.formula(eng.get_timing().classify(t));
        let sample = eng.sample(ev_to_hartree(10.0)).unwrap();
        assert_eq!(eng.amplitude(&sample, &ch, t, &f).unwrap(), C64::zero());
    }

    #[test]
    fn closed_form_inner_matches_quadrature() {
        let ir = IrPulse::new(0.057, 3.0, 0.0, Envelope::SinSq, 0.0, 400.0, None);
        let analytic = engine(ir, Method::Analytic);
        let numeric = engine(ir, Method::Quadrature);
        let (e_r, c) = resonance();
        let ch = Channel::single(e_r, ev_to_hartree(20.0), &c);
        let e_kin = ev_to_hartree(23.0);
        let t = analytic.get_timing().xuv_end + 60.0;
        let f_a = analytic.formula(analytic.get_timing().classify(t));
        let f_n = numeric.formula(numeric.get_timing().classify(t));
        let sa = analytic.sample(e_kin).unwrap();
        let sn = numeric.sample(e_kin).unwrap();
        let ja = analytic.amplitude(&sa, &ch, t, &f_a).unwrap();
        let jn = numeric.amplitude(&sn, &ch, t, &f_n).unwrap();
        assert!((ja - jn).norm() < 1e-6 * ja.norm().max(1e-12));
    }

    // IR pulse starting 50 a.u. after the XUV pulse peak
    fn streaking(envelope: Envelope, n_cycles: f64, intensity: f64) -> IrPulse {
        let ir = IrPulse::new(0.057, n_cycles, intensity, envelope, 0.3, 0.0, None);
        ir.with_delay(ir.half_width() + 50.0)
    }

    fn relative(a: C64, b: C64) -> f64 { (a - b).norm() / b.norm() }

    #[test]
    fn streaked_time_scan_matches_quadrature() {
        let (e_r, c) = resonance();
        let ch = Channel::single(e_r, ev_to_hartree(20.0), &c);
        for (envelope, n_cycles) in [(Envelope::SinSq, 3.0), (Envelope::Gauss, 2.0)] {
            let ir = streaking(envelope, n_cycles, 1e-4);
            let analytic = engine(ir, Method::Analytic);
            let numeric = engine(ir, Method::Quadrature);
            let timing = *analytic.get_timing();
            for t in [ir.get_delay(), ir.end() + 100.0] {
                let regime = timing.classify(t);
                assert!(matches!(regime, TemporalRegime::DuringIr | TemporalRegime::AfterIr));
                let f_a = analytic.formula(regime);
                let f_n = numeric.formula(regime);
                assert_eq!(f_a.dressed, Some(SegmentRule::Numeric(Method::Quadrature)));
                for e_kin in [21.0, 23.0] {
                    let sa = analytic.sample(ev_to_hartree(e_kin)).unwrap();
                    let sn = numeric.sample(ev_to_hartree(e_kin)).unwrap();
                    assert!(sa.get_cache().is_none());
                    let ja = analytic.amplitude(&sa, &ch, t, &f_a).unwrap();
                    let jn = numeric.amplitude(&sn, &ch, t, &f_n).unwrap();
                    let rel = relative(ja, jn);
                    assert!(
                        rel < 1e-4,
                        "{envelope:?} {regime:?} E = {e_kin} eV: {ja} vs {jn} ({rel:e})",
                    );
                }
            }
        }
    }

    #[test]
    fn delay_scan_cache_matches_quadrature() {
        let (e_r, c) = resonance();
        let ch = Channel::single(e_r, ev_to_hartree(20.0), &c);
        let ir = streaking(Envelope::SinSq, 3.0, 1e-4);
        let params = QuadParams { limit: 200, ..QuadParams::default() };
        let fine = FourierParams { step: 0.25, threshold: 0.0 };
        let cached
            = AmplitudeEngine::overlapping(
                xuv(), ir, Integrator::new(Method::Analytic, Method::Quadrature, params).unwrap(),
                fine,
            ).unwrap();
        let numeric
            = AmplitudeEngine::overlapping(
                xuv(), ir, Integrator::new(Method::Quadrature, Method::Quadrature, params).unwrap(),
                fine,
            ).unwrap();
        let t = ir.end() + 100.0;
        let f_c = cached.formula(TemporalRegime::AfterIr);
        let f_n = numeric.formula(TemporalRegime::AfterIr);
        assert_eq!(f_c.dressed, Some(SegmentRule::FourierSeries));
        for e_kin in [21.0, 23.0] {
            let sc = cached.sample(ev_to_hartree(e_kin)).unwrap();
            let sn = numeric.sample(ev_to_hartree(e_kin)).unwrap();
            assert!(sc.get_cache().is_some());
            let jc = cached.amplitude(&sc, &ch, t, &f_c).unwrap();
            let jn = numeric.amplitude(&sn, &ch, t, &f_n).unwrap();
            // sampling every 0.25 a.u. with no components dropped
            let rel = relative(jc, jn);
            assert!(rel < 5e-3, "E = {e_kin} eV: {jc} vs {jn} ({rel:e})");
        }
    }

    fn unit_interval(g: &dyn Fn(f64) -> C64) -> QuadResult<C64> {
        integrate_complex(Method::Quadrature, g, 0.0, 1.0, &QuadParams::default())
            .map(|(val, _)| val)
    }

    #[test]
    fn integrand_errors_are_returned() {
        let val = try_integrate(unit_interval, |x| Ok(C64::new(x, 0.0))).unwrap();
        assert!((val - C64::new(0.5, 0.0)).norm() < 1e-12);
        let failed
            = try_integrate(unit_interval, |x| {
                if x > 0.5 {
                    Err(QuadError::BadLimit(0).into())
                } else {
                    Ok(C64::new(1.0, 0.0))
                }
            });
        assert!(matches!(failed, Err(EldestError::Quad(QuadError::BadLimit(0)))));
    }

    #[test]
    fn undressed_resonant_inner_is_exponential() {
        let (e_r, c) = resonance();
        let pole = Channel::single(e_r, 0.0, &c).poles[0].energy;
        let kernel = Kernel { eps: 0.9, pole, t1: -30.0, t: 70.0 };
        let f = |x: f64| kernel.eval(x);
        let (exact, _)
            = integrate_complex(
                Method::Quadrature, f, -30.0, 70.0, &QuadParams::default())
            .unwrap();
        assert!((kernel.antiderivative(-30.0, 70.0) - exact).norm() < 1e-8);
    }

    #[test]
    fn wavepacket_decays_after_the_pulse() {
        let ir = IrPulse::new(0.057, 3.0, 0.0, Envelope::SinSq, 0.0, 400.0, None);
        let eng = engine(ir, Method::Analytic);
        let (e_r, c) = resonance();
        let level = wavepacket_single(e_r, &c);
        let t0 = eng.get_timing().xuv_end;
        let a0 = eng.wavepacket(&level, t0).unwrap().norm();
        let tau = 1.0 / level.width();
        let a1 = eng.wavepacket(&level, t0 + tau).unwrap().norm();
        assert!(a0 > 0.0);
        assert!((a1 / a0 - (-0.5_f64).exp()).abs() < 1e-8);
    }
}

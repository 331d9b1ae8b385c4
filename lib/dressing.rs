//! Phase imprinted on a photoelectron by the streaking IR pulse.
//!
//! An electron with asymptotic momentum *p* emitted at time *t′* and observed
//! at *t* picks up the dressing factor
//! ```text
//! D(t′, t) = exp(-i [Φ(c(t)) - Φ(c(t′))])
//!
//!          τ
//! Φ(τ) = ∫ dτ′ (p A(τ′) + A(τ′)² / 2)
//!        τ₀
//! ```
//! where *A* is the IR vector potential, τ₀ is the start of the IR pulse, and
//! *c* clamps a time to the support of the pulse (no phase accumulates before
//! the pulse, and it is frozen after). The *p*²/2 part of the Volkov phase is
//! carried by the kinetic energy in the amplitude formulas.
//!
//! Φ is evaluated in closed form for both envelopes or numerically; see
//! [`PhaseEval`]. A [`FourierCache`] additionally represents exp(iΦ) over the
//! IR pulse by its significant discrete Fourier components so that integrals
//! of exponentials against it can be done term by term.

use std::f64::consts::{ FRAC_1_SQRT_2, PI };
use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    pulse::IrPulse,
    error::QuadError,
    quad::{ QuadParams, QuadResult, integrate, Method },
    regime::{ PhaseEval, phase_eval },
    special::faddeeva,
    utils::{ do_fft, fft_shift },
};

/// Default sampling step of a [`FourierCache`], in atomic units of time.
pub const DEF_FOURIER_STEP: f64 = 1.0;
/// Default power threshold of a [`FourierCache`].
pub const DEF_FOURIER_THRESHOLD: f64 = 1.0;

/// Sampling settings of a [`FourierCache`].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FourierParams {
    /// Sampling step, in atomic units of time.
    pub step: f64,
    /// Components with power `|c_k|² / N` at or below this are dropped.
    pub threshold: f64,
}

impl Default for FourierParams {
    fn default() -> Self {
        Self { step: DEF_FOURIER_STEP, threshold: DEF_FOURIER_THRESHOLD }
    }
}

// frequencies below this are treated as zero in closed-form antiderivatives
const ZERO_FREQ: f64 = 1e-12;

// amp * cos(k s + theta)
#[derive(Copy, Clone, Debug)]
struct CosTerm {
    amp: f64,
    k: f64,
    theta: f64,
}

impl CosTerm {
    fn antiderivative(&self, s: f64) -> f64 {
        if self.k.abs() < ZERO_FREQ {
            self.amp * s * self.theta.cos()
        } else {
            self.amp * (self.k * s + self.theta).sin() / self.k
        }
    }
}

// expand p A + A²/2 for a sin² envelope into pure cosines of s = τ - Δt
fn sinsq_terms(ir: &IrPulse, p: f64) -> Vec<CosTerm> {
    let a0 = ir.a0();
    let w = ir.get_omega();
    let phi = ir.get_phase();
    let wl = 2.0 * PI / ir.duration();
    let pa = p * a0;
    let aa = a0 * a0 / 16.0;
    let term = |amp: f64, k: f64, theta: f64| CosTerm { amp, k, theta };
    vec![
        term(pa * 0.50, w, phi),
        term(pa * 0.25, w + wl, phi),
        term(pa * 0.25, w - wl, phi),
        term(aa * 1.50, 0.0, 0.0),
        term(aa * 2.00, wl, 0.0),
        term(aa * 0.50, 2.0 * wl, 0.0),
        term(aa * 1.50, 2.0 * w, 2.0 * phi),
        term(aa * 1.00, 2.0 * w + wl, 2.0 * phi),
        term(aa * 1.00, 2.0 * w - wl, 2.0 * phi),
        term(aa * 0.25, 2.0 * w + 2.0 * wl, 2.0 * phi),
        term(aa * 0.25, 2.0 * w - 2.0 * wl, 2.0 * phi),
    ]
}

// ∫_{-∞}^{s} exp(-u²/2σ² + iωu) du, kept finite for large σω through the
// Faddeeva function
fn gauss_osc_integral(s: f64, sigma: f64, omega: f64) -> C64 {
    let z = -C64::new(sigma * sigma * omega, s) * FRAC_1_SQRT_2 / sigma;
    let prefactor = sigma * (PI / 2.0).sqrt();
    let arg = C64::new(-s * s / (2.0 * sigma * sigma), omega * s);
    prefactor * arg.exp() * faddeeva(z)
}

/// The IR dressing of one photoelectron momentum.
#[derive(Clone, Debug)]
pub struct Dressing {
    ir: IrPulse,
    p: f64,
    eval: PhaseEval,
    params: QuadParams,
    terms: Vec<CosTerm>,
    phase0: f64,
}

impl Dressing {
    /// Create a new `Dressing` for kinetic energy `e_kin`, evaluating the
    /// phase in closed form when `mode` is [`Method::Analytic`] and with
    /// `mode` otherwise.
    pub fn new(ir: &IrPulse, e_kin: f64, mode: Method, params: &QuadParams)
        -> Self
    {
        let p = (2.0 * e_kin).sqrt();
        let eval = phase_eval(ir.get_envelope(), mode);
        let terms
            = if eval == PhaseEval::CosineSeries {
                sinsq_terms(ir, p)
            } else {
                Vec::new()
            };
        let mut new = Self { ir: *ir, p, eval, params: *params, terms, phase0: 0.0 };
        new.phase0 = new.antiderivative(-ir.half_width());
        new
    }

    /// Return a copy of `self` for the same pulse shifted to a new delay.
    pub fn with_delay(&self, delay: f64) -> Self {
        Self { ir: self.ir.with_delay(delay), ..self.clone() }
    }

    /// Return the IR pulse.
    pub fn get_ir(&self) -> &IrPulse { &self.ir }

    /// Return the photoelectron momentum.
    pub fn momentum(&self) -> f64 { self.p }

    /// Return how the phase is evaluated.
    pub fn get_eval(&self) -> PhaseEval { self.eval }

    /// Return the phase accumulation rate `p A(t) + A(t)²/2`.
    pub fn rate(&self, t: f64) -> f64 {
        let a = self.ir.vector_potential(t);
        self.p * a + 0.5 * a * a
    }

    // closed-form antiderivative of the rate in s = τ - Δt; zero for numeric
    // evaluation
    fn antiderivative(&self, s: f64) -> f64 {
        match self.eval {
            PhaseEval::CosineSeries
                => self.terms.iter().map(|term| term.antiderivative(s)).sum(),
            PhaseEval::ErfSeries => {
                let a0 = self.ir.a0();
                let w = self.ir.get_omega();
                let phi = C64::from_polar(1.0, self.ir.get_phase());
                let sigma = self.ir.sigma();
                let sigma2 = sigma * FRAC_1_SQRT_2;
                let pa = self.p * a0 * (phi * gauss_osc_integral(s, sigma, w)).re;
                let aa
                    = a0 * a0 / 4.0 * (
                        gauss_osc_integral(s, sigma2, 0.0).re
                        + (phi * phi * gauss_osc_integral(s, sigma2, 2.0 * w)).re
                    );
                pa + aa
            },
            PhaseEval::Numeric(_) => 0.0,
        }
    }

    /// Return the accumulated phase Φ at time `t`.
    pub fn phase(&self, t: f64) -> QuadResult<f64> {
        if self.ir.is_off() { return Ok(0.0); }
        let tc = self.ir.clamp(t);
        match self.eval {
            PhaseEval::CosineSeries | PhaseEval::ErfSeries
                => Ok(self.antiderivative(tc - self.ir.get_delay()) - self.phase0),
            PhaseEval::Numeric(method) => {
                integrate(method, |tau| self.rate(tau), self.ir.start(), tc, &self.params)
                    .map(|(val, _)| val)
            },
        }
    }

    /// Return the dressing factor `D(t_emit, t_obs)`.
    pub fn factor(&self, t_emit: f64, t_obs: f64) -> QuadResult<C64> {
        let dphi = self.phase(t_obs)? - self.phase(t_emit)?;
        Ok(C64::from_polar(1.0, -dphi))
    }
}

/// Truncated discrete Fourier representation of exp(iΦ) over the IR pulse.
///
/// Coordinates are measured from the start of the pulse, so one cache serves
/// every delay.
#[derive(Clone, Debug)]
pub struct FourierCache {
    step: f64,
    n: usize,
    // (c_k / N, 2π f_k)
    components: Vec<(C64, f64)>,
}

impl FourierCache {
    /// Sample exp(iΦ) every `step` over the IR pulse and keep the components
    /// whose power `|c_k|² / N` exceeds `threshold`.
    pub fn new(dressing: &Dressing, step: f64, threshold: f64)
        -> QuadResult<Self>
    {
        QuadError::check_epsilon(step)?;
        let ir = dressing.get_ir();
        let n: usize = (ir.duration() / step).floor() as usize + 1;
        let samples: nd::Array1<C64>
            = (0..n)
            .map(|j| {
                let t = ir.start() + j as f64 * step;
                dressing.phase(t).map(|phi| C64::from_polar(1.0, phi))
            })
            .collect::<QuadResult<_>>()?;
        let (coeffs, freqs) = do_fft(&samples, step);
        let nf = n as f64;
        // ascending frequency
        let components: Vec<(C64, f64)>
            = fft_shift(&coeffs).iter().zip(fft_shift(&freqs).iter())
            .filter(|(ck, _)| ck.norm_sqr() / nf > threshold)
            .map(|(ck, fk)| (*ck / nf, 2.0 * PI * fk))
            .collect();
        if let (Some((_, lo)), Some((_, hi))) = (components.first(), components.last()) {
            log::debug!(
                "dressing::FourierCache::new: p = {:.5}: kept {} of {} components \
                in [{:.5}, {:.5}]",
                dressing.momentum(), components.len(), n, lo, hi,
            );
        } else {
            log::warn!(
                "dressing::FourierCache::new: p = {:.5}: no component above \
                threshold {:.3e}",
                dressing.momentum(), threshold,
            );
        }
        Ok(Self { step, n, components })
    }

    /// Return the sampling step.
    pub fn get_step(&self) -> f64 { self.step }

    /// Return the number of samples.
    pub fn get_samples(&self) -> usize { self.n }

    /// Return the number of retained components.
    pub fn len(&self) -> usize { self.components.len() }

    /// Return `true` if no component was retained.
    pub fn is_empty(&self) -> bool { self.components.is_empty() }

    /// Evaluate the truncated series at time `u` after the start of the pulse.
    pub fn eval(&self, u: f64) -> C64 {
        self.components.iter()
            .map(|(ck, nu)| ck * C64::from_polar(1.0, nu * u))
            .sum()
    }

    /// Integrate `kernel(x) exp(iΦ(x))` over `[a, b]` term by term, where
    /// `kernel` satisfies `kernel′ = kappa kernel` and `origin` is the
    /// absolute start time of the IR pulse.
    pub fn integrate_exp<K>(&self, kernel: K, kappa: C64, origin: f64, a: f64, b: f64)
        -> C64
    where K: Fn(f64) -> C64
    {
        let (ka, kb) = (kernel(a), kernel(b));
        self.components.iter()
            .map(|(ck, nu)| {
                let rate = kappa + C64::i() * nu;
                let ea = ka * C64::from_polar(1.0, nu * (a - origin));
                let eb = kb * C64::from_polar(1.0, nu * (b - origin));
                if rate.norm() < ZERO_FREQ {
                    ck * ea * (b - a)
                } else {
                    ck * (eb - ea) / rate
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::Envelope;

    fn check_closed_form(envelope: Envelope) {
        let ir = IrPulse::new(0.057, 3.0, 2e-3, envelope, 0.4, 150.0, None);
        let params = QuadParams { limit: 500, ..QuadParams::default() };
        let closed = Dressing::new(&ir, 0.9, Method::Analytic, &params);
        let numeric = Dressing::new(&ir, 0.9, Method::Quadrature, &params);
        for frac in [0.0, 0.13, 0.5, 0.77, 1.0, 1.3] {
            let t = ir.start() + frac * ir.duration();
            let a = closed.phase(t).unwrap();
            let b = numeric.phase(t).unwrap();
            assert!((a - b).abs() < 1e-6 * (1.0 + b.abs()), "{envelope:?} {frac}: {a} vs {b}");
        }
    }

    #[test]
    fn sinsq_closed_form_matches_quadrature() {
        check_closed_form(Envelope::SinSq);
    }

    #[test]
    fn gauss_closed_form_matches_quadrature() {
        check_closed_form(Envelope::Gauss);
    }

    #[test]
    fn no_phase_outside_pulse() {
        let ir = IrPulse::new(0.057, 2.0, 1e-3, Envelope::SinSq, 0.0, 0.0, None);
        let d = Dressing::new(&ir, 1.2, Method::Analytic, &QuadParams::default());
        assert_eq!(d.phase(ir.start() - 50.0).unwrap(), 0.0);
        let end = d.phase(ir.end()).unwrap();
        assert_eq!(d.phase(ir.end() + 1e4).unwrap(), end);
        let f = d.factor(ir.end() + 1.0, ir.end() + 5.0).unwrap();
        assert!((f - 1.0).norm() < 1e-14);
    }

    #[test]
    fn unthresholded_cache_reproduces_samples() {
        let ir = IrPulse::new(0.057, 2.0, 1e-3, Envelope::SinSq, 0.0, 0.0, None);
        let d = Dressing::new(&ir, 1.2, Method::Analytic, &QuadParams::default());
        let cache = FourierCache::new(&d, 2.0, 0.0).unwrap();
        assert_eq!(cache.len(), cache.get_samples());
        for j in [0, 7, 50, cache.get_samples() - 1] {
            let u = j as f64 * 2.0;
            let exact = C64::from_polar(1.0, d.phase(ir.start() + u).unwrap());
            assert!((cache.eval(u) - exact).norm() < 1e-10);
        }
        // shifting the pulse does not change the cache
        let shifted = FourierCache::new(&d.with_delay(500.0), 2.0, 0.0).unwrap();
        assert!((shifted.eval(31.0) - cache.eval(31.0)).norm() < 1e-10);
    }

    #[test]
    fn cache_without_field_integrates_exponential() {
        let ir = IrPulse::new(0.057, 2.0, 0.0, Envelope::Gauss, 0.0, 0.0, None);
        let d = Dressing::new(&ir, 1.2, Method::Analytic, &QuadParams::default());
        let cache = FourierCache::new(&d, 1.0, 1.0).unwrap();
        assert_eq!(cache.len(), 1);
        let kappa = C64::new(-0.01, 0.3);
        let kernel = |x: f64| (kappa * x).exp();
        let (a, b) = (ir.start() + 3.0, ir.start() + 40.0);
        let exact = (kernel(b) - kernel(a)) / kappa;
        let val = cache.integrate_exp(kernel, kappa, ir.start(), a, b);
        assert!((val - exact).norm() < 1e-12 * exact.norm());
    }
}

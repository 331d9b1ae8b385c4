//! Definite integration of real- and complex-valued functions of time.
//!
//! Provides implementations for the following numerical routines:
//! - Adaptive Gauss-Kronrod (7-point Gauss, 15-point Kronrod) quadrature with
//!   absolute/relative error control
//! - Romberg integration (Richardson extrapolation of the trapezoid ladder)
//!
//! Complex integrands are split into real and imaginary sub-integrands that
//! are integrated independently. The third [`Method`], [`Method::Analytic`],
//! has no numerical routine here: it marks call sites that evaluate a
//! closed-form antiderivative instead (see [`dressing`][crate::dressing] and
//! [`amplitude`][crate::amplitude]).
//!
//! ```
//! use num_complex::Complex64 as C64;
//! use eldest::quad::{ Method, QuadParams, integrate_complex };
//!
//! // ∫₀¹ exp(3 i t) dt = (exp(3i) - 1) / 3i
//! let f = |t: f64| (C64::i() * 3.0 * t).exp();
//! let exact = ((C64::i() * 3.0).exp() - 1.0) / (C64::i() * 3.0);
//! let params = QuadParams::default();
//! for method in [Method::Quadrature, Method::Romberg] {
//!     let (val, _err) = integrate_complex(method, f, 0.0, 1.0, &params).unwrap();
//!     assert!((val - exact).norm() < 1e-8);
//! }
//! ```

use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::error::QuadError;

pub type QuadResult<T> = Result<T, QuadError>;

/// Default absolute tolerance.
pub const DEF_EPSABS: f64 = 1.49e-8;
/// Default relative tolerance.
pub const DEF_EPSREL: f64 = 1.49e-8;
/// Default maximum number of subintervals in adaptive quadrature.
pub const DEF_LIMIT: usize = 50;
/// Default maximum number of Romberg levels.
pub const DEF_LEVELS: usize = 18;

/// Integration strategy, selected once per run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Closed-form antiderivative evaluated at the bounds.
    Analytic,
    /// Adaptive Gauss-Kronrod quadrature.
    Quadrature,
    /// Romberg extrapolation.
    Romberg,
}

impl Method {
    /// Return `true` if `self` is `Analytic`.
    pub fn is_analytic(&self) -> bool { matches!(self, Self::Analytic) }

    /// Return `true` if `self` is `Quadrature`.
    pub fn is_quadrature(&self) -> bool { matches!(self, Self::Quadrature) }

    /// Return `true` if `self` is `Romberg`.
    pub fn is_romberg(&self) -> bool { matches!(self, Self::Romberg) }
}

/// Tolerances and limits shared by all numerical routines.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadParams {
    /// Absolute error tolerance.
    pub epsabs: f64,
    /// Relative error tolerance.
    pub epsrel: f64,
    /// Maximum number of subintervals for adaptive quadrature.
    pub limit: usize,
    /// Maximum number of Romberg levels (2^levels + 1 points at the last one).
    pub levels: usize,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            epsabs: DEF_EPSABS,
            epsrel: DEF_EPSREL,
            limit: DEF_LIMIT,
            levels: DEF_LEVELS,
        }
    }
}

impl QuadParams {
    /// Check that all tolerances and limits are usable.
    pub fn check(&self) -> QuadResult<()> {
        QuadError::check_epsilon(self.epsabs)?;
        QuadError::check_epsilon(self.epsrel)?;
        QuadError::check_limit(self.limit)?;
        QuadError::check_limit(self.levels)?;
        Ok(())
    }

    fn tolerance(&self, value: f64) -> f64 {
        self.epsabs.max(self.epsrel * value.abs())
    }
}

/// Run-wide choice of strategies for the two nested time integrals of the
/// resonant amplitude.
///
/// `inner` integrates over the emission time of the electron after the
/// resonance has been populated, and may be evaluated in closed form. `outer`
/// integrates over the XUV field and is always numerical.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Integrator {
    pub inner: Method,
    pub outer: Method,
    pub params: QuadParams,
}

impl Integrator {
    /// Create a new `Integrator`, checking that the outer integral is
    /// numerical and that all tolerances are positive.
    pub fn new(inner: Method, outer: Method, params: QuadParams)
        -> QuadResult<Self>
    {
        if outer.is_analytic() { return Err(QuadError::NoClosedForm); }
        params.check()?;
        Ok(Self { inner, outer, params })
    }

    /// Integrate a complex function with the outer strategy.
    pub fn outer<F>(&self, f: F, a: f64, b: f64) -> QuadResult<C64>
    where F: Fn(f64) -> C64
    {
        integrate_complex(self.outer, f, a, b, &self.params)
            .map(|(val, _)| val)
    }

    /// Integrate a complex function with the inner strategy, falling back to
    /// adaptive quadrature for integrands that have no closed form.
    pub fn inner<F>(&self, f: F, a: f64, b: f64) -> QuadResult<C64>
    where F: Fn(f64) -> C64
    {
        let method
            = if self.inner.is_analytic() { Method::Quadrature } else { self.inner };
        integrate_complex(method, f, a, b, &self.params)
            .map(|(val, _)| val)
    }

    /// Integrate a real function with the numerical strategy of the inner
    /// integral (adaptive quadrature when the inner integral is analytic).
    pub fn real<F>(&self, f: F, a: f64, b: f64) -> QuadResult<f64>
    where F: Fn(f64) -> f64
    {
        let method
            = if self.inner.is_analytic() { Method::Quadrature } else { self.inner };
        integrate(method, f, a, b, &self.params).map(|(val, _)| val)
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            inner: Method::Analytic,
            outer: Method::Quadrature,
            params: QuadParams::default(),
        }
    }
}

/// Integrate a real function over `[a, b]` with a numerical method, returning
/// the value and an estimate of its absolute error.
///
/// Passing [`Method::Analytic`] is an error.
pub fn integrate<F>(method: Method, f: F, a: f64, b: f64, params: &QuadParams)
    -> QuadResult<(f64, f64)>
where F: Fn(f64) -> f64
{
    match method {
        Method::Analytic => Err(QuadError::NoClosedForm),
        Method::Quadrature => gauss_kronrod(f, a, b, params),
        Method::Romberg => romberg(f, a, b, params),
    }
}

/// Integrate a complex function over `[a, b]` by splitting it into real and
/// imaginary parts, returning the value and the larger of the two error
/// estimates.
pub fn integrate_complex<F>(
    method: Method,
    f: F,
    a: f64,
    b: f64,
    params: &QuadParams,
) -> QuadResult<(C64, f64)>
where F: Fn(f64) -> C64
{
    let (re, err_re) = integrate(method, |t| f(t).re, a, b, params)?;
    let (im, err_im) = integrate(method, |t| f(t).im, a, b, params)?;
    Ok((C64::new(re, im), err_re.max(err_im)))
}

// Kronrod abscissae (non-negative half) and weights; odd indices are the
// 7-point Gauss abscissae
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

#[derive(Copy, Clone, Debug)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

// one 15-point Kronrod evaluation with its embedded 7-point Gauss estimate
fn kronrod15<F>(f: &F, a: f64, b: f64) -> Segment
where F: Fn(f64) -> f64
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let fc = f(center);
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];
    for (j, (x, w)) in XGK.iter().zip(WGK.iter()).take(7).enumerate() {
        let dx = half * x;
        let pair = f(center - dx) + f(center + dx);
        kronrod += w * pair;
        if j % 2 == 1 { gauss += WG[j / 2] * pair; }
    }
    let value = kronrod * half;
    let error = ((kronrod - gauss) * half).abs();
    Segment { a, b, value, error }
}

/// Adaptive Gauss-Kronrod quadrature over `[a, b]`.
///
/// The subinterval with the largest error estimate is bisected until the
/// summed estimate falls below `max(epsabs, epsrel * |I|)` or `limit`
/// subintervals exist, in which case the current value is returned with a
/// warning.
pub fn gauss_kronrod<F>(f: F, a: f64, b: f64, params: &QuadParams)
    -> QuadResult<(f64, f64)>
where F: Fn(f64) -> f64
{
    params.check()?;
    if a == b { return Ok((0.0, 0.0)); }
    if b < a {
        return gauss_kronrod(f, b, a, params).map(|(val, err)| (-val, err));
    }
    let mut segments: Vec<Segment> = vec![kronrod15(&f, a, b)];
    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        if error <= params.tolerance(value) || !error.is_finite() {
            return Ok((value, error));
        }
        if segments.len() >= params.limit {
            log::warn!(
                "quad::gauss_kronrod: subdivision limit {} reached on \
                [{a:.6e}, {b:.6e}]; error estimate {error:.3e}",
                params.limit,
            );
            return Ok((value, error));
        }
        let (worst, _)
            = segments.iter().enumerate()
            .fold((0, f64::NEG_INFINITY), |(imax, emax), (i, s)| {
                if s.error > emax { (i, s.error) } else { (imax, emax) }
            });
        let seg = segments.swap_remove(worst);
        let mid = 0.5 * (seg.a + seg.b);
        segments.push(kronrod15(&f, seg.a, mid));
        segments.push(kronrod15(&f, mid, seg.b));
    }
}

/// Romberg integration over `[a, b]`.
///
/// Each level halves the trapezoid step, reusing the previous level's samples,
/// and extrapolates the new row of the Romberg table. Stops when the last two
/// extrapolants agree to within tolerance; if `levels` is exhausted first, the
/// last extrapolant is returned with a warning.
pub fn romberg<F>(f: F, a: f64, b: f64, params: &QuadParams)
    -> QuadResult<(f64, f64)>
where F: Fn(f64) -> f64
{
    params.check()?;
    if a == b { return Ok((0.0, 0.0)); }
    let h0 = b - a;
    let mut prev: Vec<f64> = vec![0.5 * h0 * (f(a) + f(b))];
    let mut diff: f64 = f64::INFINITY;
    for n in 1..=params.levels {
        let steps: usize = 1 << (n - 1);
        let h = h0 / (2 * steps) as f64;
        let midsum: f64
            = (0..steps)
            .map(|k| f(a + (2 * k + 1) as f64 * h))
            .sum();
        let mut row: Vec<f64> = Vec::with_capacity(n + 1);
        row.push(0.5 * prev[0] + h * midsum);
        for m in 1..=n {
            let four_m = 4.0_f64.powi(m as i32);
            let extrap = (four_m * row[m - 1] - prev[m - 1]) / (four_m - 1.0);
            row.push(extrap);
        }
        diff = (row[n] - row[n - 1]).abs();
        if n > 1 && diff < params.tolerance(row[n]) {
            return Ok((row[n], diff));
        }
        prev = row;
    }
    log::warn!(
        "quad::romberg: failed to converge in {} levels on [{a:.6e}, {b:.6e}]; \
        last difference {diff:.3e}",
        params.levels,
    );
    Ok((prev[prev.len() - 1], diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn kronrod_exact_for_polynomials() {
        // the 15-point rule integrates degree-22 polynomials exactly
        let f = |x: f64| 3.0 * x.powi(8) - x.powi(3) + 1.0;
        let exact = 3.0 / 9.0 * 2.0_f64.powi(9) - 2.0_f64.powi(4) / 4.0 + 2.0;
        let (val, err) = gauss_kronrod(f, 0.0, 2.0, &QuadParams::default())
            .unwrap();
        assert!((val - exact).abs() < 1e-10);
        assert!(err < 1e-8);
    }

    #[test]
    fn reversed_bounds_flip_sign() {
        let params = QuadParams::default();
        let (fwd, _) = gauss_kronrod(f64::sin, 0.0, PI, &params).unwrap();
        let (bwd, _) = gauss_kronrod(f64::sin, PI, 0.0, &params).unwrap();
        assert!((fwd - 2.0).abs() < 1e-10);
        assert!((fwd + bwd).abs() < 1e-14);
        let (bwd, _) = romberg(f64::sin, PI, 0.0, &params).unwrap();
        assert!((bwd + 2.0).abs() < 1e-8);
    }

    #[test]
    fn romberg_converges_on_smooth_integrand() {
        let (val, _) = romberg(f64::exp, 0.0, 1.0, &QuadParams::default())
            .unwrap();
        assert!((val - (1.0_f64.exp() - 1.0)).abs() < 1e-10);
    }

    #[test]
    fn romberg_level_cap_returns_value() {
        let params = QuadParams { levels: 2, ..QuadParams::default() };
        let (val, err) = romberg(|t| (40.0 * t).cos(), 0.0, 1.0, &params)
            .unwrap();
        assert!(val.is_finite());
        assert!(err > 0.0);
    }

    #[test]
    fn oscillatory_complex_integrand() {
        // ∫ exp(iωt) over many periods against the antiderivative
        let w = 2.3;
        let (a, b) = (-40.0, 65.0);
        let exact
            = ((C64::i() * w * b).exp() - (C64::i() * w * a).exp())
            / (C64::i() * w);
        let params = QuadParams { limit: 200, ..QuadParams::default() };
        let (val, _) = integrate_complex(
            Method::Quadrature, |t| (C64::i() * w * t).exp(), a, b, &params,
        ).unwrap();
        assert!((val - exact).norm() < 1e-7);
        let params = QuadParams { levels: 22, ..QuadParams::default() };
        let (val, _) = integrate_complex(
            Method::Romberg, |t| (C64::i() * w * t).exp(), a, b, &params,
        ).unwrap();
        assert!((val - exact).norm() < 1e-7);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let bad = QuadParams { epsabs: 0.0, ..QuadParams::default() };
        assert!(matches!(
            gauss_kronrod(f64::sin, 0.0, 1.0, &bad),
            Err(QuadError::BadEpsilon(_)),
        ));
        assert!(matches!(
            Integrator::new(Method::Quadrature, Method::Analytic, QuadParams::default()),
            Err(QuadError::NoClosedForm),
        ));
        assert!(matches!(
            integrate(Method::Analytic, f64::sin, 0.0, 1.0, &QuadParams::default()),
            Err(QuadError::NoClosedForm),
        ));
    }
}

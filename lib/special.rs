//! Special functions needed by the vibrational wavefunctions and the
//! closed-form pulse integrals.
//!
//! All routines are plain `f64`/[`C64`] evaluations tuned for the argument
//! ranges met in this crate, not general-purpose library implementations.

use std::f64::consts::{ FRAC_PI_4, PI };
use num_complex::Complex64 as C64;

// Lanczos coefficients for g = 7, n = 9
const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural logarithm of the gamma function for `x > 0`.
///
/// ```
/// use eldest::special::ln_gamma;
///
/// // Γ(5) = 4! = 24
/// assert!((ln_gamma(5.0) - 24.0_f64.ln()).abs() < 1e-12);
/// ```
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // reflection
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let a: f64
        = LANCZOS.iter().enumerate().skip(1)
        .fold(LANCZOS[0], |acc, (k, ck)| acc + ck / (x + k as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Generalized Laguerre polynomial *L*ₙ⁽ᵃ⁾(*x*) by upward recurrence.
///
/// ```
/// use eldest::special::laguerre;
///
/// // L₂⁽ᵃ⁾(x) = (x² - 2(a + 2)x + (a + 1)(a + 2)) / 2
/// let (a, x) = (1.5, 0.7);
/// let exact = (x * x - 2.0 * (a + 2.0) * x + (a + 1.0) * (a + 2.0)) / 2.0;
/// assert!((laguerre(2, a, x) - exact).abs() < 1e-12);
/// ```
pub fn laguerre(n: usize, a: f64, x: f64) -> f64 {
    if n == 0 { return 1.0; }
    let mut lprev: f64 = 1.0;
    let mut l: f64 = 1.0 + a - x;
    for k in 1..n {
        let k = k as f64;
        let lnext = ((2.0 * k + 1.0 + a - x) * l - (k + a) * lprev) / (k + 1.0);
        lprev = l;
        l = lnext;
    }
    l
}

const AI0: f64 = 0.355_028_053_887_817_2; // Ai(0)
const AIP0: f64 = 0.258_819_403_792_806_8; // -Ai'(0)
const AIRY_ASYMP: [f64; 7] = [
    1.0,
    0.069_444_444_444_444_44,
    0.037_133_487_654_320_99,
    0.037_993_059_127_800_64,
    0.057_649_190_412_669_72,
    0.116_099_064_025_515_18,
    0.291_591_399_230_751_4,
];
const AIRY_SWITCH: f64 = 6.0;

/// Airy function Ai(*x*) for real arguments.
///
/// Uses the Maclaurin series for |*x*| ≤ 6 and the leading terms of the
/// asymptotic expansions beyond.
///
/// ```
/// use eldest::special::airy_ai;
///
/// assert!((airy_ai(0.0) - 0.3550280538878172).abs() < 1e-14);
/// assert!((airy_ai(-2.338107410459767)).abs() < 1e-9); // first zero
/// ```
pub fn airy_ai(x: f64) -> f64 {
    if x.abs() <= AIRY_SWITCH {
        let x3 = x.powi(3);
        let mut f: f64 = 1.0;
        let mut g: f64 = x;
        let mut tf: f64 = 1.0;
        let mut tg: f64 = x;
        for k in 1..200 {
            let k3 = 3.0 * k as f64;
            tf *= x3 / ((k3 - 1.0) * k3);
            tg *= x3 / (k3 * (k3 + 1.0));
            f += tf;
            g += tg;
            if tf.abs() < 1e-17 * f.abs() && tg.abs() < 1e-17 * g.abs().max(1e-300) {
                break;
            }
        }
        AI0 * f - AIP0 * g
    } else if x > 0.0 {
        let zeta = 2.0 / 3.0 * x.powf(1.5);
        let series: f64
            = AIRY_ASYMP.iter().enumerate()
            .map(|(k, uk)| {
                let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                sign * uk / zeta.powi(k as i32)
            })
            .sum();
        (-zeta).exp() / (2.0 * PI.sqrt() * x.powf(0.25)) * series
    } else {
        let y = -x;
        let zeta = 2.0 / 3.0 * y.powf(1.5);
        let (mut even, mut odd): (f64, f64) = (0.0, 0.0);
        for (k, uk) in AIRY_ASYMP.iter().enumerate() {
            let term = uk / zeta.powi(k as i32);
            match k % 4 {
                0 => { even += term; },
                1 => { odd += term; },
                2 => { even -= term; },
                _ => { odd -= term; },
            }
        }
        let phase = zeta + FRAC_PI_4;
        (phase.sin() * even - phase.cos() * odd) / (PI.sqrt() * y.powf(0.25))
    }
}

const ERF_SERIES_RADIUS: f64 = 3.0;
const ERF_SERIES_STRIP: f64 = 2.0;
const ERF_CF_DEPTH: usize = 120;
const ERF_MAX_TERMS: usize = 4000;

/// Error function of a complex argument.
///
/// Uses the Maclaurin series near the origin and in the strip |Re(*z*)| < 2
/// (where cancellation between its terms stays below a factor exp(2 Re(*z*)²)),
/// and the Laplace continued fraction of the Faddeeva function elsewhere. Results grow like exp(Im(z)²) along the
/// imaginary axis; callers combine them with compensating Gaussian factors.
///
/// ```
/// use num_complex::Complex64 as C64;
/// use eldest::special::erf;
///
/// // erf(1) = 0.8427007929497149
/// assert!((erf(C64::new(1.0, 0.0)).re - 0.8427007929497149).abs() < 1e-13);
/// // erf(-z) = -erf(z)
/// let z = C64::new(0.3, -2.0);
/// assert!((erf(-z) + erf(z)).norm() < 1e-12);
/// ```
pub fn erf(z: C64) -> C64 {
    if z.re < 0.0 { return -erf(-z); }
    if z.norm() < ERF_SERIES_RADIUS || z.re < ERF_SERIES_STRIP {
        erf_series(z)
    } else {
        // erf(z) = 1 - exp(-z²) w(iz), with Im(iz) = Re(z) > 0
        C64::from(1.0) - (-z * z).exp() * faddeeva_cf(C64::i() * z)
    }
}

fn erf_series(z: C64) -> C64 {
    // erf(z) = 2/√π Σ (-1)ⁿ z²ⁿ⁺¹ / (n! (2n + 1))
    let mz2 = -z * z;
    let mut term: C64 = z;
    let mut sum: C64 = z;
    for n in 1..ERF_MAX_TERMS {
        let n = n as f64;
        term *= mz2 / n;
        let contrib = term / (2.0 * n + 1.0);
        sum += contrib;
        if contrib.norm() <= 1e-17 * sum.norm() { break; }
    }
    sum * (2.0 / PI.sqrt())
}

const FADDEEVA_CF_RADIUS: f64 = 6.0;
const FADDEEVA_CF_HEIGHT: f64 = 1.5;

/// Faddeeva function *w*(*z*) = exp(-*z*²) erfc(-i*z*).
///
/// Uses the Laplace continued fraction for |*z*| ≥ 6 or Im(*z*) ≥ 3/2 and the
/// relation to [`erf`] in the remaining region near the real axis; the lower half-plane follows from
/// *w*(*z*) = 2 exp(-*z*²) - *w*(-*z*). Unlike [`erf`], *w* stays bounded in
/// the upper half-plane, which makes it the building block for Gaussian
/// integrals with large oscillation frequencies.
///
/// ```
/// use num_complex::Complex64 as C64;
/// use eldest::special::faddeeva;
///
/// // w(i) = e erfc(1)
/// let w = faddeeva(C64::new(0.0, 1.0));
/// assert!((w.re - 0.4275835761558070).abs() < 1e-13);
/// assert!(w.im.abs() < 1e-13);
/// ```
pub fn faddeeva(z: C64) -> C64 {
    if z.im < 0.0 {
        return 2.0 * (-z * z).exp() - faddeeva(-z);
    }
    if z.norm() >= FADDEEVA_CF_RADIUS || z.im >= FADDEEVA_CF_HEIGHT {
        faddeeva_cf(z)
    } else {
        (-z * z).exp() * (C64::from(1.0) - erf(-C64::i() * z))
    }
}

// Laplace continued fraction for the Faddeeva function w(z), Im(z) > 0,
// evaluated bottom-up at fixed depth
fn faddeeva_cf(z: C64) -> C64 {
    let mut r = C64::from(0.0);
    for k in (1..=ERF_CF_DEPTH).rev() {
        r = (k as f64 / 2.0) / (z - r);
    }
    C64::i() / PI.sqrt() / (z - r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_gamma_half_integer() {
        // Γ(1/2) = √π
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-13);
        // Γ(10.5)
        assert!((ln_gamma(10.5) - 1_133_278.388_948_785_3_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn airy_matches_tabulated_values() {
        let cases = [
            (1.0, 0.135_292_416_312_881_4),
            (-1.0, 0.535_560_883_292_352_1),
            (5.0, 1.083_444_281_360_744e-4),
            (-8.0, -0.052_705_050_356_385_35),
            (8.0, 4.692_207_616_099_232e-8),
        ];
        for (x, exact) in cases {
            let rel = ((airy_ai(x) - exact) / exact).abs();
            assert!(rel < 1e-5, "Ai({x}) off by {rel}");
        }
    }

    #[test]
    fn airy_is_continuous_at_switch() {
        for x in [AIRY_SWITCH, -AIRY_SWITCH] {
            let lo = airy_ai(x - 1e-9 * x.signum());
            let hi = airy_ai(x + 1e-9 * x.signum());
            assert!(((lo - hi) / lo).abs() < 1e-4);
        }
    }

    #[test]
    fn erf_branches_agree() {
        // values near the branch boundary |z| = 3 computed both ways
        for z in [C64::new(2.9, 0.5), C64::new(3.1, 0.5), C64::new(3.5, 0.3)] {
            let cf = C64::from(1.0) - (-z * z).exp() * faddeeva_cf(C64::i() * z);
            let series = erf_series(z);
            assert!((cf - series).norm() < 1e-9, "{z}: {cf} vs {series}");
        }
    }

    #[test]
    fn erf_imaginary_axis_is_erfi() {
        // erf(i) = i erfi(1) = 1.6504257587975428 i
        let v = erf(C64::new(0.0, 1.0));
        assert!(v.re.abs() < 1e-14);
        assert!((v.im - 1.650_425_758_797_542_8).abs() < 1e-12);
    }

    #[test]
    fn faddeeva_is_continuous_at_switch() {
        for arg in [0.0, 0.4, 1.2, 2.5] {
            let u = C64::from_polar(1.0, arg);
            let lo = faddeeva(u * (FADDEEVA_CF_RADIUS - 1e-9));
            let hi = faddeeva(u * (FADDEEVA_CF_RADIUS + 1e-9));
            assert!((lo - hi).norm() < 1e-9 * lo.norm(), "arg {arg}: {lo} vs {hi}");
        }
    }

    #[test]
    fn faddeeva_on_real_axis() {
        // Re w(x) = exp(-x²), Im w(x) = 2 D(x) / √π with Dawson's D(1)
        let w = faddeeva(C64::new(1.0, 0.0));
        assert!((w.re - (-1.0_f64).exp()).abs() < 1e-12);
        assert!((w.im - 2.0 * 0.538_079_506_912_768_4 / PI.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn laguerre_degree_one() {
        assert!((laguerre(1, 3.0, 2.0) - 2.0).abs() < 1e-15);
    }
}

//! XUV and IR pulse shapes.
//!
//! All quantities are in atomic units. The XUV pulse is centered on `t = 0`
//! and enters the amplitudes through its electric field; the IR pulse is
//! centered on the pump-probe delay Δt and enters through its vector
//! potential.
//!
//! Envelope functions are analytic everywhere; the physical support of each
//! pulse is enforced by the [temporal regimes][crate::regime], not here.
//!
//! ```
//! use eldest::pulse::{ Envelope, XuvField, XuvPulse };
//!
//! // 3-cycle sin² pulse at 1 Eh
//! let xuv = XuvPulse::new(1.0, 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted, None);
//! assert!((xuv.duration() - 6.0 * std::f64::consts::PI).abs() < 1e-12);
//! assert!(xuv.field(xuv.start()).abs() < 1e-15);
//! ```

use std::f64::consts::{ LN_2, PI };
use serde::{ Deserialize, Serialize };

/// Number of standard deviations spanned by a Gaussian pulse.
pub const GAUSS_WIDTHS: f64 = 5.0;

/// Pulse envelope shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    /// sin² envelope spanning exactly `n` carrier cycles.
    SinSq,
    /// Gaussian envelope, truncated at ±5σ/2.
    Gauss,
}

impl Envelope {
    /// Return `true` if `self` is `SinSq`.
    pub fn is_sinsq(&self) -> bool { matches!(self, Self::SinSq) }

    /// Return `true` if `self` is `Gauss`.
    pub fn is_gauss(&self) -> bool { matches!(self, Self::Gauss) }
}

/// Form of the XUV electric field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XuvField {
    /// `F(t) = -d/dt [A(t) f(t)]` for carrier `A(t) = A0 cos(Ωt)` and envelope
    /// `f`.
    Convoluted,
    /// Continuous-wave limit, `F(t) = A0 Ω cos(Ωt)`.
    Infinite,
}

// σ of a Gaussian pulse with the bandwidth of `n` cycles at carrier `omega`
fn gauss_sigma(omega: f64, n_cycles: f64) -> f64 {
    PI * n_cycles / (omega * LN_2.sqrt())
}

// σ from a full width at half maximum
fn fwhm_sigma(fwhm: f64) -> f64 { fwhm / (8.0 * LN_2).sqrt() }

/// The exciting XUV pulse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct XuvPulse {
    omega: f64,
    n_cycles: f64,
    intensity: f64,
    envelope: Envelope,
    field: XuvField,
    duration: f64,
    sigma: f64,
    a0: f64,
}

impl XuvPulse {
    /// Create a new XUV pulse from its carrier frequency, number of cycles,
    /// peak intensity, and shape.
    ///
    /// For a Gaussian envelope, an explicit full width at half maximum
    /// overrides the width implied by `n_cycles`; it is ignored for sin².
    pub fn new(
        omega: f64,
        n_cycles: f64,
        intensity: f64,
        envelope: Envelope,
        field: XuvField,
        fwhm: Option<f64>,
    ) -> Self
    {
        let (duration, sigma)
            = match envelope {
                Envelope::SinSq => (n_cycles * 2.0 * PI / omega, f64::NAN),
                Envelope::Gauss => {
                    let sigma
                        = fwhm.map(fwhm_sigma)
                        .unwrap_or_else(|| gauss_sigma(omega, n_cycles));
                    (GAUSS_WIDTHS * sigma, sigma)
                },
            };
        let a0 = intensity.sqrt() / omega;
        Self { omega, n_cycles, intensity, envelope, field, duration, sigma, a0 }
    }

    /// Return the carrier frequency.
    pub fn get_omega(&self) -> f64 { self.omega }

    /// Return the number of cycles.
    pub fn get_n_cycles(&self) -> f64 { self.n_cycles }

    /// Return the peak intensity.
    pub fn get_intensity(&self) -> f64 { self.intensity }

    /// Return the envelope shape.
    pub fn get_envelope(&self) -> Envelope { self.envelope }

    /// Return the field form.
    pub fn get_field(&self) -> XuvField { self.field }

    /// Return the vector potential amplitude `A0 = √I / Ω`.
    pub fn a0(&self) -> f64 { self.a0 }

    /// Return the total duration `T`.
    pub fn duration(&self) -> f64 { self.duration }

    /// Return the start of the pulse, `-T/2`.
    pub fn start(&self) -> f64 { -self.duration / 2.0 }

    /// Return the end of the pulse, `+T/2`.
    pub fn end(&self) -> f64 { self.duration / 2.0 }

    /// Return the standard deviation of a Gaussian envelope (NaN for sin²).
    pub fn sigma(&self) -> f64 { self.sigma }

    /// Return the full width at half maximum of a Gaussian envelope (NaN for
    /// sin²).
    pub fn fwhm(&self) -> f64 { 2.0 * (2.0 * LN_2).sqrt() * self.sigma }

    /// Return the highest photon energy carried by the pulse with appreciable
    /// weight.
    pub fn ex_max(&self) -> f64 {
        match self.envelope {
            Envelope::SinSq => self.omega + 2.0 * PI * 4.0 / self.duration,
            Envelope::Gauss => {
                let sigma_e = 1.0 / (2.0 * self.sigma);
                self.omega + 0.5 * GAUSS_WIDTHS * sigma_e
            },
        }
    }

    /// Evaluate the envelope function.
    pub fn envelope(&self, t: f64) -> f64 {
        match self.envelope {
            Envelope::SinSq => {
                let x = PI * (t + self.duration / 2.0) / self.duration;
                x.sin().powi(2)
            },
            Envelope::Gauss => {
                let s2 = self.sigma.powi(2);
                (-t.powi(2) / (2.0 * s2)).exp() / (2.0 * PI * s2).sqrt()
            },
        }
    }

    /// Evaluate the time derivative of the envelope function.
    pub fn denvelope(&self, t: f64) -> f64 {
        match self.envelope {
            Envelope::SinSq => {
                let x = 2.0 * PI * (t + self.duration / 2.0) / self.duration;
                PI / self.duration * x.sin()
            },
            Envelope::Gauss => {
                let s = self.sigma;
                -t / (2.0 * PI).sqrt() / s.powi(3)
                    * (-t.powi(2) / (2.0 * s * s)).exp()
            },
        }
    }

    /// Evaluate the electric field.
    pub fn field(&self, t: f64) -> f64 {
        match self.field {
            XuvField::Convoluted => {
                let wt = self.omega * t;
                -self.a0 * wt.cos() * self.denvelope(t)
                    + self.a0 * self.omega * wt.sin() * self.envelope(t)
            },
            XuvField::Infinite => self.a0 * self.omega * (self.omega * t).cos(),
        }
    }
}

/// The streaking IR pulse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IrPulse {
    omega: f64,
    n_cycles: f64,
    intensity: f64,
    envelope: Envelope,
    phase: f64,
    delay: f64,
    duration: f64,
    sigma: f64,
    a0: f64,
}

impl IrPulse {
    /// Create a new IR pulse from its carrier frequency, number of cycles,
    /// peak intensity, shape, carrier-envelope phase, and delay relative to
    /// the center of the XUV pulse.
    ///
    /// For a Gaussian envelope, an explicit full width at half maximum
    /// overrides the width implied by `n_cycles`.
    pub fn new(
        omega: f64,
        n_cycles: f64,
        intensity: f64,
        envelope: Envelope,
        phase: f64,
        delay: f64,
        fwhm: Option<f64>,
    ) -> Self
    {
        let (duration, sigma)
            = match envelope {
                Envelope::SinSq => (n_cycles * 2.0 * PI / omega, f64::NAN),
                Envelope::Gauss => {
                    let sigma
                        = fwhm.map(fwhm_sigma)
                        .unwrap_or_else(|| gauss_sigma(omega, n_cycles));
                    (GAUSS_WIDTHS * sigma, sigma)
                },
            };
        let a0 = intensity.sqrt() / omega;
        Self {
            omega, n_cycles, intensity, envelope, phase, delay,
            duration, sigma, a0,
        }
    }

    /// Return a copy of `self` centered on a different delay.
    pub fn with_delay(&self, delay: f64) -> Self { Self { delay, ..*self } }

    /// Return the carrier frequency.
    pub fn get_omega(&self) -> f64 { self.omega }

    /// Return the number of cycles.
    pub fn get_n_cycles(&self) -> f64 { self.n_cycles }

    /// Return the peak intensity.
    pub fn get_intensity(&self) -> f64 { self.intensity }

    /// Return the envelope shape.
    pub fn get_envelope(&self) -> Envelope { self.envelope }

    /// Return the carrier-envelope phase.
    pub fn get_phase(&self) -> f64 { self.phase }

    /// Return the delay Δt.
    pub fn get_delay(&self) -> f64 { self.delay }

    /// Return the vector potential amplitude `A0 = √I / ω`.
    pub fn a0(&self) -> f64 { self.a0 }

    /// Return `true` if the pulse has zero amplitude.
    pub fn is_off(&self) -> bool { self.a0 == 0.0 }

    /// Return the total duration `T`.
    pub fn duration(&self) -> f64 { self.duration }

    /// Return the half-width of the support around the delay.
    pub fn half_width(&self) -> f64 { self.duration / 2.0 }

    /// Return the standard deviation of a Gaussian envelope (NaN for sin²).
    pub fn sigma(&self) -> f64 { self.sigma }

    /// Return the start of the pulse, `Δt - T/2`.
    pub fn start(&self) -> f64 { self.delay - self.half_width() }

    /// Return the end of the pulse, `Δt + T/2`.
    pub fn end(&self) -> f64 { self.delay + self.half_width() }

    /// Clamp a time to the support of the pulse.
    pub fn clamp(&self, t: f64) -> f64 { t.clamp(self.start(), self.end()) }

    /// Evaluate the vector potential.
    pub fn vector_potential(&self, t: f64) -> f64 {
        let s = t - self.delay;
        let carrier = (self.omega * s + self.phase).cos();
        match self.envelope {
            Envelope::SinSq => {
                let x = PI * (s + self.duration / 2.0) / self.duration;
                self.a0 * x.sin().powi(2) * carrier
            },
            Envelope::Gauss => {
                self.a0 * (-s.powi(2) / (2.0 * self.sigma.powi(2))).exp()
                    * carrier
            },
        }
    }
}

//! Temporal regimes of a two-pulse experiment and the amplitude formula that
//! applies in each.
//!
//! The observation time *t* falls into exactly one of five windows, ordered in
//! time:
//! ```text
//!  BeforeXuv | DuringXuv | BetweenPulses | DuringIr | AfterIr
//!         -T_X/2       +T_X/2        Δt - T_L/2  Δt + T_L/2
//! ```
//! When the IR pulse starts before the XUV pulse has ended, `BetweenPulses` is
//! empty and the overlap is classified as `DuringXuv`.
//!
//! Each window fixes the upper bound of the field-weighted (outer) time
//! integral, whether and how the IR dressing phase accumulated up to *t* must
//! be evaluated, and how the dressed and undressed pieces of the inner
//! integral are evaluated. These choices are collected in a [`Formula`], looked
//! up by [`formula`] from the regime, the IR envelope shape, the run-wide
//! inner integration [`Method`], and the kind of [`Scan`].
//!
//! ```
//! use eldest::pulse::{ Envelope, IrPulse, XuvField, XuvPulse };
//! use eldest::regime::{ TemporalRegime, Timing };
//!
//! let xuv = XuvPulse::new(1.6, 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted, None);
//! let ir = IrPulse::new(0.057, 4.0, 1e-6, Envelope::SinSq, 0.0, 300.0, None);
//! let timing = Timing::new(&xuv, &ir).unwrap();
//! assert_eq!(timing.classify(-1e6), TemporalRegime::BeforeXuv);
//! assert_eq!(timing.classify(0.0), TemporalRegime::DuringXuv);
//! assert_eq!(timing.classify(300.0), TemporalRegime::DuringIr);
//! assert_eq!(timing.classify(1e6), TemporalRegime::AfterIr);
//! ```

use std::fmt;
use crate::{
    error::RegimeError,
    pulse::{ Envelope, IrPulse, XuvPulse },
    quad::Method,
};

pub type RegimeResult<T> = Result<T, RegimeError>;

/// Window of the observation time relative to the two pulses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemporalRegime {
    BeforeXuv,
    DuringXuv,
    BetweenPulses,
    DuringIr,
    AfterIr,
}

impl fmt::Display for TemporalRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeforeXuv => write!(f, "before XUV"),
            Self::DuringXuv => write!(f, "during XUV"),
            Self::BetweenPulses => write!(f, "between pulses"),
            Self::DuringIr => write!(f, "during IR"),
            Self::AfterIr => write!(f, "after IR"),
        }
    }
}

/// Boundaries of the two pulses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Timing {
    pub xuv_start: f64,
    pub xuv_end: f64,
    pub ir_start: f64,
    pub ir_end: f64,
}

impl Timing {
    /// Collect the boundaries of two pulses, checking that the IR pulse does
    /// not start before the XUV pulse.
    pub fn new(xuv: &XuvPulse, ir: &IrPulse) -> RegimeResult<Self> {
        RegimeError::check_order(ir.start(), xuv.start())?;
        Ok(Self {
            xuv_start: xuv.start(),
            xuv_end: xuv.end(),
            ir_start: ir.start(),
            ir_end: ir.end(),
        })
    }

    /// Collect the boundaries of two pulses that may overlap in any order.
    ///
    /// Only observation times after the end of both pulses are classified
    /// meaningfully.
    pub fn overlapping(xuv: &XuvPulse, ir: &IrPulse) -> Self {
        Self {
            xuv_start: xuv.start(),
            xuv_end: xuv.end(),
            ir_start: ir.start(),
            ir_end: ir.end(),
        }
    }

    /// Return the first time after both pulses.
    pub fn end(&self) -> f64 { self.xuv_end.max(self.ir_end) }

    /// Return the regime of an observation time.
    pub fn classify(&self, t: f64) -> TemporalRegime {
        if t < self.xuv_start {
            TemporalRegime::BeforeXuv
        } else if t <= self.xuv_end {
            TemporalRegime::DuringXuv
        } else if t < self.ir_start {
            TemporalRegime::BetweenPulses
        } else if t <= self.ir_end {
            TemporalRegime::DuringIr
        } else {
            TemporalRegime::AfterIr
        }
    }
}

/// Tracks the regime of a monotonically advancing simulation clock.
#[derive(Clone, Debug)]
pub struct RegimeMachine {
    timing: Timing,
    now: f64,
    regime: TemporalRegime,
}

impl RegimeMachine {
    /// Create a new machine with its clock at -∞.
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            now: f64::NEG_INFINITY,
            regime: TemporalRegime::BeforeXuv,
        }
    }

    /// Return the pulse boundaries.
    pub fn get_timing(&self) -> &Timing { &self.timing }

    /// Return the current time.
    pub fn get_time(&self) -> f64 { self.now }

    /// Return the current regime.
    pub fn get_regime(&self) -> TemporalRegime { self.regime }

    /// Move the clock forward to `t` and return the regime there.
    ///
    /// Fails if `t` is earlier than the current time.
    pub fn advance(&mut self, t: f64) -> RegimeResult<TemporalRegime> {
        if t < self.now {
            return Err(RegimeError::TimeReversed {
                now: self.now,
                requested: t,
            });
        }
        let regime = self.timing.classify(t);
        if regime != self.regime || self.now == f64::NEG_INFINITY {
            log::info!("entering regime '{regime}' at t = {t:.4} au");
        }
        self.now = t;
        self.regime = regime;
        Ok(regime)
    }
}

/// Upper bound of the field-weighted (outer) time integral.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum XuvBound {
    /// The XUV pulse has not yet started; the amplitude vanishes.
    Empty,
    /// Integrate up to the observation time.
    Now,
    /// Integrate over the whole XUV pulse.
    PulseEnd,
}

/// How the dressing phase accumulated up to the observation time is obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseRule {
    /// The IR pulse has not started; no phase has accumulated.
    Unity,
    /// The phase is evaluated at the observation time.
    Running,
    /// The IR pulse is over; the phase is evaluated at its end.
    Frozen,
}

/// How the dressing phase integral is evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhaseEval {
    /// Closed-form sum of sines for a sin² envelope.
    CosineSeries,
    /// Closed-form combination of complex error functions for a Gaussian
    /// envelope.
    ErfSeries,
    /// Numerical integration.
    Numeric(Method),
}

/// How one piece of the inner (emission-time) integral is evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SegmentRule {
    /// Closed-form antiderivative of the decay-phase exponential.
    Exponential,
    /// Term-by-term closed-form integration of a truncated Fourier series of
    /// the dressing factor.
    FourierSeries,
    /// Numerical integration.
    Numeric(Method),
}

/// Everything needed to evaluate the amplitude in one regime.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Formula {
    pub regime: TemporalRegime,
    pub xuv_bound: XuvBound,
    pub phase: PhaseRule,
    pub eval: PhaseEval,
    /// Rule for pieces of the inner integral outside the IR pulse.
    pub undressed: SegmentRule,
    /// Rule for pieces inside the IR pulse, if any can exist in this regime.
    pub dressed: Option<SegmentRule>,
}

impl Formula {
    /// Return the upper bound of the outer integral for observation time `t`,
    /// or `None` if the amplitude vanishes.
    pub fn xuv_upper(&self, t: f64, timing: &Timing) -> Option<f64> {
        match self.xuv_bound {
            XuvBound::Empty => None,
            XuvBound::Now => Some(t.min(timing.xuv_end)),
            XuvBound::PulseEnd => Some(timing.xuv_end),
        }
    }
}

/// Return how the dressing phase is evaluated for an IR envelope and inner
/// integration method.
pub fn phase_eval(shape: Envelope, mode: Method) -> PhaseEval {
    match (shape, mode) {
        (Envelope::SinSq, Method::Analytic) => PhaseEval::CosineSeries,
        (Envelope::Gauss, Method::Analytic) => PhaseEval::ErfSeries,
        (_, numeric) => PhaseEval::Numeric(numeric),
    }
}

/// Kind of scan an amplitude is evaluated for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scan {
    /// Observation time stepped through the regimes at a fixed delay.
    Time,
    /// Observation after both pulses for many delays, sharing one dressing
    /// cache per kinetic energy.
    Delay,
}

/// Look up the amplitude formula for a regime, IR envelope, inner integration
/// method, and scan kind.
///
/// With a closed-form inner integral, dressed pieces are integrated by
/// adaptive quadrature over the closed-form phase in time scans, and term by
/// term over the truncated Fourier series in delay scans.
pub fn formula(regime: TemporalRegime, shape: Envelope, mode: Method, scan: Scan)
    -> Formula
{
    use TemporalRegime::*;
    let eval = phase_eval(shape, mode);
    let (undressed, dressed)
        = match (mode, scan) {
            (Method::Analytic, Scan::Time)
                => (SegmentRule::Exponential, SegmentRule::Numeric(Method::Quadrature)),
            (Method::Analytic, Scan::Delay)
                => (SegmentRule::Exponential, SegmentRule::FourierSeries),
            (numeric, _)
                => (SegmentRule::Numeric(numeric), SegmentRule::Numeric(numeric)),
        };
    let (xuv_bound, phase, dressed)
        = match regime {
            BeforeXuv => (XuvBound::Empty, PhaseRule::Unity, None),
            DuringXuv => (XuvBound::Now, PhaseRule::Running, Some(dressed)),
            BetweenPulses => (XuvBound::PulseEnd, PhaseRule::Unity, None),
            DuringIr => (XuvBound::PulseEnd, PhaseRule::Running, Some(dressed)),
            AfterIr => (XuvBound::PulseEnd, PhaseRule::Frozen, Some(dressed)),
        };
    Formula { regime, xuv_bound, phase, eval, undressed, dressed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::XuvField;

    fn timing(delay: f64) -> Timing {
        let xuv = XuvPulse::new(
            1.6, 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted, None);
        let ir = IrPulse::new(
            0.057, 2.0, 1e-6, Envelope::Gauss, 0.0, delay, None);
        Timing::new(&xuv, &ir).unwrap()
    }

    #[test]
    fn overlapping_pulses_skip_between() {
        let t = Timing { xuv_start: -5.0, xuv_end: 5.0, ir_start: 4.0, ir_end: 40.0 };
        assert_eq!(t.classify(t.xuv_end - 0.5), TemporalRegime::DuringXuv);
        assert_eq!(t.classify(t.xuv_end + 0.5), TemporalRegime::DuringIr);
    }

    #[test]
    fn ir_before_xuv_is_rejected() {
        let xuv = XuvPulse::new(
            1.6, 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted, None);
        let ir = IrPulse::new(
            0.057, 2.0, 1e-6, Envelope::SinSq, 0.0, 0.0, None);
        assert!(matches!(
            Timing::new(&xuv, &ir),
            Err(RegimeError::PulseOrder { .. }),
        ));
    }

    #[test]
    fn machine_refuses_to_go_back() {
        let mut machine = RegimeMachine::new(timing(1000.0));
        assert_eq!(machine.advance(-100.0).unwrap(), TemporalRegime::BeforeXuv);
        assert_eq!(machine.advance(0.0).unwrap(), TemporalRegime::DuringXuv);
        assert_eq!(machine.advance(0.0).unwrap(), TemporalRegime::DuringXuv);
        assert!(matches!(
            machine.advance(-1.0),
            Err(RegimeError::TimeReversed { .. }),
        ));
        assert_eq!(machine.get_regime(), TemporalRegime::DuringXuv);
    }

    #[test]
    fn formula_table() {
        use Scan::*;
        let f = formula(TemporalRegime::BeforeXuv, Envelope::SinSq, Method::Analytic, Time);
        assert_eq!(f.xuv_upper(-1e3, &timing(1000.0)), None);
        let f = formula(TemporalRegime::AfterIr, Envelope::Gauss, Method::Analytic, Delay);
        assert_eq!(f.eval, PhaseEval::ErfSeries);
        assert_eq!(f.phase, PhaseRule::Frozen);
        assert_eq!(f.dressed, Some(SegmentRule::FourierSeries));
        let f = formula(TemporalRegime::BetweenPulses, Envelope::SinSq, Method::Romberg, Time);
        assert_eq!(f.eval, PhaseEval::Numeric(Method::Romberg));
        assert_eq!(f.undressed, SegmentRule::Numeric(Method::Romberg));
        assert_eq!(f.dressed, None);
        let tm = timing(1000.0);
        let f = formula(TemporalRegime::DuringXuv, Envelope::SinSq, Method::Analytic, Time);
        assert_eq!(f.xuv_upper(0.5, &tm), Some(0.5));
    }

    #[test]
    fn fourier_series_only_in_delay_scans() {
        for regime in [TemporalRegime::DuringXuv, TemporalRegime::DuringIr, TemporalRegime::AfterIr] {
            for shape in [Envelope::SinSq, Envelope::Gauss] {
                let f = formula(regime, shape, Method::Analytic, Scan::Time);
                assert_eq!(f.undressed, SegmentRule::Exponential);
                assert_eq!(f.dressed, Some(SegmentRule::Numeric(Method::Quadrature)));
                assert_ne!(f.eval, PhaseEval::Numeric(Method::Quadrature));
                let f = formula(regime, shape, Method::Analytic, Scan::Delay);
                assert_eq!(f.dressed, Some(SegmentRule::FourierSeries));
            }
        }
    }
}

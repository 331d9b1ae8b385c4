//! Collection of all error types.
//!
//! All errors derive [`thiserror::Error`], making them composable when allowed
//! and compatible with application code using [`anyhow`][anyhow].
//!
//! Only configuration problems and API misuse are reported as errors.
//! Numerical-quality problems (an invalid Franck-Condon overlap, a continuum
//! discretization that never settles, a quadrature error estimate above
//! tolerance) are carried as flags on the computed values and logged instead.
//!
//! [anyhow]: https://crates.io/crates/anyhow

use std::path::PathBuf;
use ndarray as nd;
use ndarray_linalg::error::LinalgError;
use thiserror::Error;

/// Returned when an operation requiring equal-length arrays encounters arrays
/// with unequal length.
#[derive(Debug, Error)]
#[error("encountered arrays with incompatible lengths; got {0} and {1}")]
pub struct LengthError(pub usize, pub usize);

impl LengthError {
    pub(crate) fn check<S, A, T, B>(
        a: &nd::ArrayBase<S, nd::Ix1>,
        b: &nd::ArrayBase<T, nd::Ix1>,
    ) -> Result<(), Self>
    where
        S: nd::Data<Elem = A>,
        T: nd::Data<Elem = B>,
    {
        let na = a.len();
        let nb = b.len();
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }

    pub(crate) fn check_len(na: usize, nb: usize) -> Result<(), Self> {
        (na == nb).then_some(()).ok_or(Self(na, nb))
    }
}

/// Returned from [`interp`][crate::interp] when a table holds too few points
/// for the requested interpolation order.
#[derive(Debug, Error)]
#[error("interpolation tables must hold at least {1} points; got {0}")]
pub struct TableSizeError(pub usize, pub usize);

impl TableSizeError {
    pub(crate) fn check(n: usize, min: usize) -> Result<(), Self> {
        (n >= min).then_some(()).ok_or(Self(n, min))
    }
}

/// Returned from functions in [`interp`][crate::interp].
#[derive(Debug, Error)]
pub enum InterpError {
    /// [`LengthError`]
    #[error("length error: {0}")]
    Length(#[from] LengthError),

    /// [`TableSizeError`]
    #[error("table size error: {0}")]
    TableSize(#[from] TableSizeError),

    /// Returned when tabulated coordinates are not strictly increasing.
    #[error("tabulated coordinates must be strictly increasing (at index {0})")]
    Unsorted(usize),
}

/// Returned from the integration routines in [`quad`][crate::quad].
#[derive(Debug, Error)]
pub enum QuadError {
    /// Returned when a non-positive tolerance is encountered.
    #[error("tolerances must be greater than 0; got {0}")]
    BadEpsilon(f64),

    /// Returned when a zero subdivision or level limit is encountered.
    #[error("subdivision limits must be greater than 0; got {0}")]
    BadLimit(usize),

    /// Returned when a closed-form evaluation is requested for the outer
    /// (field-weighted) time integral, which has no antiderivative.
    #[error("the outer time integral has no closed form; use quadrature or romberg")]
    NoClosedForm,
}

impl QuadError {
    pub(crate) fn check_epsilon(epsilon: f64) -> Result<(), Self> {
        (epsilon > 0.0).then_some(()).ok_or(Self::BadEpsilon(epsilon))
    }

    pub(crate) fn check_limit(limit: usize) -> Result<(), Self> {
        (limit != 0).then_some(()).ok_or(Self::BadLimit(limit))
    }
}

/// Returned from the [temporal regime machine][crate::regime].
#[derive(Debug, Error)]
pub enum RegimeError {
    /// Returned when the simulation clock is asked to move backwards.
    #[error("regime machine cannot move back in time: at t = {now}, asked for t = {requested}")]
    TimeReversed { now: f64, requested: f64 },

    /// Returned when the IR pulse would start before the XUV pulse.
    #[error("IR pulse starts at t = {ir_start} before the XUV pulse starts at t = {xuv_start}")]
    PulseOrder { ir_start: f64, xuv_start: f64 },
}

impl RegimeError {
    pub(crate) fn check_order(ir_start: f64, xuv_start: f64)
        -> Result<(), Self>
    {
        (ir_start >= xuv_start).then_some(())
            .ok_or(Self::PulseOrder { ir_start, xuv_start })
    }
}

/// Returned from the vibronic-structure routines in
/// [`vibronic`][crate::vibronic].
#[derive(Debug, Error)]
pub enum VibError {
    /// Returned when Morse parameters admit no bound state (λ ≤ 1/2) or are
    /// non-positive.
    #[error("Morse potential with De = {de}, α = {alpha}, μ = {mu} supports no bound states")]
    NoBoundStates { de: f64, alpha: f64, mu: f64 },

    /// Returned when the repulsive final curve lies above the highest photon
    /// energy, so no continuum pseudo-state is reachable.
    #[error("repulsive final state asymptote {b} lies above the maximum excitation energy {ex_max}")]
    Unreachable { b: f64, ex_max: f64 },

    /// Returned when the continuum discretization step is not positive.
    #[error("continuum step must be greater than 0; got {0}")]
    BadStep(f64),

    /// Returned when the repulsive final-state curve is not repulsive.
    #[error("repulsive coefficient must be greater than 0; got {0}")]
    BadCoefficient(f64),

    /// Returned when overlaps weighted by a tabulated Γ(R) are to be computed
    /// without the table.
    #[error("the external width model needs a Γ(R) table to compute overlaps")]
    NoGammaTable,

    /// Returned when partial Γ(R) treatment is requested without overlaps
    /// computed without the coupling function.
    #[error("partial Γ(R) treatment needs resonance-final overlaps without V(R)")]
    NoBareTable,

    /// [`LengthError`]
    #[error("table shape error: {0}")]
    Length(#[from] LengthError),

    /// [`QuadError`]
    #[error("integration error: {0}")]
    Quad(#[from] QuadError),
}

/// Returned from the [two-resonance][crate::coupled] diagonalization.
#[derive(Debug, Error)]
pub enum CoupledError {
    /// [`LinalgError`].
    #[error("linalg error: {0}")]
    Linalg(#[from] LinalgError),

    /// Returned when the squared coupling between the two resonances is
    /// negative or not finite.
    #[error("squared resonance coupling must be non-negative; got {0}")]
    BadInteraction(f64),

    /// Returned when a resonance width is not positive.
    #[error("resonance widths must be positive; got {0}")]
    BadWidth(f64),
}

/// Fatal configuration inconsistencies and input failures.
///
/// Every variant aborts a run before any amplitude is computed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when an input file cannot be read or an output file cannot be
    /// written.
    #[error("i/o error on {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Returned when the run file is not valid TOML for a
    /// [`RunConfig`][crate::config::RunConfig].
    #[error("malformed run file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Returned when a Franck-Condon table file is malformed.
    #[error("malformed Franck-Condon table: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when a Γ(R) table line cannot be parsed.
    #[error("malformed Γ(R) table at line {0}")]
    GammaTable(usize),

    /// A precomputed Franck-Condon table was supplied but not requested.
    #[error("a Franck-Condon table file was provided but not requested")]
    FcNotRequested,

    /// A precomputed Franck-Condon table was requested but not supplied.
    #[error("a Franck-Condon table file was requested but not provided")]
    FcNotProvided,

    /// A Γ(R) table was supplied while the width model is not `external`.
    #[error("a Γ(R) table was provided but the width model is {0:?}, not external")]
    GammaNotExternal(String),

    /// The `external` width model was selected with neither a Γ(R) table nor a
    /// precomputed Franck-Condon table.
    #[error("the external width model needs either a Γ(R) table or a Franck-Condon table")]
    ExternalWithoutSource,

    /// Both a Franck-Condon table and a Γ(R) table were supplied.
    #[error("provide either a Franck-Condon table or a Γ(R) table, not both")]
    BothSources,

    /// Partial Γ(R) treatment was requested with inconsistent table inputs.
    #[error("partial Γ(R) treatment: {0}")]
    Partial(String),

    /// Returned when a parameter is outside its physical domain.
    #[error("invalid value for {name}: {value}")]
    BadValue { name: &'static str, value: f64 },

    /// Returned when two sections of the run file select incompatible models.
    #[error("sections [{0}] and [{1}] cannot be combined")]
    Conflict(&'static str, &'static str),

    /// Returned when a key needed by the requested scan is missing.
    #[error("run file is missing the key {0}")]
    MissingKey(&'static str),

    /// [`RegimeError`]
    #[error("pulse timing: {0}")]
    Regime(#[from] RegimeError),

    /// [`VibError`]
    #[error("vibronic structure: {0}")]
    Vib(#[from] VibError),

    /// [`InterpError`]
    #[error("Γ(R) table: {0}")]
    Interp(#[from] InterpError),

    /// [`QuadError`]
    #[error("integration settings: {0}")]
    Quad(#[from] QuadError),

}

impl ConfigError {
    pub(crate) fn check_positive(name: &'static str, value: f64)
        -> Result<(), Self>
    {
        (value > 0.0).then_some(()).ok_or(Self::BadValue { name, value })
    }

    pub(crate) fn check_nonnegative(name: &'static str, value: f64)
        -> Result<(), Self>
    {
        (value >= 0.0).then_some(()).ok_or(Self::BadValue { name, value })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error)
        -> Self
    {
        Self::Io { path: path.into(), source }
    }
}

/// Returned from the run drivers in [`driver`][crate::driver].
#[derive(Debug, Error)]
pub enum EldestError {
    /// [`ConfigError`]
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// [`QuadError`]
    #[error("integration error: {0}")]
    Quad(#[from] QuadError),

    /// [`RegimeError`]
    #[error("regime error: {0}")]
    Regime(#[from] RegimeError),

    /// [`VibError`]
    #[error("vibronic error: {0}")]
    Vib(#[from] VibError),

    /// [`CoupledError`]
    #[error("coupled-resonance error: {0}")]
    Coupled(#[from] CoupledError),

    /// Returned when writing spectrum records fails.
    #[error("output error on {path:?}: {source}")]
    Output { path: PathBuf, source: std::io::Error },
}

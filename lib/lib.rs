#![allow(dead_code, non_snake_case)]

//! Provides time-resolved transition amplitudes for interatomic Coulombic
//! decay (ICD) and resonant ICD following XUV photoexcitation, optionally
//! streaked by a delayed IR pulse.
//!
//! The amplitude of finding the photoelectron at kinetic energy *E* and the
//! remaining system in a final state at observation time *t* is the sum of a
//! direct photoionization term and one resonant term per decaying resonance
//! pole. Both are nested time integrals over the XUV field, dressed by the
//! Volkov phase of the IR pulse where the two overlap. Every pair of
//! observation time and pulse timing selects one of a small set of closed
//! forms, which this crate evaluates either analytically or by quadrature.
//!
//! Supported electronic models:
//! - A single resonance decaying into a single final state
//! - Two coupled resonances (complex-pole selection from the quartic of the
//!   interacting pair)
//! - A single resonance with nuclear motion, where the ground, resonant, and
//!   final states carry Morse (or repulsive-wall) vibrational structure and
//!   the amplitude runs over Franck-Condon weighted pole sums
//!
//! The main entry points are [`config::RunConfig`] for reading a run file,
//! [`driver::Setup`] for reducing a run to decay channels, and
//! [`driver::time_scan`]/[`driver::delay_scan`] for producing spectra.
//!
//! See [`docs`] for theoretical background.

pub mod error;
pub mod units;
pub mod special;
pub mod quad;
pub mod interp;
pub mod utils;
pub mod pulse;
pub mod regime;
pub mod dressing;
pub mod vibronic;
pub mod amplitude;
pub mod coupled;
pub mod spectrum;
pub mod config;
pub mod driver;

pub mod docs;

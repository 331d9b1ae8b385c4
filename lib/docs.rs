//! Theoretical background.
//!
//! # Contents
//! - [Background](#background)
//! - [Units](#units)
//! - [Pulses](#pulses)
//! - [Transition amplitude](#transition-amplitude)
//! - [Temporal regimes](#temporal-regimes)
//! - [Streaking](#streaking)
//! - [Nuclear motion](#nuclear-motion)
//! - [Coupled resonances](#coupled-resonances)
//!
//! # Background
//! In interatomic Coulombic decay (ICD), an inner-valence vacancy created on
//! one site of a weakly bound system relaxes by transferring its energy to a
//! neighboring site, which then emits an electron. If the vacancy is created
//! by resonant excitation instead of ionization, the process is termed
//! resonant ICD (RICD). In both cases the system passes through a metastable
//! resonance state |*r*⟩ of energy *E*<sub>*r*</sub> and width Γ before
//! reaching a final state |*f*⟩ with an electron in the continuum at kinetic
//! energy *E*.
//!
//! Following Fano, the resonance couples to the ground state |0⟩ through the
//! XUV dipole *d*<sub>*r*</sub>, to the continuum through the configuration
//! interaction
//! ```text
//!        Γ
//! V² = ----
//!      2 π
//! ```
//! and the ground state couples to the continuum directly through
//! *d*<sub>*c*</sub>. The two pathways interfere; their ratio is fixed by the
//! Fano asymmetry parameter,
//! ```text
//!          d_r
//! q = ---------
//!      π V d_c
//! ```
//! so that only *d*<sub>*r*</sub> and *q* need to be given.
//!
//! # Units
//! All quantities inside the crate are in atomic units (*ħ* = *e* =
//! *m*<sub>*e*</sub> = 1). Run files are written in eV, seconds, W/cm², Å,
//! and amu; items in [`units`][crate::units] convert them once when a run is
//! validated. Results are written in eV and seconds again.
//!
//! # Pulses
//! The XUV pulse (carrier Ω, *n* cycles) is centered at *t* = 0. With a sin²
//! envelope it lasts *T* = 2π *n* / Ω and its field is the time derivative of
//! a sin²-windowed carrier on [-*T*/2, *T*/2]; with a Gaussian envelope its
//! standard deviation is
//! ```text
//!          π n
//! σ = -------------
//!     Ω √(ln 2)
//! ```
//! and its duration is taken as 5 σ.
//!
//! The IR pulse (carrier ω) is centered at the pump-probe delay Δ*t* and is
//! described by its vector potential
//! ```text
//! A(t) = A₀ s(t - Δt) cos(ω (t - Δt) + φ)
//! ```
//! where *s* is the sin² or Gaussian envelope and *A*₀ = √*I* / ω.
//!
//! # Transition amplitude
//! In first-order perturbation theory with respect to the XUV field *F* and
//! in the limit where the resonance decays into a single channel, the
//! amplitude of finding the electron at kinetic energy *E* and the system in
//! the final state (total final energy ε = *E* + *E*<sub>fin</sub>) at time
//! *t* is
//! ```text
//!               t
//! J(E, t) = i d_c ∫ dt₁ F(t₁) D(t₁, t) exp(-i ε (t - t₁))
//!              -∞
//!
//!                   t        t
//!         + V w_r  ∫ dt₁    ∫ dt₂ F(t₁) exp(-i ℰ (t₂ - t₁)) D(t₂, t) exp(-i ε (t - t₂))
//!                  -∞       t₁
//! ```
//! with the complex pole ℰ = *E*<sub>*r*</sub> − *i* Γ/2 and the resonant
//! weight *w*<sub>*r*</sub> = *d*<sub>*r*</sub> − *i* π *V*
//! *d*<sub>*c*</sub>, which collects the resonant and the indirect
//! (interference) pathways. The factor *D* is the IR dressing below; without
//! an IR pulse *D* = 1 and the inner integral is a plain exponential,
//! ```text
//!  b                            exp(κ (b - t₁)) - 1
//!  ∫ dt₂ exp(κ (t₂ - t₁))  =  -------------------- ,   κ = i (ε - ℰ)
//!  a                                    κ
//! ```
//! The outer integral over the XUV field has no closed form in general and is
//! always evaluated by quadrature.
//!
//! Several resonances decaying into the same channel add coherently; different
//! channels are distinguishable and add incoherently, each weighted by its
//! density of states:
//! ```text
//! I(E, t) = Σ_μ ρ_μ |J_μ,direct + Σ_λ J_λμ|²
//! ```
//!
//! # Temporal regimes
//! The integration bounds depend on where *t* falls with respect to the two
//! pulses:
//! ```text
//!     before XUV    during XUV     between     during IR     after IR
//! ---------------|=============|------------|=============|--------------> t
//!             -T_X/2         T_X/2    Δt - T_L/2     Δt + T_L/2
//! ```
//! Before the XUV pulse nothing has happened and *J* = 0. During it, the outer
//! integral runs up to *t*; afterward it stops at *T*<sub>X</sub>/2. The inner
//! integral is split at the IR pulse edges: its part before the IR pulse is
//! undressed, its part during the IR pulse carries the running phase, and its
//! part after the IR pulse carries the frozen phase accumulated over the whole
//! pulse. Each (regime, IR envelope, integration mode) triple therefore maps to
//! one [`Formula`][crate::regime::Formula]; the observation time only ever
//! moves forward through the regimes.
//!
//! # Streaking
//! An electron emitted at *t*′ with momentum *p* = √(2 *E*) accumulates the
//! Volkov phase
//! ```text
//!             t
//! Φ(t', t) =  ∫ dτ (p A(τ) + A(τ)²/2)
//!             t'
//! ```
//! in the IR field, so that
//! ```text
//! D(t', t) = exp(-i [Φ(c(t)) - Φ(c(t'))])
//! ```
//! where *c* clamps its argument to the IR support. For a sin² envelope, Φ is a
//! finite sum of cosines; for a Gaussian envelope it is a combination of error
//! functions of complex argument. Both are available in closed form, or Φ can
//! be integrated numerically.
//!
//! When the spectrum is needed only after both pulses but for many delays,
//! the dressed inner integral
//! ```text
//!  b
//!  ∫ dτ exp(κ τ) exp(i Φ(τ))
//!  a
//! ```
//! is evaluated by sampling exp(*i* Φ) once per kinetic energy on a grid
//! relative to the IR pulse start, taking its FFT, dropping components with
//! negligible power, and integrating the remaining Fourier terms against the
//! exponential in closed form. The sampled kernel does not depend on Δ*t*, so
//! one cache serves the whole delay scan.
//!
//! # Nuclear motion
//! With nuclear motion, the ground, resonance, and final electronic states each
//! carry vibrational levels. Bound curves are Morse potentials
//! ```text
//! V(R) = D_e (1 - exp(-α (R - R_eq)))²
//! ```
//! with levels
//! ```text
//!             2 D_e                 α²
//! E_n = α √(-----) (n + ½)  -  ---- (n + ½)²
//!               μ                  2 μ
//! ```
//! for *n* ≤ ⌊λ − ½⌋, λ = √(2 μ *D*<sub>e</sub>) / α, and wavefunctions given
//! by generalized Laguerre polynomials. A repulsive final curve *V*(*R*) =
//! *a*/*R* + *b* has no bound levels; its continuum is discretized into
//! energy-normalized pseudo-states, each the Airy function of the potential
//! linearized about a classical turning point *R*<sub>μ</sub>. Each pseudo-state
//! carries the density-of-states weight
//! ```text
//!        ΔR E_μ²
//! ρ_μ = --------
//!           a
//! ```
//! and the turning point is stepped outward until three consecutive
//! pseudo-states overlap negligibly with every ground and resonance level.
//!
//! Franck-Condon overlaps ⟨λ|κ⟩, ⟨μ|λ⟩, and ⟨μ|κ⟩ are integrated by quadrature.
//! The resonance-final overlaps may be weighted by an *R*-dependent coupling
//! *V*(*R*) (∝ *R*⁻³, or √(Γ(*R*)/2π) from a tabulated width). Each resonance
//! level λ then decays with width
//! ```text
//! W_λ = Σ_μ V² |⟨μ|λ⟩|² ρ_μ
//! ```
//! and contributes a pole at *E*<sub>*r*</sub> + *E*<sub>λ</sub> − *i* π
//! *W*<sub>λ</sub> to every final channel μ it can energetically reach.
//!
//! # Coupled resonances
//! Two resonances *a* and *b* that interact through a real coupling *w* are
//! first diagonalized,
//! ```text
//!     ⎛ E_a  w  ⎞
//! H = ⎜         ⎟  →  E₋, E₊
//!     ⎝  w  E_b ⎠
//! ```
//! giving ± combinations whose couplings to the continuum mix those of *a* and
//! *b*. Eliminating the continuum then leaves a quartic in the complex energy
//! whose four roots come in two pairs; in each pair one root decays and one
//! grows. The decaying root of each pair (negative imaginary part) becomes a
//! pole of the resonant amplitude. If the two roots of a pair cannot be told
//! apart, the first is kept with zero weight and the selection is flagged.

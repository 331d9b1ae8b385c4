//! Two resonances coupled to each other and to a common final continuum.
//!
//! The resonances *a* and *b*, with energies *E*_a, *E*_b and couplings to the
//! continuum *V*_a, *V*_b, interact through a real matrix element *w*. The 2×2
//! Hamiltonian
//! ```text
//! H = [ E_a  w   ]
//!     [ w    E_b ]
//! ```
//! is diagonalized into ± combinations with energies *E*₋ < *E*₊, continuum
//! couplings *V*± and dipoles *d*±. The resonant amplitude then has four
//! candidate poles, the roots of a quartic in the complex energy *E*:
//! ```text
//! E₁,₂ = (E₊ + E₋)/2 + iπ(V₊² + V₋²)/2 ∓ r/2
//! E₃,₄ = (E₊ + E₋)/2 - iπ(V₊² + V₋²)/2 ∓ r/2
//!
//! r² = (Δ + iπV₊²)² - 2π(iΔ + πV₊²)V₋² - π²V₋⁴,   Δ = E₊ - E₋
//! ```
//! Only roots with negative imaginary part describe decaying states. One root
//! is taken from each of the pairs (*E*₃, *E*₁) and (*E*₂, *E*₄): the first of
//! the pair with Im *E* < 0. If neither qualifies, the first root of the pair
//! is kept with zero weight and the selection is flagged as degenerate.

use std::f64::consts::PI;
use ndarray as nd;
use ndarray_linalg::{ self as la, EighInto };
use num_complex::Complex64 as C64;
use crate::{
    amplitude::{ Channel, Couplings, Pole },
    error::CoupledError,
    units::hartree_to_ev,
};

pub type CoupledResult<T> = Result<T, CoupledError>;

/// Parameters of the two uncoupled resonances, in atomic units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoupledParams {
    pub e_a: f64,
    pub e_b: f64,
    /// Decay width Γ_a = 1/τ_a.
    pub gamma_a: f64,
    /// Decay width Γ_b = 1/τ_b.
    pub gamma_b: f64,
    /// Squared interaction matrix element *w*².
    pub interact: f64,
    /// Ground → resonance dipole, shared by both resonances.
    pub rdg: f64,
    /// Fano asymmetry parameter, referred to resonance *a*.
    pub q: f64,
}

/// One diagonalized combination of the two resonances.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mode {
    /// Eigenvalue of the coupled Hamiltonian.
    pub energy: f64,
    /// Eigenvector components on (*a*, *b*).
    pub mix: [f64; 2],
    /// Coupling to the continuum, `V_a A_a + V_b A_b`.
    pub v: f64,
    /// Ground-state dipole, `(A_a + A_b) rdg`.
    pub dg: f64,
}

/// Diagonalize the coupled Hamiltonian, returning the (-, +) modes.
///
/// Eigenvector signs are fixed so that each mode's continuum coupling is
/// non-negative.
pub fn diagonalize(params: &CoupledParams) -> CoupledResult<(Mode, Mode)> {
    let CoupledParams { e_a, e_b, gamma_a, gamma_b, interact, rdg, .. } = *params;
    if !interact.is_finite() || interact < 0.0 {
        return Err(CoupledError::BadInteraction(interact));
    }
    for gamma in [gamma_a, gamma_b] {
        (gamma > 0.0).then_some(()).ok_or(CoupledError::BadWidth(gamma))?;
    }
    let v_a = (gamma_a / (2.0 * PI)).sqrt();
    let v_b = (gamma_b / (2.0 * PI)).sqrt();
    let w = interact.sqrt();
    let H: nd::Array2<f64> = nd::array![[e_a, w], [w, e_b]];
    let (E, V): (nd::Array1<f64>, nd::Array2<f64>)
        = H.eigh_into(la::UPLO::Lower)?;
    let mode = |k: usize| -> Mode {
        let (mut aa, mut ab) = (V[[0, k]], V[[1, k]]);
        if v_a * aa + v_b * ab < 0.0 {
            aa = -aa;
            ab = -ab;
        }
        Mode {
            energy: E[k],
            mix: [aa, ab],
            v: v_a * aa + v_b * ab,
            dg: (aa + ab) * rdg,
        }
    };
    Ok((mode(0), mode(1)))
}

/// The four candidate poles of the coupled system.
pub fn quartic_roots(minus: &Mode, plus: &Mode) -> [C64; 4] {
    let i = C64::i();
    let delta = plus.energy - minus.energy;
    let vp2 = plus.v.powi(2);
    let vm2 = minus.v.powi(2);
    let root
        = ((delta + i * PI * vp2).powi(2)
            - 2.0 * PI * (i * delta + PI * vp2) * vm2
            - PI * PI * vm2 * vm2)
        .sqrt();
    let center = C64::from((plus.energy + minus.energy) / 2.0);
    let half_width = i * PI * (vp2 + vm2) / 2.0;
    [
        center + half_width - root / 2.0,
        center + half_width + root / 2.0,
        center - half_width - root / 2.0,
        center - half_width + root / 2.0,
    ]
}

// partial-fraction weight of the k-th root
fn root_weight(k: usize, roots: &[C64; 4], minus: &Mode, plus: &Mode, cdg: f64)
    -> C64
{
    let e = roots[k];
    let (vp, vm) = (plus.v, minus.v);
    let (dp, dm) = (plus.dg, minus.dg);
    let ep = e - plus.energy;
    let em = e - minus.energy;
    let numer
        = vp.powi(3) * em * em * dp
        + vp * vp * vm * ep * em * dm
        + PI * vp.powi(3) * ep * em * em * cdg
        + vp * vm * vm * ep * em * dp
        + vm.powi(3) * ep * ep * dm
        + PI * vm.powi(3) * ep * ep * em * cdg;
    let denom: C64
        = roots.iter().enumerate()
        .filter(|(j, _)| *j != k)
        .map(|(_, ej)| e - ej)
        .product();
    -numer * 2.0 * PI * C64::i() / denom
}

/// The pole chosen from one pair of roots.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selection {
    /// Index of the chosen root in `[E₁, E₂, E₃, E₄]`.
    pub index: usize,
    pub pole: Pole,
    /// `true` if neither root of the pair decays and the weight was zeroed.
    pub degenerate: bool,
    /// `true` if the weight was not finite and was zeroed.
    pub singular: bool,
}

impl Selection {
    /// Return `true` if the pole contributes to the amplitude as computed.
    pub fn is_clean(&self) -> bool { !self.degenerate && !self.singular }
}

fn select(pair: (usize, usize), roots: &[C64; 4], weights: &[C64; 4])
    -> Selection
{
    let (first, second) = pair;
    let (index, degenerate)
        = if roots[first].im < 0.0 {
            (first, false)
        } else if roots[second].im < 0.0 {
            (second, false)
        } else {
            (first, true)
        };
    let w = weights[index];
    let singular = !(w.re.is_finite() && w.im.is_finite());
    let weight = if degenerate || singular { C64::new(0.0, 0.0) } else { w };
    Selection {
        index,
        pole: Pole { energy: roots[index], weight },
        degenerate,
        singular,
    }
}

/// Two coupled resonances reduced to their two physical poles.
#[derive(Clone, Debug, PartialEq)]
pub struct CoupledResonances {
    minus: Mode,
    plus: Mode,
    couplings: Couplings,
    roots: [C64; 4],
    weights: [C64; 4],
    selected: [Selection; 2],
}

impl CoupledResonances {
    /// Diagonalize, find the quartic roots and their weights, and select the
    /// decaying poles.
    pub fn new(params: &CoupledParams) -> CoupledResult<Self> {
        let (minus, plus) = diagonalize(params)?;
        let couplings = Couplings::new(params.rdg, params.q, params.gamma_a);
        let cdg = couplings.cdg();
        let roots = quartic_roots(&minus, &plus);
        let weights: [C64; 4]
            = std::array::from_fn(|k| root_weight(k, &roots, &minus, &plus, cdg));
        let selected = [
            select((2, 0), &roots, &weights),
            select((1, 3), &roots, &weights),
        ];
        let new = Self { minus, plus, couplings, roots, weights, selected };
        new.log_summary();
        Ok(new)
    }

    fn log_summary(&self) {
        log::info!(
            "coupled: E- = {:.6} eV, E+ = {:.6} eV",
            hartree_to_ev(self.minus.energy), hartree_to_ev(self.plus.energy),
        );
        log::info!(
            "coupled: Γ- = {:.6e} eV, Γ+ = {:.6e} eV",
            hartree_to_ev(2.0 * PI * self.minus.v.powi(2)),
            hartree_to_ev(2.0 * PI * self.plus.v.powi(2)),
        );
        for (k, e) in self.roots.iter().enumerate() {
            log::info!(
                "coupled: E{} = {:.6} {:+.6e}i eV",
                k + 1, hartree_to_ev(e.re), hartree_to_ev(e.im),
            );
        }
        for sel in self.selected.iter() {
            log::info!("coupled: pole of E{}", sel.index + 1);
            if sel.degenerate {
                log::warn!(
                    "coupled: no decaying root in the pair of E{}; \
                    its contribution is dropped",
                    sel.index + 1,
                );
            }
            if sel.singular {
                log::warn!(
                    "coupled: weight of E{} is not finite; \
                    its contribution is dropped",
                    sel.index + 1,
                );
            }
        }
    }

    pub fn get_minus(&self) -> &Mode { &self.minus }

    pub fn get_plus(&self) -> &Mode { &self.plus }

    pub fn get_couplings(&self) -> &Couplings { &self.couplings }

    /// All four roots `[E₁, E₂, E₃, E₄]`.
    pub fn get_roots(&self) -> &[C64; 4] { &self.roots }

    /// Partial-fraction weights of all four roots.
    pub fn get_weights(&self) -> &[C64; 4] { &self.weights }

    pub fn get_selected(&self) -> &[Selection; 2] { &self.selected }

    /// The single final channel fed by the two selected poles.
    pub fn channel(&self, e_fin: f64) -> Channel {
        Channel {
            e_fin,
            direct_weight: C64::i() * self.couplings.cdg(),
            poles: self.selected.iter().map(|sel| sel.pole).collect(),
            dos: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{ ev_to_hartree, second_to_atu };

    fn params(interact_ev: f64) -> CoupledParams {
        CoupledParams {
            e_a: ev_to_hartree(44.0),
            e_b: ev_to_hartree(44.5),
            gamma_a: 1.0 / second_to_atu(2e-15),
            gamma_b: 1.0 / second_to_atu(5e-15),
            interact: ev_to_hartree(interact_ev),
            rdg: 1.0,
            q: 5.0,
        }
    }

    #[test]
    fn diagonalization_preserves_trace_and_signs() {
        let p = params(0.01);
        let (minus, plus) = diagonalize(&p).unwrap();
        assert!(minus.energy < plus.energy);
        assert!((minus.energy + plus.energy - p.e_a - p.e_b).abs() < 1e-12);
        let det = p.e_a * p.e_b - p.interact;
        assert!((minus.energy * plus.energy - det).abs() < 1e-10);
        assert!(minus.v >= 0.0 && plus.v >= 0.0);
        let dot = minus.mix[0] * plus.mix[0] + minus.mix[1] * plus.mix[1];
        assert!(dot.abs() < 1e-12);
    }

    #[test]
    fn roots_satisfy_vieta_pairs() {
        let (minus, plus) = diagonalize(&params(0.01)).unwrap();
        let r = quartic_roots(&minus, &plus);
        let center = plus.energy + minus.energy;
        assert!(((r[0] + r[1]) - (r[2] + r[3]).conj()).norm() < 1e-12);
        assert!(((r[0] + r[1] + r[2] + r[3]).re - 2.0 * center).abs() < 1e-12);
    }

    #[test]
    fn selects_the_decaying_roots() {
        let cr = CoupledResonances::new(&params(0.01)).unwrap();
        let [s1, s2] = *cr.get_selected();
        assert_eq!((s1.index, s2.index), (2, 3));
        assert!(s1.is_clean() && s2.is_clean());
        assert!(s1.pole.energy.im < 0.0 && s2.pole.energy.im < 0.0);
        let ch = cr.channel(0.0);
        assert_eq!(ch.poles.len(), 2);
    }

    #[test]
    fn tie_keeps_first_root_with_zero_weight() {
        let roots = [
            C64::new(1.0, 0.0), C64::new(2.0, 0.0),
            C64::new(1.0, 0.0), C64::new(2.0, 0.0),
        ];
        let weights = [C64::new(1.0, 1.0); 4];
        let sel = select((2, 0), &roots, &weights);
        assert_eq!(sel.index, 2);
        assert!(sel.degenerate);
        assert_eq!(sel.pole.weight, C64::new(0.0, 0.0));
    }

    #[test]
    fn negative_interaction_is_rejected() {
        assert!(matches!(
            diagonalize(&params(-0.1)),
            Err(CoupledError::BadInteraction(_)),
        ));
    }
}

#![allow(non_upper_case_globals)]

//! Conversion to and from atomic units (ħ = e = mₑ = 1), in which every
//! quantity inside the core is expressed.
//!
//! Concrete physical constants are taken from NIST (CODATA 2018).

/// Hartree energy (eV)
pub const Eh_eV: f64 = 27.211386245988;
//                 +/- 0.000000000053

/// atomic unit of time (s)
pub const t_au_s: f64 = 2.4188843265857e-17;
//                  +/- 0.0000000000047e-17

/// Bohr radius (Å)
pub const a0_AA: f64 = 0.529177210903;
//                 +/- 0.000000000080

/// unified atomic mass unit in electron masses
pub const u_me: f64 = 1822.888486209;
//                +/- 0.000000053

/// atomic unit of intensity (W cm^-2), i.e. the cycle-averaged intensity of a
/// field with amplitude one atomic unit of field strength
pub const I_au_Wcm2: f64 = 3.509_445_1e16;

/// Convert an energy from electronvolts to hartree.
pub fn ev_to_hartree(e: f64) -> f64 { e / Eh_eV }

/// Convert an energy from hartree to electronvolts.
pub fn hartree_to_ev(e: f64) -> f64 { e * Eh_eV }

/// Convert a time from seconds to atomic units.
pub fn second_to_atu(t: f64) -> f64 { t / t_au_s }

/// Convert a time from atomic units to seconds.
pub fn atu_to_second(t: f64) -> f64 { t * t_au_s }

/// Convert an intensity from W/cm² to atomic units.
pub fn wcm2_to_aiu(i: f64) -> f64 { i / I_au_Wcm2 }

/// Convert a length from ångström to bohr.
pub fn angstrom_to_bohr(r: f64) -> f64 { r / a0_AA }

/// Convert a length from bohr to ångström.
pub fn bohr_to_angstrom(r: f64) -> f64 { r * a0_AA }

/// Convert a mass from unified atomic mass units to electron masses.
pub fn amu_to_au(m: f64) -> f64 { m * u_me }

/// Reduced mass in atomic units of two nuclei given in unified atomic mass
/// units.
///
/// ```
/// use eldest::units::{ red_mass_au, u_me };
///
/// let mu = red_mass_au(20.0, 20.0);
/// assert!((mu - 10.0 * u_me).abs() < 1e-9);
/// ```
pub fn red_mass_au(m1: f64, m2: f64) -> f64 {
    amu_to_au(m1 * m2 / (m1 + m2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_are_identities() {
        assert!((hartree_to_ev(ev_to_hartree(44.0)) - 44.0).abs() < 1e-12);
        assert!((atu_to_second(second_to_atu(2e-15)) - 2e-15).abs() < 1e-27);
        assert!((bohr_to_angstrom(angstrom_to_bohr(1.5)) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn one_femtosecond_is_about_41_atu() {
        assert!((second_to_atu(1e-15) - 41.341).abs() < 1e-3);
    }
}

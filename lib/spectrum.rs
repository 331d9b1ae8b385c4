//! Collection and output of photoelectron spectra.
//!
//! One [`Spectrum`] holds |*J*|² over the kinetic-energy grid for a single
//! observation time (or pump-probe delay). A [`SpectrumWriter`] appends each
//! spectrum to a consolidated file as lines of
//! ```text
//! E_kin[eV]  t[s]  |J|²
//! ```
//! and, optionally, to one file per time step named after the time in
//! picoseconds (`0.01234567.dat`, or `m0.01234567.dat` for negative times).

use std::{
    fs::{ self, File },
    io::{ BufWriter, Write },
    path::{ Path, PathBuf },
};
use ndarray as nd;
use crate::{
    error::EldestError,
    units::{ atu_to_second, hartree_to_ev },
    utils::trapz,
};

pub type SpecResult<T> = Result<T, EldestError>;

/// |*J*|² over the kinetic-energy grid at one time.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    t: f64,
    e_kin: Vec<f64>,
    intensity: Vec<f64>,
}

impl Spectrum {
    /// Create a new, empty spectrum for time `t` (atomic units).
    pub fn new(t: f64) -> Self {
        Self { t, e_kin: Vec::new(), intensity: Vec::new() }
    }

    /// Append one sample (atomic units).
    pub fn push(&mut self, e_kin: f64, intensity: f64) {
        self.e_kin.push(e_kin);
        self.intensity.push(intensity);
    }

    pub fn get_t(&self) -> f64 { self.t }

    pub fn get_e_kin(&self) -> &[f64] { &self.e_kin }

    pub fn get_intensity(&self) -> &[f64] { &self.intensity }

    pub fn len(&self) -> usize { self.e_kin.len() }

    pub fn is_empty(&self) -> bool { self.e_kin.is_empty() }

    /// Indices of strict local maxima of |*J*|²; end points never qualify.
    ///
    /// ```
    /// use eldest::spectrum::Spectrum;
    ///
    /// let mut spec = Spectrum::new(0.0);
    /// for (e, y) in [1.0, 3.0, 2.0, 2.0, 5.0, 4.0].iter().enumerate() {
    ///     spec.push(e as f64, *y);
    /// }
    /// assert_eq!(spec.local_maxima(), vec![1, 4]);
    /// ```
    pub fn local_maxima(&self) -> Vec<usize> {
        self.intensity.windows(3)
            .enumerate()
            .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
            .map(|(k, _)| k + 1)
            .collect()
    }

    /// Total yield `∫ |J|² dE` by the trapezoidal rule, assuming an evenly
    /// spaced grid.
    pub fn total_yield(&self) -> f64 {
        if self.len() < 2 { return 0.0; }
        let de = self.e_kin[1] - self.e_kin[0];
        let y: nd::ArrayView1<f64> = nd::ArrayView1::from(&self.intensity);
        trapz(&y, de)
    }

    /// Log the positions of local maxima.
    pub fn log_maxima(&self) {
        for k in self.local_maxima() {
            log::info!(
                "maximum at E_kin = {:.6} eV: {:.6e}",
                hartree_to_ev(self.e_kin[k]), self.intensity[k],
            );
        }
    }

    /// Write one line per sample in conventional units.
    pub fn write_records<W>(&self, out: &mut W) -> std::io::Result<()>
    where W: Write
    {
        let t_s = atu_to_second(self.t);
        for (e, y) in self.e_kin.iter().zip(&self.intensity) {
            writeln!(out, "{:.10e}   {:.10e}   {:.10e}", hartree_to_ev(*e), t_s, y)?;
        }
        Ok(())
    }
}

/// Name of the per-step file for time `t` (atomic units).
///
/// ```
/// use eldest::{ spectrum::step_file_name, units::second_to_atu };
///
/// assert_eq!(step_file_name(second_to_atu(1.5e-15)), "0.00150000.dat");
/// assert_eq!(step_file_name(second_to_atu(-2e-14)), "m0.02000000.dat");
/// ```
pub fn step_file_name(t: f64) -> String {
    let t_ps = atu_to_second(t) * 1e12;
    if t_ps < 0.0 {
        format!("m{:.8}.dat", t_ps.abs())
    } else {
        format!("{:.8}.dat", t_ps)
    }
}

/// Writes spectra to a consolidated file and, optionally, per-step files.
#[derive(Debug)]
pub struct SpectrumWriter {
    dir: PathBuf,
    path: PathBuf,
    out: BufWriter<File>,
    per_step: bool,
    steps: usize,
}

impl SpectrumWriter {
    /// Create the output directory if needed and open `dir/name` for the
    /// consolidated records.
    pub fn new<P>(dir: P, name: &str, per_step: bool) -> SpecResult<Self>
    where P: AsRef<Path>
    {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|source| EldestError::Output { path: dir.clone(), source })?;
        let path = dir.join(name);
        let file
            = File::create(&path)
            .map_err(|source| EldestError::Output { path: path.clone(), source })?;
        Ok(Self { dir, path, out: BufWriter::new(file), per_step, steps: 0 })
    }

    pub fn get_path(&self) -> &Path { &self.path }

    /// Number of spectra written so far.
    pub fn steps(&self) -> usize { self.steps }

    /// Append one spectrum, followed by a blank line.
    pub fn write(&mut self, spec: &Spectrum) -> SpecResult<()> {
        let err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| EldestError::Output { path, source }
        };
        spec.write_records(&mut self.out)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush())
            .map_err(err(&self.path))?;
        if self.per_step {
            let step_path = self.dir.join(step_file_name(spec.get_t()));
            File::create(&step_path)
                .map(BufWriter::new)
                .and_then(|mut f| {
                    spec.write_records(&mut f)?;
                    f.flush()
                })
                .map_err(err(&step_path))?;
        }
        self.steps += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plateau_is_not_a_maximum() {
        let mut spec = Spectrum::new(0.0);
        for (e, y) in [0.0, 1.0, 1.0, 0.0, 2.0].iter().enumerate() {
            spec.push(e as f64, *y);
        }
        assert!(spec.local_maxima().is_empty());
    }

    #[test]
    fn trapezoid_yield() {
        let mut spec = Spectrum::new(0.0);
        for k in 0..=10 {
            let e = 0.1 * k as f64;
            spec.push(e, 2.0 * e);
        }
        assert!((spec.total_yield() - 1.0).abs() < 1e-12);
    }
}

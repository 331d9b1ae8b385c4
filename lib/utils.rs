//! Miscellaneous tools.

use ndarray::{ self as nd, Ix1, concatenate };
use ndarray_linalg::Scalar;
use rustfft as fft;
use num_complex::Complex64 as C64;

/// Integrate using the trapezoidal rule.
///
/// Returns zero if `y` has fewer than 2 points.
pub fn trapz<S, A>(y: &nd::ArrayBase<S, Ix1>, dx: A) -> A
where
    S: nd::Data<Elem = A>,
    A: Scalar,
{
    let n: usize = y.len();
    if n < 2 { return A::zero(); }
    let two = A::one() + A::one();
    (dx / two) * (y[0] + two * y.slice(nd::s![1..n - 1]).sum() + y[n - 1])
}

/// Generate an evenly spaced grid `start, start + step, ...` that does not
/// pass `stop` (within a small fraction of `step`).
///
/// Returns only `start` if `step` is not positive or `stop < start`.
pub fn arange(start: f64, stop: f64, step: f64) -> nd::Array1<f64> {
    if step <= 0.0 || stop < start { return nd::array![start]; }
    let n: usize = ((stop - start) / step + 1e-9).floor() as usize + 1;
    (0..n).map(|k| start + k as f64 * step).collect()
}

/// Generate an array of frequency-space coordinates to accompany a FFT of `n`
/// points for sampling time `dt`.
pub fn fft_freq(n: usize, dt: f64) -> nd::Array1<f64> {
    let np: usize = (n + 1) / 2;
    let fp: nd::Array1<f64>
        = (0..np)
        .map(|k| k as f64 / (n as f64 * dt))
        .collect();
    let fm: nd::Array1<f64>
        = (1..n - np + 1).rev()
        .map(|k| -(k as f64) / (n as f64 * dt))
        .collect();
    concatenate!(nd::Axis(0), fp, fm)
}

/// Perform the one-dimensional, complex-valued FFT.
pub fn fft<S>(x: &nd::ArrayBase<S, Ix1>) -> nd::Array1<C64>
where S: nd::Data<Elem = C64>
{
    let mut buf: Vec<C64> = x.iter().copied().collect();
    let mut plan = fft::FftPlanner::new();
    let fft_plan = plan.plan_fft_forward(buf.len());
    fft_plan.process(&mut buf);
    nd::Array1::from(buf)
}

/// Perform the one-dimensional, complex-valued FFT and return the result along
/// with the accompanying array of [frequency-space coordinates][fft_freq].
pub fn do_fft<S>(x: &nd::ArrayBase<S, Ix1>, dt: f64)
    -> (nd::Array1<C64>, nd::Array1<f64>)
where S: nd::Data<Elem = C64>
{
    let n: usize = x.len();
    (fft(x), fft_freq(n, dt))
}

/// Return a copy of `x` with indices shifted to map super-Nyquist frequency
/// components to negative frequencies.
pub fn fft_shift<S, A>(x: &nd::ArrayBase<S, Ix1>) -> nd::Array1<A>
where
    S: nd::Data<Elem = A>,
    A: Clone,
{
    let n = x.len();
    let (p, m) = x.view().split_at(nd::Axis(0), (n + 1) / 2);
    concatenate!(nd::Axis(0), m.into_owned(), p.into_owned())
}

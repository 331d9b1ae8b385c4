//! Evaluation of tabulated functions via local Lagrange interpolation.
//!
//! Used to carry an externally supplied R-dependence of the resonance decay
//! width, Γ(*R*), into the Franck-Condon integrals.
//!
//! ```
//! use ndarray as nd;
//! use eldest::interp::Table;
//!
//! let x: nd::Array1<f64> = nd::Array::linspace(1.0, 5.0, 41);
//! let y = x.mapv(|xk| xk.powi(-6));
//! let table = Table::new(x, y, 3).unwrap();
//! assert!((table.eval(2.05) - 2.05_f64.powi(-6)).abs() < 5e-5);
//! ```

use ndarray as nd;
use num_traits::Num;
use crate::error::*;

pub type InterpResult<T> = Result<T, InterpError>;

/// Default polynomial order of [`Table`] interpolation.
pub const DEF_ORDER: usize = 3;

/// Compute the value of a sampled function via a Lagrange polynomial through
/// all given points.
pub fn lagrange<S, T, A>(
    data_x: &nd::ArrayBase<S, nd::Ix1>,
    data_y: &nd::ArrayBase<T, nd::Ix1>,
    x: A,
) -> InterpResult<A>
where
    S: nd::Data<Elem = A>,
    T: nd::Data<Elem = A>,
    A: Num + Copy
{
    LengthError::check(data_x, data_y)?;
    let res: A
        = data_x.iter().zip(data_y).enumerate()
        .map(|(j, (xj, yj))| {
            let xj = *xj;
            let inner
                = data_x.iter().enumerate()
                .filter(|(m, _)| *m != j)
                .map(|(_, xm)| (x - *xm) / (xj - *xm))
                .fold(A::one(), A::mul);
            *yj * inner
        })
        .fold(A::zero(), A::add);
    Ok(res)
}

/// A function sampled on a strictly increasing grid, evaluated between samples
/// by a Lagrange polynomial through the `order + 1` nearest points.
///
/// Outside the grid the polynomial of the outermost window is used.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    x: nd::Array1<f64>,
    y: nd::Array1<f64>,
    order: usize,
}

impl Table {
    /// Create a new table, checking that the coordinates are strictly
    /// increasing and that there are enough points for the polynomial order.
    pub fn new(x: nd::Array1<f64>, y: nd::Array1<f64>, order: usize)
        -> InterpResult<Self>
    {
        LengthError::check(&x, &y)?;
        TableSizeError::check(x.len(), order + 1)?;
        if let Some(k)
            = x.iter().zip(x.iter().skip(1))
            .position(|(xk, xkp1)| xkp1 <= xk)
        {
            return Err(InterpError::Unsorted(k + 1));
        }
        Ok(Self { x, y, order })
    }

    /// Return the tabulated coordinates.
    pub fn get_x(&self) -> nd::ArrayView1<f64> { self.x.view() }

    /// Return the tabulated values.
    pub fn get_y(&self) -> nd::ArrayView1<f64> { self.y.view() }

    /// Return the interpolation order.
    pub fn get_order(&self) -> usize { self.order }

    /// Evaluate the interpolant at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        let w = self.order + 1;
        let k = self.x.as_slice()
            .map(|xs| xs.partition_point(|xk| *xk < x))
            .unwrap_or_else(|| self.x.iter().take_while(|xk| **xk < x).count());
        let il = k.saturating_sub(w / 2).min(n - w);
        // lengths are equal by construction
        lagrange(
            &self.x.slice(nd::s![il..il + w]),
            &self.y.slice(nd::s![il..il + w]),
            x,
        ).unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproduces_polynomials_of_its_order() {
        let x: nd::Array1<f64> = nd::Array::linspace(0.0, 3.0, 7);
        let y = x.mapv(|xk| 2.0 * xk.powi(3) - xk + 0.5);
        let table = Table::new(x, y, 3).unwrap();
        for xi in [0.1, 1.3, 2.75, 3.2] {
            let exact = 2.0 * xi * xi * xi - xi + 0.5;
            assert!((table.eval(xi) - exact).abs() < 1e-10);
        }
    }

    #[test]
    fn rejects_bad_tables() {
        let x = nd::array![0.0, 1.0, 1.0, 2.0];
        let y = nd::array![0.0, 1.0, 2.0, 3.0];
        assert!(matches!(Table::new(x, y.clone(), 1), Err(InterpError::Unsorted(2))));
        let x = nd::array![0.0, 1.0];
        assert!(matches!(
            Table::new(x.clone(), nd::array![0.0, 1.0], 3),
            Err(InterpError::TableSize(_)),
        ));
        assert!(matches!(Table::new(x, y, 1), Err(InterpError::Length(_))));
    }
}

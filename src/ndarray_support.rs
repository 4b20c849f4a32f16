//! ndarray adapters.
//!
//! Conversions between plain dual values and `Array1<f64>` / `Array2<f64>`,
//! plus thin wrappers around the differential operators in [`crate::api`].

use ndarray::{Array1, Array2};

use crate::backend::Matrix;
use crate::dual::{D, DM, DV};
use crate::error::Result;

impl From<&Array1<f64>> for DV {
    fn from(a: &Array1<f64>) -> Self {
        DV::from(a.iter().copied().collect::<Vec<_>>())
    }
}

impl From<&Array2<f64>> for DM {
    fn from(a: &Array2<f64>) -> Self {
        let (rows, cols) = a.dim();
        DM::from(Matrix::from_fn(rows, cols, |i, j| a[[i, j]]))
    }
}

impl DV {
    /// Deepest primal as an `Array1`.
    pub fn to_array1(&self) -> Array1<f64> {
        Array1::from_vec(self.to_vec())
    }
}

impl DM {
    /// Deepest primal as an `Array2`.
    pub fn to_array2(&self) -> Array2<f64> {
        let m = self.deep();
        Array2::from_shape_fn((m.rows(), m.cols()), |(i, j)| m.get(i, j))
    }
}

/// Gradient of `f` at `x`, returning an `Array1`.
pub fn grad_ndarray(f: impl Fn(&DV) -> D, x: &Array1<f64>) -> Result<Array1<f64>> {
    Ok(crate::api::grad(f, &DV::from(x))?.to_array1())
}

pub fn grad_ndarray_val(f: impl Fn(&DV) -> D, x: &Array1<f64>) -> Result<(f64, Array1<f64>)> {
    let (v, g) = crate::api::grad_with_value(f, &DV::from(x))?;
    Ok((v.value(), g.to_array1()))
}

pub fn hessian_ndarray(f: impl Fn(&DV) -> D, x: &Array1<f64>) -> Result<Array2<f64>> {
    Ok(crate::api::hessian(f, &DV::from(x))?.to_array2())
}

/// Jacobian `J[i][j] = ∂f_i/∂x_j` as an `Array2`.
pub fn jacobian_ndarray(f: impl Fn(&DV) -> DV, x: &Array1<f64>) -> Result<Array2<f64>> {
    Ok(crate::api::jacobian(f, &DV::from(x))?.to_array2())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn jacobian_of_linear_map() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let da = DM::from(&a);
        let j = jacobian_ndarray(move |x| &da * x, &array![0.5, -1.0]).unwrap();
        assert_eq!(j, a);
    }

    #[test]
    fn hessian_of_quadratic() {
        let h = hessian_ndarray(|x| x.dot(x) * 1.5, &array![1.0, 2.0]).unwrap();
        assert_eq!(h, array![[3.0, 0.0], [0.0, 3.0]]);
    }
}

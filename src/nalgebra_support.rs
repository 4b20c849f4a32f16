//! nalgebra adapters.
//!
//! Conversions between plain dual values and `DVector<f64>` / `DMatrix<f64>`,
//! plus thin wrappers around the differential operators in [`crate::api`].

use nalgebra::{DMatrix, DVector};

use crate::backend::Matrix;
use crate::dual::{D, DM, DV};
use crate::error::Result;

impl From<&DVector<f64>> for DV {
    fn from(v: &DVector<f64>) -> Self {
        DV::from(v.iter().copied().collect::<Vec<_>>())
    }
}

impl From<&DMatrix<f64>> for DM {
    fn from(m: &DMatrix<f64>) -> Self {
        DM::from(Matrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)]))
    }
}

impl DV {
    /// Deepest primal as a `DVector`.
    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_vec(self.to_vec())
    }
}

impl DM {
    /// Deepest primal as a `DMatrix`.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        let m = self.deep();
        DMatrix::from_fn(m.rows(), m.cols(), |i, j| m.get(i, j))
    }
}

/// Gradient of `f` at `x`, returning a `DVector`.
pub fn grad_nalgebra(f: impl Fn(&DV) -> D, x: &DVector<f64>) -> Result<DVector<f64>> {
    Ok(crate::api::grad(f, &DV::from(x))?.to_dvector())
}

/// Value and gradient of `f` at `x`.
pub fn grad_nalgebra_val(f: impl Fn(&DV) -> D, x: &DVector<f64>) -> Result<(f64, DVector<f64>)> {
    let (v, g) = crate::api::grad_with_value(f, &DV::from(x))?;
    Ok((v.value(), g.to_dvector()))
}

pub fn hessian_nalgebra(f: impl Fn(&DV) -> D, x: &DVector<f64>) -> Result<DMatrix<f64>> {
    Ok(crate::api::hessian(f, &DV::from(x))?.to_dmatrix())
}

/// Jacobian `J[i][j] = ∂f_i/∂x_j` as a `DMatrix`.
pub fn jacobian_nalgebra(f: impl Fn(&DV) -> DV, x: &DVector<f64>) -> Result<DMatrix<f64>> {
    Ok(crate::api::jacobian(f, &DV::from(x))?.to_dmatrix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_round_trip_keeps_layout() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let d = DM::from(&m);
        assert_eq!(d.item(0, 2).value(), 3.0);
        assert_eq!(d.to_dmatrix(), m);
    }

    #[test]
    fn gradient_of_squared_norm() {
        let x = DVector::from_vec(vec![1.0, -2.0]);
        let g = grad_nalgebra(|x| x.l2_norm_sq(), &x).unwrap();
        assert_eq!(g, DVector::from_vec(vec![2.0, -4.0]));
    }
}

//! Matrix primitives and the vector/matrix products.

use std::rc::Rc;

use super::derivative_fn;
use crate::backend::{self, Matrix};
use crate::dispatch::{op_binary, op_unary, try_op_binary, try_op_collect, try_op_unary};
use crate::dual::{D, DM, DV};
use crate::error::{Error, Result};
use crate::opcode::{MapFn, MatrixOp, ScalarOp, VectorOp};

// ── Arithmetic ──

pub(crate) fn add_dm_dm(a: &DM, b: &DM) -> DM {
    op_binary(
        "add",
        a,
        b,
        |a, b| a.zip_map(b, |x, y| x + y),
        add_dm_dm,
        |_, _, at| at.clone(),
        |_, _, bt| bt.clone(),
        |_, _, at, _, bt| at + bt,
        |a, b| MatrixOp::AddDMDM(a.clone(), b.clone()),
        |a, _| MatrixOp::AddDMDMCons(a.clone()),
        |_, b| MatrixOp::AddDMDMCons(b.clone()),
    )
}

pub(crate) fn sub_dm_dm(a: &DM, b: &DM) -> DM {
    op_binary(
        "sub",
        a,
        b,
        |a, b| a.zip_map(b, |x, y| x - y),
        sub_dm_dm,
        |_, _, at| at.clone(),
        |_, _, bt| -bt,
        |_, _, at, _, bt| at - bt,
        |a, b| MatrixOp::SubDMDM(a.clone(), b.clone()),
        |a, _| MatrixOp::SubDMDMCons(a.clone()),
        |_, b| MatrixOp::SubDMConsDM(b.clone()),
    )
}

pub(crate) fn mul_dm_dm(a: &DM, b: &DM) -> DM {
    op_binary(
        "matmul",
        a,
        b,
        |a, b| backend::mat_mat(a, b),
        mul_dm_dm,
        |_, _, at| at * b,
        |_, _, bt| a * bt,
        |_, ap, at, bp, bt| at * bp + ap * bt,
        |a, b| MatrixOp::MulDMDM(a.clone(), b.clone()),
        |a, b| MatrixOp::MulDMDMCons(a.clone(), b.clone()),
        |a, b| MatrixOp::MulDMConsDM(a.clone(), b.clone()),
    )
}

/// Matrix times column vector.
pub(crate) fn mul_dm_dv(a: &DM, b: &DV) -> DV {
    op_binary(
        "matvec",
        a,
        b,
        |a, b| backend::mat_vec(a, b),
        mul_dm_dv,
        |_, _, at| at * b,
        |_, _, bt| a * bt,
        |_, ap, at, bp, bt| at * bp + ap * bt,
        |a, b| VectorOp::MulDMDV(a.clone(), b.clone()),
        |a, b| VectorOp::MulDMDVCons(a.clone(), b.clone()),
        |a, b| VectorOp::MulDMConsDV(a.clone(), b.clone()),
    )
}

/// Row vector times matrix.
pub(crate) fn mul_dv_dm(a: &DV, b: &DM) -> DV {
    op_binary(
        "vecmat",
        a,
        b,
        |a, b| backend::vec_mat(a, b),
        mul_dv_dm,
        |_, _, at| at * b,
        |_, _, bt| a * bt,
        |_, ap, at, bp, bt| at * bp + ap * bt,
        |a, b| VectorOp::MulDVDM(a.clone(), b.clone()),
        |a, b| VectorOp::MulDVDMCons(a.clone(), b.clone()),
        |a, b| VectorOp::MulDVConsDM(a.clone(), b.clone()),
    )
}

pub(crate) fn mul_dm_d(a: &DM, b: &D) -> DM {
    op_binary(
        "mul",
        a,
        b,
        |a, b| a.map(|x| x * *b),
        mul_dm_d,
        |_, _, at| at * b,
        |_, _, bt| a * bt,
        |_, ap, at, bp, bt| at * bp + ap * bt,
        |a, b| MatrixOp::MulDMD(a.clone(), b.clone()),
        |a, b| MatrixOp::MulDMDCons(a.clone(), b.clone()),
        |a, b| MatrixOp::MulDMConsD(a.clone(), b.clone()),
    )
}

pub(crate) fn div_dm_d(a: &DM, b: &D) -> DM {
    mul_dm_d(a, &b.recip())
}

/// `a + b` with the scalar broadcast over every entry.
pub(crate) fn add_dm_d(a: &DM, b: &D) -> DM {
    a + DM::ones(a.rows(), a.cols()) * b
}

pub(crate) fn neg_dm(a: &DM) -> DM {
    op_unary(
        a,
        |a| a.map(|x| -x),
        neg_dm,
        |_, _, at| -at,
        |a| MatrixOp::NegDM(a.clone()),
    )
}

fn singular(op: &'static str) -> Error {
    Error::domain(op, "matrix is singular or shapes do not match")
}

impl DV {
    /// Outer product `self otherᵀ`.
    pub fn outer(&self, other: &DV) -> DM {
        op_binary(
            "outer",
            self,
            other,
            |a, b| backend::outer(a, b),
            DV::outer,
            |_, _, at| at.outer(other),
            |_, _, bt| self.outer(bt),
            |_, ap, at, bp, bt| at.outer(bp) + ap.outer(bt),
            |a, b| MatrixOp::OuterDVDV(a.clone(), b.clone()),
            |a, b| MatrixOp::OuterDVDVCons(a.clone(), b.clone()),
            |a, b| MatrixOp::OuterDVConsDV(a.clone(), b.clone()),
        )
    }

    /// Row-major reshape into a matrix with `rows` rows.
    pub fn reshape(&self, rows: usize) -> Result<DM> {
        try_op_unary(
            self,
            |a| {
                backend::reshape(a, rows).ok_or_else(|| {
                    Error::domain("reshape", format!("cannot split {} elements into {rows} rows", a.len()))
                })
            },
            |ap| ap.reshape(rows),
            |_, _, at| at.reshape(rows),
            |a| MatrixOp::ReshapeDV(a.clone(), rows),
        )
    }

    /// `rows x cols` matrix with `self` on its main diagonal.
    ///
    /// Panics unless `self.len() == min(rows, cols)`.
    pub fn embed_diagonal(&self, rows: usize, cols: usize) -> DM {
        assert_eq!(
            self.len(),
            rows.min(cols),
            "diagonal length must match the smaller matrix dimension"
        );
        op_unary(
            self,
            |a| Matrix::from_fn(rows, cols, |i, j| if i == j { a[i] } else { 0.0 }),
            |ap| ap.embed_diagonal(rows, cols),
            |_, _, at| at.embed_diagonal(rows, cols),
            |a| MatrixOp::DiagDV(a.clone()),
        )
    }
}

impl DM {
    /// Square matrix with `v` on its diagonal.
    pub fn from_diagonal(v: &DV) -> DM {
        v.embed_diagonal(v.len(), v.len())
    }

    /// Assemble a matrix from equally long rows. The result is active at the
    /// highest tag among `rows`.
    pub fn of_rows(rows: &[DV]) -> Result<DM> {
        let cols = rows.first().map_or(0, DV::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(Error::domain("of_rows", "rows must have equal length"));
        }
        let n = rows.len();
        try_op_collect(
            "of_rows",
            rows,
            &|rs: &[&Vec<f64>]| -> Matrix<f64> { Matrix::from_fn(n, cols, |i, j| rs[i][j]) },
            &MatrixOp::OfRows,
        )
    }

    pub fn to_rows(&self) -> Vec<DV> {
        (0..self.rows()).map(|i| self.row(i)).collect()
    }

    /// Row `i`. Panics if `i` is out of bounds.
    pub fn row(&self, i: usize) -> DV {
        op_unary(
            self,
            |a| a.row(i).to_vec(),
            |ap| ap.row(i),
            |_, _, at| at.row(i),
            |a| VectorOp::RowDM(a.clone(), i),
        )
    }

    /// Entry `(i, j)`. Panics if out of bounds.
    pub fn item(&self, i: usize, j: usize) -> D {
        op_unary(
            self,
            |a| a.get(i, j),
            |ap| ap.item(i, j),
            |_, _, at| at.item(i, j),
            |a| ScalarOp::ItemDM(a.clone(), i, j),
        )
    }

    /// Row-major flattening.
    pub fn flatten(&self) -> DV {
        op_unary(
            self,
            |a| a.as_slice().to_vec(),
            DM::flatten,
            |_, _, at| at.flatten(),
            |a| VectorOp::FlattenDM(a.clone()),
        )
    }

    pub fn transpose(&self) -> DM {
        op_unary(
            self,
            |a| backend::transpose(a),
            DM::transpose,
            |_, _, at| at.transpose(),
            |a| MatrixOp::TransposeDM(a.clone()),
        )
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> DV {
        op_unary(
            self,
            |a| backend::diagonal(a),
            DM::diagonal,
            |_, _, at| at.diagonal(),
            |a| VectorOp::DiagonalDM(a.clone()),
        )
    }

    pub fn sum(&self) -> D {
        op_unary(
            self,
            |a| backend::sum(a.as_slice()),
            DM::sum,
            |_, _, at| at.sum(),
            |a| ScalarOp::SumDM(a.clone()),
        )
    }

    pub fn trace(&self) -> D {
        op_unary(
            self,
            |a| backend::trace(a),
            DM::trace,
            |_, _, at| at.trace(),
            |a| ScalarOp::TraceDM(a.clone()),
        )
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &DM) -> DM {
        op_binary(
            "hadamard",
            self,
            other,
            |a, b| a.zip_map(b, |x, y| x * y),
            DM::hadamard,
            |_, _, at| at.hadamard(other),
            |_, _, bt| self.hadamard(bt),
            |_, ap, at, bp, bt| at.hadamard(bp) + ap.hadamard(bt),
            |a, b| MatrixOp::HadamardDMDM(a.clone(), b.clone()),
            |a, b| MatrixOp::HadamardDMDMCons(a.clone(), b.clone()),
            |a, b| MatrixOp::HadamardDMDMCons(b.clone(), a.clone()),
        )
    }

    pub fn exp(&self) -> DM {
        op_unary(
            self,
            |a| a.map(f64::exp),
            DM::exp,
            |cp, _, at| at.hadamard(cp),
            |a| MatrixOp::ExpDM(a.clone()),
        )
    }

    pub fn tanh(&self) -> DM {
        op_unary(
            self,
            |a| a.map(f64::tanh),
            DM::tanh,
            |cp, _, at| at.hadamard(&(DM::ones(cp.rows(), cp.cols()) - cp.hadamard(cp))),
            |a| MatrixOp::TanhDM(a.clone()),
        )
    }

    /// Apply a scalar function to every entry. Same contract as
    /// [`DV::map`].
    pub fn map(&self, f: impl Fn(&D) -> D + 'static) -> DM {
        self.map_rc(Rc::new(f))
    }

    pub(crate) fn map_rc(&self, f: MapFn) -> DM {
        op_unary(
            self,
            |a| Matrix::from_fn(a.rows(), a.cols(), |i, j| f(&D::from(a.get(i, j))).value()),
            |ap| ap.map_rc(Rc::clone(&f)),
            |_, ap, at| at.hadamard(&ap.map_rc(derivative_fn(&f))),
            |a| MatrixOp::MapDM(Rc::clone(&f), a.clone()),
        )
    }

    // ── Linear algebra ──

    /// Solve `self x = b` by LU factorisation.
    pub fn solve(&self, b: &DV) -> Result<DV> {
        try_op_binary(
            "solve",
            self,
            b,
            |a, b| backend::solve(a, b).ok_or_else(|| singular("solve")),
            DM::solve,
            |cp, ap, at| ap.solve(&-(at * cp)),
            |_, _, bt| self.solve(bt),
            |cp, ap, at, _, bt| ap.solve(&(bt - at * cp)),
            |a, b| VectorOp::SolveDMDV(a.clone(), b.clone()),
            |a, b| VectorOp::SolveDMDVCons(a.clone(), b.clone()),
            |a, b| VectorOp::SolveDMConsDV(a.clone(), b.clone()),
        )
    }

    /// Solve `self x = b` for symmetric positive definite `self` by
    /// Cholesky factorisation.
    pub fn solve_symmetric(&self, b: &DV) -> Result<DV> {
        try_op_binary(
            "solve_symmetric",
            self,
            b,
            |a, b| {
                backend::solve_symmetric(a, b).ok_or_else(|| {
                    Error::domain("solve_symmetric", "matrix is not symmetric positive definite")
                })
            },
            DM::solve_symmetric,
            |cp, ap, at| ap.solve_symmetric(&-(at * cp)),
            |_, _, bt| self.solve_symmetric(bt),
            |cp, ap, at, _, bt| ap.solve_symmetric(&(bt - at * cp)),
            |a, b| VectorOp::SolveDMDV(a.clone(), b.clone()),
            |a, b| VectorOp::SolveDMDVCons(a.clone(), b.clone()),
            |a, b| VectorOp::SolveDMConsDV(a.clone(), b.clone()),
        )
    }

    pub fn inverse(&self) -> Result<DM> {
        try_op_unary(
            self,
            |a| backend::inverse(a).ok_or_else(|| singular("inverse")),
            DM::inverse,
            |cp, _, at| Ok(-(cp * at * cp)),
            |a| MatrixOp::InverseDM(a.clone()),
        )
    }

    /// Determinant. Fails for non-square input; the derivative additionally
    /// needs the matrix to be invertible.
    pub fn det(&self) -> Result<D> {
        try_op_unary(
            self,
            |a| {
                backend::det(a)
                    .ok_or_else(|| Error::domain("det", format!("{}x{} matrix is not square", a.rows(), a.cols())))
            },
            DM::det,
            |cp, ap, at| Ok(cp * (ap.inverse()? * at).trace()),
            |a| ScalarOp::DetDM(a.clone()),
        )
    }
}

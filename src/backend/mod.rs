//! Numeric backend consumed by the differentiation core.
//!
//! Everything here works on owned, contiguous buffers of a primitive
//! [`Float`]: vectors are `[F]` slices, matrices are row-major [`Matrix<F>`].
//! Nothing in this module knows about dual values.

pub mod elementwise;
pub mod linalg;

pub use elementwise::{dot, l1_norm, l2_norm, l2_norm_sq, map, map2, sum};
pub use linalg::{
    det, diagonal, inverse, mat_mat, mat_vec, outer, repeat_cols, repeat_rows, reshape, solve,
    solve_symmetric, trace, transpose, vec_mat,
};

use crate::float::Float;

/// Dense row-major matrix.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix<F> {
    rows: usize,
    cols: usize,
    data: Vec<F>,
}

impl<F: Float> Matrix<F> {
    /// All-zero `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![F::zero(); rows * cols],
        }
    }

    /// `rows x cols` matrix with every entry equal to `value`.
    pub fn filled(rows: usize, cols: usize, value: F) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { F::one() } else { F::zero() })
    }

    pub fn from_fn(rows: usize, cols: usize, f: impl Fn(usize, usize) -> F) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { rows, cols, data }
    }

    /// Wrap a row-major buffer. Returns `None` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<F>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Matrix { rows, cols, data })
    }

    /// Build from equally long rows. Returns `None` on ragged input.
    pub fn from_rows(rows: &[Vec<F>]) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Some(Matrix {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> F {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: F) {
        self.data[i * self.cols + j] = value;
    }

    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<F> {
        self.data
    }

    /// Rows as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<F>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    /// Apply `f` to every entry.
    pub fn map(&self, f: impl Fn(F) -> F + Sync + Send) -> Self {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: map(f, &self.data),
        }
    }

    /// Combine two equally shaped matrices entry by entry.
    pub fn zip_map(&self, other: &Self, f: impl Fn(F, F) -> F + Sync + Send) -> Self {
        assert_eq!(
            (self.rows, self.cols),
            (other.rows, other.cols),
            "matrix shapes must match"
        );
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: map2(f, &self.data, &other.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn ragged_rows_rejected() {
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        assert!(Matrix::<f64>::from_vec(2, 2, vec![1.0; 3]).is_none());
    }

    #[test]
    fn identity_diagonal() {
        let i = Matrix::<f64>::identity(3);
        assert_eq!(i.get(0, 0), 1.0);
        assert_eq!(i.get(0, 1), 0.0);
        assert_eq!(i.get(2, 2), 1.0);
    }
}

//! Dense linear algebra on [`Matrix<F>`] and flat vectors.
//!
//! Shape mismatches between operands are programming errors and panic.
//! Singular or non-square inputs to `solve`, `inverse` and `det` are data
//! errors and come back as `None`.

use super::Matrix;
use crate::float::Float;

/// `a * b^T` for column vectors `a`, `b`.
pub fn outer<F: Float>(a: &[F], b: &[F]) -> Matrix<F> {
    Matrix::from_fn(a.len(), b.len(), |i, j| a[i] * b[j])
}

pub fn mat_vec<F: Float>(m: &Matrix<F>, v: &[F]) -> Vec<F> {
    assert_eq!(m.cols(), v.len(), "matrix columns must match vector length");
    (0..m.rows())
        .map(|i| {
            m.row(i)
                .iter()
                .zip(v.iter())
                .fold(F::zero(), |acc, (&x, &y)| acc + x * y)
        })
        .collect()
}

/// Row vector times matrix: `v^T * m`.
pub fn vec_mat<F: Float>(v: &[F], m: &Matrix<F>) -> Vec<F> {
    assert_eq!(m.rows(), v.len(), "matrix rows must match vector length");
    let mut out = vec![F::zero(); m.cols()];
    for (i, &vi) in v.iter().enumerate() {
        for (o, &mij) in out.iter_mut().zip(m.row(i).iter()) {
            *o = *o + vi * mij;
        }
    }
    out
}

pub fn mat_mat<F: Float>(a: &Matrix<F>, b: &Matrix<F>) -> Matrix<F> {
    assert_eq!(a.cols(), b.rows(), "inner matrix dimensions must agree");
    let mut out = Matrix::zeros(a.rows(), b.cols());
    for i in 0..a.rows() {
        for k in 0..a.cols() {
            let aik = a.get(i, k);
            if aik == F::zero() {
                continue;
            }
            for j in 0..b.cols() {
                out.set(i, j, out.get(i, j) + aik * b.get(k, j));
            }
        }
    }
    out
}

pub fn transpose<F: Float>(m: &Matrix<F>) -> Matrix<F> {
    Matrix::from_fn(m.cols(), m.rows(), |i, j| m.get(j, i))
}

pub fn diagonal<F: Float>(m: &Matrix<F>) -> Vec<F> {
    (0..m.rows().min(m.cols())).map(|i| m.get(i, i)).collect()
}

pub fn trace<F: Float>(m: &Matrix<F>) -> F {
    diagonal(m).into_iter().fold(F::zero(), |acc, x| acc + x)
}

/// Reshape a vector into a row-major matrix with `rows` rows.
///
/// Returns `None` if the length is not a multiple of `rows`.
pub fn reshape<F: Float>(v: &[F], rows: usize) -> Option<Matrix<F>> {
    if rows == 0 || v.len() % rows != 0 {
        return None;
    }
    Matrix::from_vec(rows, v.len() / rows, v.to_vec())
}

/// Matrix whose `n` rows are all `v`.
pub fn repeat_rows<F: Float>(v: &[F], n: usize) -> Matrix<F> {
    Matrix::from_fn(n, v.len(), |_, j| v[j])
}

/// Matrix whose `n` columns are all `v`.
pub fn repeat_cols<F: Float>(v: &[F], n: usize) -> Matrix<F> {
    Matrix::from_fn(v.len(), n, |i, _| v[i])
}

/// Result of LU factorization with partial pivoting.
///
/// Stores the combined L/U factors in a single matrix (L below diagonal,
/// U on and above diagonal) plus the row permutation.
pub struct LuFactors<F> {
    lu: Matrix<F>,
    /// `perm[i]` is the original row index for factored row `i`.
    perm: Vec<usize>,
    swaps: usize,
}

/// Factorize a square matrix via LU decomposition with partial pivoting.
///
/// Returns `None` if the matrix is not square or is singular (near-zero pivot).
// Explicit indexing is clearer for pivoted LU: row/col indices drive pivot search and elimination
#[allow(clippy::needless_range_loop)]
pub fn lu_factor<F: Float>(a: &Matrix<F>) -> Option<LuFactors<F>> {
    if !a.is_square() {
        return None;
    }
    let n = a.rows();
    let mut lu = a.to_rows();
    let mut perm: Vec<usize> = (0..n).collect();
    let mut swaps = 0;

    let eps = F::from(1e-12).unwrap_or_else(F::epsilon);

    for col in 0..n {
        let mut max_val = lu[col][col].abs();
        let mut max_row = col;
        for row in (col + 1)..n {
            let v = lu[row][col].abs();
            if v > max_val {
                max_val = v;
                max_row = row;
            }
        }

        if max_val < eps {
            return None;
        }

        if max_row != col {
            lu.swap(col, max_row);
            perm.swap(col, max_row);
            swaps += 1;
        }

        let pivot = lu[col][col];
        for row in (col + 1)..n {
            let factor = lu[row][col] / pivot;
            lu[row][col] = factor;
            for j in (col + 1)..n {
                let val = lu[col][j];
                lu[row][j] = lu[row][j] - factor * val;
            }
        }
    }

    let lu = Matrix::from_rows(&lu)?;
    Some(LuFactors { lu, perm, swaps })
}

/// Solve `A * x = b` using a pre-computed LU factorization.
#[allow(clippy::needless_range_loop)]
pub fn lu_back_solve<F: Float>(factors: &LuFactors<F>, b: &[F]) -> Vec<F> {
    let n = factors.lu.rows();
    assert_eq!(b.len(), n, "right-hand side length must match matrix size");

    let mut y: Vec<F> = factors.perm.iter().map(|&p| b[p]).collect();

    for i in 1..n {
        for j in 0..i {
            y[i] = y[i] - factors.lu.get(i, j) * y[j];
        }
    }

    let mut x = vec![F::zero(); n];
    for i in (0..n).rev() {
        let mut s = y[i];
        for j in (i + 1)..n {
            s = s - factors.lu.get(i, j) * x[j];
        }
        x[i] = s / factors.lu.get(i, i);
    }
    x
}

/// Solve `A * x = b`. `None` if `A` is singular, non-square, or `b` has the wrong length.
pub fn solve<F: Float>(a: &Matrix<F>, b: &[F]) -> Option<Vec<F>> {
    if a.rows() != b.len() {
        return None;
    }
    let factors = lu_factor(a)?;
    Some(lu_back_solve(&factors, b))
}

/// Solve `A * x = b` for symmetric positive definite `A` via Cholesky.
///
/// `None` if `A` is not square, not positive definite, or `b` has the wrong length.
#[allow(clippy::needless_range_loop)]
pub fn solve_symmetric<F: Float>(a: &Matrix<F>, b: &[F]) -> Option<Vec<F>> {
    if !a.is_square() || a.rows() != b.len() {
        return None;
    }
    let n = a.rows();
    let mut l = Matrix::zeros(n, n);
    for j in 0..n {
        let mut d = a.get(j, j);
        for k in 0..j {
            d = d - l.get(j, k) * l.get(j, k);
        }
        if d <= F::zero() {
            return None;
        }
        let ljj = d.sqrt();
        l.set(j, j, ljj);
        for i in (j + 1)..n {
            let mut s = a.get(i, j);
            for k in 0..j {
                s = s - l.get(i, k) * l.get(j, k);
            }
            l.set(i, j, s / ljj);
        }
    }

    let mut y = vec![F::zero(); n];
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s = s - l.get(i, k) * y[k];
        }
        y[i] = s / l.get(i, i);
    }
    let mut x = vec![F::zero(); n];
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s = s - l.get(k, i) * x[k];
        }
        x[i] = s / l.get(i, i);
    }
    Some(x)
}

/// Matrix inverse. `None` if `A` is singular or non-square.
pub fn inverse<F: Float>(a: &Matrix<F>) -> Option<Matrix<F>> {
    let factors = lu_factor(a)?;
    let n = a.rows();
    let mut inv = Matrix::zeros(n, n);
    let mut e = vec![F::zero(); n];
    for j in 0..n {
        e.iter_mut().for_each(|x| *x = F::zero());
        e[j] = F::one();
        let col = lu_back_solve(&factors, &e);
        for (i, v) in col.into_iter().enumerate() {
            inv.set(i, j, v);
        }
    }
    Some(inv)
}

/// Determinant. `None` only for non-square input; singular matrices give zero.
pub fn det<F: Float>(a: &Matrix<F>) -> Option<F> {
    if !a.is_square() {
        return None;
    }
    let Some(factors) = lu_factor(a) else {
        return Some(F::zero());
    };
    let mut d = if factors.swaps % 2 == 0 {
        F::one()
    } else {
        -F::one()
    };
    for i in 0..a.rows() {
        d = d * factors.lu.get(i, i);
    }
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[Vec<f64>]) -> Matrix<f64> {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn solve_2x2() {
        // [2 1] [x0]   [5]
        // [1 3] [x1] = [7]
        let a = m(&[vec![2.0, 1.0], vec![1.0, 3.0]]);
        let x = solve(&a, &[5.0, 7.0]).unwrap();
        assert!((x[0] - 1.6).abs() < 1e-12);
        assert!((x[1] - 1.8).abs() < 1e-12);
    }

    #[test]
    fn solve_needs_pivoting() {
        let a = m(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        let x = solve(&a, &[3.0, 7.0]).unwrap();
        assert!((x[0] - 7.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn solve_singular_and_mis_shaped() {
        let a = m(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert!(solve(&a, &[3.0, 6.0]).is_none());
        let rect = m(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert!(solve(&rect, &[1.0, 2.0]).is_none());
        let id = Matrix::<f64>::identity(2);
        assert!(solve(&id, &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn symmetric_solve_matches_general() {
        let a = m(&[vec![4.0, 1.0, 0.0], vec![1.0, 3.0, 1.0], vec![0.0, 1.0, 2.0]]);
        let b = [1.0, 2.0, 3.0];
        let x1 = solve(&a, &b).unwrap();
        let x2 = solve_symmetric(&a, &b).unwrap();
        for i in 0..3 {
            assert!((x1[i] - x2[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn symmetric_solve_rejects_indefinite() {
        let a = m(&[vec![1.0, 2.0], vec![2.0, 1.0]]);
        assert!(solve_symmetric(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let a = m(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 0.0]]);
        let inv = inverse(&a).unwrap();
        let p = mat_mat(&a, &inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((p.get(i, j) - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn determinants() {
        let a = m(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 0.0]]);
        assert!((det(&a).unwrap() - 27.0).abs() < 1e-10);
        let swap = m(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert!((det(&swap).unwrap() + 1.0).abs() < 1e-12);
        let singular = m(&[vec![1.0, 2.0], vec![2.0, 4.0]]);
        assert_eq!(det(&singular), Some(0.0));
        let rect = m(&[vec![1.0, 2.0]]);
        assert_eq!(det(&rect), None);
    }

    #[test]
    fn products_and_shapes() {
        let a = m(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert_eq!(mat_vec(&a, &[1.0, 1.0]), vec![3.0, 7.0, 11.0]);
        assert_eq!(vec_mat(&[1.0, 0.0, 1.0], &a), vec![6.0, 8.0]);
        let t = transpose(&a);
        assert_eq!((t.rows(), t.cols()), (2, 3));
        assert_eq!(t.get(1, 2), 6.0);
        let p = mat_mat(&t, &a);
        assert_eq!(p.get(0, 0), 35.0);
        assert_eq!(trace(&p), 35.0 + 56.0);
        assert_eq!(outer(&[1.0, 2.0], &[3.0]).as_slice(), &[3.0, 6.0]);
        assert_eq!(reshape(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap().row(1), &[4.0, 5.0, 6.0]);
        assert!(reshape(&[1.0, 2.0, 3.0], 2).is_none());
        assert_eq!(repeat_rows(&[1.0, 2.0], 3).row(2), &[1.0, 2.0]);
        assert_eq!(repeat_cols(&[1.0, 2.0], 3).row(1), &[2.0, 2.0, 2.0]);
    }
}

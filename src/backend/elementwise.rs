//! Elementwise kernels and reductions over flat buffers.
//!
//! With the `parallel` feature, `map` and `map2` split buffers of at least
//! [`PARALLEL_THRESHOLD`] elements across the rayon thread pool.

use crate::float::Float;

/// Minimum buffer length before elementwise kernels go parallel.
pub const PARALLEL_THRESHOLD: usize = 1 << 14;

/// Apply `f` to every element.
pub fn map<F: Float>(f: impl Fn(F) -> F + Sync + Send, a: &[F]) -> Vec<F> {
    #[cfg(feature = "parallel")]
    {
        if a.len() >= PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            return a.par_iter().map(|&x| f(x)).collect();
        }
    }
    a.iter().map(|&x| f(x)).collect()
}

/// Combine two equally long buffers element by element.
pub fn map2<F: Float>(f: impl Fn(F, F) -> F + Sync + Send, a: &[F], b: &[F]) -> Vec<F> {
    assert_eq!(a.len(), b.len(), "map2 operands must have the same length");
    #[cfg(feature = "parallel")]
    {
        if a.len() >= PARALLEL_THRESHOLD {
            use rayon::prelude::*;
            return a
                .par_iter()
                .zip(b.par_iter())
                .map(|(&x, &y)| f(x, y))
                .collect();
        }
    }
    a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect()
}

pub fn sum<F: Float>(a: &[F]) -> F {
    a.iter().fold(F::zero(), |acc, &x| acc + x)
}

pub fn l1_norm<F: Float>(a: &[F]) -> F {
    a.iter().fold(F::zero(), |acc, &x| acc + x.abs())
}

pub fn l2_norm_sq<F: Float>(a: &[F]) -> F {
    a.iter().fold(F::zero(), |acc, &x| acc + x * x)
}

pub fn l2_norm<F: Float>(a: &[F]) -> F {
    l2_norm_sq(a).sqrt()
}

pub fn dot<F: Float>(a: &[F], b: &[F]) -> F {
    assert_eq!(a.len(), b.len(), "dot operands must have the same length");
    a.iter().zip(b.iter()).fold(F::zero(), |acc, (&x, &y)| acc + x * y)
}

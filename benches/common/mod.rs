#![allow(dead_code)]

use nestad::{Matrix, D, DM, DV};

// ─── Rosenbrock ────────────────────────────────────────────────────────────

pub fn rosenbrock(x: &DV) -> D {
    let xs = x.to_scalars();
    let mut sum = D::from(0.0);
    for i in 0..xs.len() - 1 {
        let t1 = 1.0 - &xs[i];
        let t2 = &xs[i + 1] - &xs[i] * &xs[i];
        sum = sum + &t1 * &t1 + 100.0 * &t2 * &t2;
    }
    sum
}

pub fn rosenbrock_f64(x: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..x.len() - 1 {
        let t1 = 1.0 - x[i];
        let t2 = x[i + 1] - x[i] * x[i];
        sum += t1 * t1 + 100.0 * t2 * t2;
    }
    sum
}

// ─── Rastrigin ─────────────────────────────────────────────────────────────
// f(x) = 10n + Σ[x_i² - 10·cos(2π·x_i)], written with whole-vector primitives.

pub fn rastrigin(x: &DV) -> D {
    let n = x.len() as f64;
    let waves = (x * (2.0 * std::f64::consts::PI)).cos().sum();
    10.0 * n + x.l2_norm_sq() - 10.0 * waves
}

// ─── Neural Network Layer ──────────────────────────────────────────────────
// f(x) = Σ_j tanh(W x + b)_j with 4 hidden units.
// Deterministic weights: w_ji = sin(j*N+i+1) / (N+1), b_j = 0.1*(j+1)

pub fn layer_weights(n: usize) -> (DM, DV) {
    let w = Matrix::from_fn(4, n, |j, i| ((j * n + i + 1) as f64).sin() / (n + 1) as f64);
    let b: Vec<f64> = (0..4).map(|j| 0.1 * (j + 1) as f64).collect();
    (DM::from(w), DV::from(b))
}

pub fn nn_layer(w: &DM, b: &DV, x: &DV) -> D {
    (&(w * x) + b).tanh().sum()
}

pub fn point(n: usize) -> DV {
    DV::from((0..n).map(|i| 0.5 + 0.01 * i as f64).collect::<Vec<_>>())
}

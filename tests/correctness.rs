//! Randomised agreement checks between modes and against finite differences.

use approx::relative_eq;
use nestad::{grad, grad_v, hessian, jacobian, jacobian_t_v, jacobian_v, D, DV};
use proptest::prelude::*;

/// Central finite difference gradient.
fn finite_diff_grad(f: impl Fn(&DV) -> D, x: &[f64], h: f64) -> Vec<f64> {
    (0..x.len())
        .map(|i| {
            let mut xp = x.to_vec();
            let mut xm = x.to_vec();
            xp[i] += h;
            xm[i] -= h;
            (f(&DV::from(xp)).value() - f(&DV::from(xm)).value()) / (2.0 * h)
        })
        .collect()
}

/// Forward-mode gradient, one directional derivative per coordinate.
fn forward_grad(f: impl Fn(&DV) -> D, x: &DV) -> Vec<f64> {
    (0..x.len()).map(|i| grad_v(&f, x, &DV::unit(x.len(), i)).value()).collect()
}

fn mixed(x: &DV) -> D {
    let (a, b, c) = (x.item(0), x.item(1), x.item(2));
    let t = (&a * &b).sin() + (&c * &c + 1.0).ln();
    &t * &t + (&a - &c).tanh() * b.exp() + x.l2_norm()
}

fn field(x: &DV) -> DV {
    let s = x.sin();
    DV::of_scalars(&[
        x.item(0) * x.item(1),
        s.item(2) + x.item(0).exp(),
        x.dot(&s),
        x.item(1).atan2(&(x.item(2) + 3.0)),
    ])
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    relative_eq!(a, b, epsilon = tol, max_relative = tol)
}

fn point() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-2.0f64..2.0, 3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reverse_gradient_matches_forward(x in point()) {
        let x = DV::from(x);
        let rev = grad(mixed, &x).unwrap().to_vec();
        let fwd = forward_grad(mixed, &x);
        for (r, f) in rev.iter().zip(&fwd) {
            prop_assert!(close(*r, *f, 1e-10), "reverse {} vs forward {}", r, f);
        }
    }

    #[test]
    fn reverse_gradient_matches_finite_differences(x in point()) {
        let rev = grad(mixed, &DV::from(x.clone())).unwrap().to_vec();
        let fd = finite_diff_grad(mixed, &x, 1e-6);
        for (r, f) in rev.iter().zip(&fd) {
            prop_assert!(close(*r, *f, 1e-5), "reverse {} vs finite difference {}", r, f);
        }
    }

    #[test]
    fn hessian_is_symmetric(x in point()) {
        let h = hessian(mixed, &DV::from(x)).unwrap().to_matrix();
        for i in 0..3 {
            for j in 0..i {
                prop_assert!(close(h.get(i, j), h.get(j, i), 1e-9));
            }
        }
    }

    #[test]
    fn jacobian_rows_match_vjps(x in point()) {
        let x = DV::from(x);
        // 3 inputs, 4 outputs: built column by column in forward mode
        let j = jacobian(field, &x).unwrap().to_matrix();
        for i in 0..4 {
            let row = jacobian_t_v(field, &x, &DV::unit(4, i)).unwrap().to_vec();
            for (k, r) in row.iter().enumerate() {
                prop_assert!(close(j.get(i, k), *r, 1e-10));
            }
        }
    }

    #[test]
    fn wide_jacobian_columns_match_jvps(x in point()) {
        // 3 inputs, 2 outputs: built row by row in reverse mode
        let f = |x: &DV| field(x).slice(1, 2);
        let x = DV::from(x);
        let j = jacobian(f, &x).unwrap().to_matrix();
        for k in 0..3 {
            let col = jacobian_v(f, &x, &DV::unit(3, k)).to_vec();
            for (i, c) in col.iter().enumerate() {
                prop_assert!(close(j.get(i, k), *c, 1e-10));
            }
        }
    }
}

use approx::assert_relative_eq;
use nestad::{
    curl, diff2, diffn, div, grad, grad_v, hessian, hessian_v, jacobian, jacobian_t_v, jacobian_v,
    jacobian_v_with_value, laplacian, Config, Matrix, Session, Tagger, D, DM, DV,
};

fn mat(rows: &[Vec<f64>]) -> DM {
    DM::from(Matrix::from_rows(rows).unwrap())
}

fn assert_matrix_eq(actual: &DM, expected: &[Vec<f64>], tol: f64) {
    let m = actual.to_matrix();
    assert_eq!((m.rows(), m.cols()), (expected.len(), expected[0].len()));
    for (i, row) in expected.iter().enumerate() {
        for (j, e) in row.iter().enumerate() {
            assert_relative_eq!(m.get(i, j), *e, epsilon = tol, max_relative = tol);
        }
    }
}

// ── Derivatives ──

#[test]
fn diff2_of_cube() {
    let d = diff2(|x: &D| x.powi(3), &D::from(1.5));
    assert_relative_eq!(d.value(), 9.0, max_relative = 1e-12);
}

#[test]
fn diffn_matches_repeated_diff2() {
    let f = |x: &D| x.exp() * x.sin();
    let x = D::from(0.6);
    let a = diffn(2, f, &x);
    let b = diff2(f, &x);
    assert_relative_eq!(a.value(), b.value(), max_relative = 1e-14);
}

// ── Gradients ──

#[test]
fn directional_derivative_agrees_with_gradient() {
    let f = |x: &DV| x.item(0).sin() * x.item(1) + x.item(2).exp();
    let x = DV::from(vec![0.3, 1.2, -0.4]);
    let v = DV::from(vec![1.0, -2.0, 0.5]);
    let g = grad(f, &x).unwrap();
    assert_relative_eq!(grad_v(f, &x, &v).value(), g.dot(&v).value(), max_relative = 1e-12);
}

// ── Jacobians ──

#[test]
fn jacobian_of_linear_map_tall() {
    // 2 inputs, 3 outputs: forward columns
    let rows = [vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
    let a = mat(&rows);
    let j = jacobian(|x: &DV| &a * x, &DV::from(vec![0.1, 0.2])).unwrap();
    assert_matrix_eq(&j, &rows, 0.0);
}

#[test]
fn jacobian_of_linear_map_wide() {
    // 3 inputs, 2 outputs: reverse rows
    let rows = [vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
    let a = mat(&rows);
    let j = jacobian(|x: &DV| &a * x, &DV::from(vec![0.1, 0.2, 0.3])).unwrap();
    assert_matrix_eq(&j, &rows, 0.0);
}

#[test]
fn jacobian_of_nonlinear_maps() {
    let x = DV::from(vec![2.0, 3.0]);
    let j = jacobian(
        |x: &DV| DV::of_scalars(&[x.item(0) * x.item(1), x.item(0).sin(), x.item(1) * x.item(1)]),
        &x,
    )
    .unwrap();
    assert_matrix_eq(&j, &[vec![3.0, 2.0], vec![2.0_f64.cos(), 0.0], vec![0.0, 6.0]], 1e-12);

    let x = DV::from(vec![2.0, 3.0, 5.0]);
    let j = jacobian(
        |x: &DV| DV::of_scalars(&[x.item(0) * x.item(1) * x.item(2), x.item(0) + x.item(2)]),
        &x,
    )
    .unwrap();
    assert_matrix_eq(&j, &[vec![15.0, 10.0, 6.0], vec![1.0, 0.0, 1.0]], 1e-12);
}

#[test]
fn jvp_and_vjp_are_consistent() {
    // uᵀ (J v) = (uᵀ J) v
    let f = |x: &DV| x.tanh().hadamard(&x.exp()).append(&x.slice(1, 1));
    let x = DV::from(vec![0.2, -0.7, 1.1]);
    let v = DV::from(vec![1.0, 2.0, -1.0]);
    let u = DV::from(vec![0.5, -0.5, 2.0, 1.0]);
    let (y, jv) = jacobian_v_with_value(f, &x, &v);
    assert_eq!(y.to_vec(), f(&x).to_vec());
    let utj = jacobian_t_v(f, &x, &u).unwrap();
    assert_relative_eq!(u.dot(&jv).value(), utj.dot(&v).value(), max_relative = 1e-12);
    assert_relative_eq!(
        jacobian_v(f, &x, &v).to_vec()[1],
        jv.to_vec()[1],
        max_relative = 1e-15
    );
}

#[test]
fn jacobian_of_constant_map_is_zero() {
    let j = jacobian(|_: &DV| DV::from(vec![1.0]), &DV::from(vec![1.0, 2.0])).unwrap();
    assert_matrix_eq(&j, &[vec![0.0, 0.0]], 0.0);
}

#[test]
fn jacobian_keeps_empty_dimensions() {
    let no_inputs = jacobian(|_: &DV| DV::from(vec![1.0, 2.0]), &DV::from(Vec::<f64>::new())).unwrap();
    assert_eq!((no_inputs.rows(), no_inputs.cols()), (2, 0));

    let no_outputs = jacobian(|x: &DV| x.slice(0, 0), &DV::from(vec![1.0, 2.0, 3.0])).unwrap();
    assert_eq!((no_outputs.rows(), no_outputs.cols()), (0, 3));
}

// ── Second order ──

#[test]
fn hessian_of_cubic() {
    // f = x0² x1: H = [[2 x1, 2 x0], [2 x0, 0]]
    let f = |x: &DV| x.item(0) * x.item(0) * x.item(1);
    let x = DV::from(vec![3.0, -2.0]);
    let h = hessian(f, &x).unwrap();
    assert_matrix_eq(&h, &[vec![-4.0, 6.0], vec![6.0, 0.0]], 1e-12);

    let hv = hessian_v(f, &x, &DV::from(vec![1.0, 1.0])).unwrap();
    assert_eq!(hv.to_vec(), vec![2.0, 6.0]);
}

#[test]
fn laplacian_of_squared_norm() {
    let l = laplacian(|x: &DV| x.l2_norm_sq(), &DV::from(vec![0.3, 1.0, -2.0, 4.0])).unwrap();
    assert_relative_eq!(l.value(), 8.0, max_relative = 1e-12);
}

#[test]
fn laplacian_of_harmonic_function_is_zero() {
    // x² - y² is harmonic
    let l = laplacian(
        |x: &DV| x.item(0) * x.item(0) - x.item(1) * x.item(1),
        &DV::from(vec![1.3, -0.4]),
    )
    .unwrap();
    assert_relative_eq!(l.value(), 0.0, epsilon = 1e-12);
}

// ── Vector calculus ──

#[test]
fn curl_of_rotation_field() {
    // F = (-y, x, 0), curl F = (0, 0, 2)
    let c = curl(
        |x: &DV| DV::of_scalars(&[-x.item(1), x.item(0), D::from(0.0)]),
        &DV::from(vec![0.5, 1.5, -1.0]),
    )
    .unwrap();
    assert_eq!(c.to_vec(), vec![0.0, 0.0, 2.0]);
}

#[test]
fn curl_of_gradient_field_vanishes() {
    let phi = |x: &DV| x.item(0) * x.item(1).sin() + x.item(2).exp() * x.item(0);
    let c = curl(|x: &DV| grad(phi, x).unwrap(), &DV::from(vec![0.4, 1.1, -0.3])).unwrap();
    for v in c.to_vec() {
        assert_relative_eq!(v, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn divergence_of_elementwise_square() {
    let d = div(|x: &DV| x.hadamard(x), &DV::from(vec![1.0, 2.0, 3.0])).unwrap();
    assert_relative_eq!(d.value(), 12.0, max_relative = 1e-12);
}

// ── Sessions ──

#[test]
fn private_session_computes_gradients() {
    let session = Session::with_tagger(Tagger::new(), Config::default());
    let g = session.grad(|x: &DV| x.l2_norm_sq(), &DV::from(vec![1.0, -1.0])).unwrap();
    assert_eq!(g.to_vec(), vec![2.0, -2.0]);
    let h = session.hessian(|x: &DV| x.l2_norm_sq(), &DV::from(vec![1.0, -1.0])).unwrap();
    assert_matrix_eq(&h, &[vec![2.0, 0.0], vec![0.0, 2.0]], 0.0);
}

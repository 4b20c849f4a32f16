//! Reusing one recorded graph across several reverse sweeps.

use nestad::{reverse_prop, reverse_push, reverse_reset, Error, Mode, Tagger, D, DV};

fn leaf(x: f64) -> D {
    D::from(x).make_reverse(Tagger::global().next_tag())
}

#[test]
fn reset_counts_every_use() {
    let x = leaf(2.0);
    let a = x.sin();
    let b = &x * &a;
    let y = &b + &(&x * 3.0);
    reverse_reset(&y);
    // x: sin, mul, mul-by-constant
    assert_eq!(x.fan_out().unwrap(), 3);
    assert_eq!(a.fan_out().unwrap(), 1);
    assert_eq!(b.fan_out().unwrap(), 1);
    assert_eq!(y.fan_out().unwrap(), 1);

    reverse_push(D::from(1.0), &y).unwrap();
    for v in [&x, &a, &b, &y] {
        assert_eq!(v.fan_out().unwrap(), 0);
    }
    let expected = 2.0_f64.sin() + 2.0 * 2.0_f64.cos() + 3.0;
    assert!((x.adjoint().unwrap().value() - expected).abs() < 1e-12);
}

#[test]
fn reset_clears_stale_adjoints() {
    let x = leaf(1.0);
    let y = &x * &x;
    reverse_prop(D::from(1.0), &y).unwrap();
    x.set_adjoint(D::from(100.0)).unwrap();
    reverse_prop(D::from(1.0), &y).unwrap();
    assert_eq!(x.adjoint().unwrap(), 2.0);
}

#[test]
fn one_graph_many_seeds() {
    let tag = Tagger::global().next_tag();
    let x = DV::from(vec![1.0, 2.0]).make_reverse(tag);
    let y = DV::of_scalars(&[x.item(0) * x.item(1), x.item(1).exp()]);

    reverse_prop(DV::unit(2, 0), &y).unwrap();
    assert_eq!(x.adjoint().unwrap().to_vec(), vec![2.0, 1.0]);

    reverse_prop(DV::unit(2, 1), &y).unwrap();
    assert_eq!(x.adjoint().unwrap().to_vec(), vec![0.0, 2.0_f64.exp()]);

    reverse_prop(DV::from(vec![1.0, 1.0]), &y).unwrap();
    assert_eq!(x.adjoint().unwrap().to_vec(), vec![2.0, 1.0 + 2.0_f64.exp()]);
}

#[test]
fn seeding_an_intermediate_only_reaches_its_operands() {
    let tag = Tagger::global().next_tag();
    let x = D::from(3.0).make_reverse(tag);
    let z = D::from(5.0).make_reverse(tag);
    let a = &x * 2.0;
    let y = &a * &z;
    reverse_prop(D::from(1.0), &a).unwrap();
    assert_eq!(x.adjoint().unwrap(), 2.0);
    assert_eq!(z.adjoint().unwrap(), 0.0);
    reverse_prop(D::from(1.0), &y).unwrap();
    assert_eq!(z.adjoint().unwrap(), 6.0);
    assert_eq!(x.adjoint().unwrap(), 10.0);
}

#[test]
fn deep_copy_detaches_adjoint() {
    let x = leaf(2.0);
    let y = &x * &x;
    let copy = y.deep_copy();
    assert!(!copy.ptr_eq(&y));
    assert!(y.ptr_eq(&y.clone()));

    reverse_prop(D::from(1.0), &y).unwrap();
    assert_eq!(y.adjoint().unwrap(), 1.0);
    assert_eq!(copy.adjoint().unwrap(), 0.0);
    assert_eq!(copy, y);
}

#[test]
fn accessors_check_mode() {
    let tag = Tagger::global().next_tag();
    let f = D::from(1.0).make_forward(D::from(1.0), tag);
    let r = D::from(1.0).make_reverse(tag);
    assert_eq!(
        f.adjoint().unwrap_err(),
        Error::InvalidAccessor { accessor: "adjoint", mode: Mode::Forward }
    );
    assert_eq!(
        r.tangent().unwrap_err(),
        Error::InvalidAccessor { accessor: "tangent", mode: Mode::Reverse }
    );
    assert!(f.fan_out().is_err());
    assert!(D::from(1.0).set_fan_out(2).is_err());
    r.set_fan_out(4).unwrap();
    assert_eq!(r.fan_out().unwrap(), 4);
}

#[test]
fn long_chains_do_not_recurse() {
    let x = leaf(0.0);
    let mut y = x.clone();
    for _ in 0..200_000 {
        y = &y + 1.0;
    }
    reverse_prop(D::from(1.0), &y).unwrap();
    assert_eq!(y.value(), 200_000.0);
    assert_eq!(x.adjoint().unwrap(), 1.0);
    drop(y);
    assert_eq!(x.value(), 0.0);
}

#[test]
fn dropping_the_output_keeps_shared_intermediates() {
    let x = leaf(1.0);
    let mut mid = x.clone();
    for _ in 0..1_000 {
        mid = &mid * 1.001;
    }
    let mut y = mid.clone();
    for _ in 0..100_000 {
        y = y.sin();
    }
    drop(y);
    reverse_prop(D::from(1.0), &mid).unwrap();
    assert!((x.adjoint().unwrap().value() - 1.001_f64.powi(1_000)).abs() < 1e-9);
}

#[test]
fn deep_nesting_drops_without_recursing() {
    let mut y = D::from(2.0);
    for _ in 0..200_000 {
        y = y.make_forward(D::from(1.0), Tagger::global().next_tag());
    }
    drop(y);
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nestad::{grad_v, jacobian_v, DV};

mod common;
use common::*;

fn bench_forward_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_overhead");
    for n in [2, 10, 100] {
        let x = point(n);
        let raw = x.to_vec();
        let v = DV::unit(n, 0);

        group.bench_with_input(BenchmarkId::new("f64_eval", n), &raw, |b, x| {
            b.iter(|| black_box(rosenbrock_f64(black_box(x))))
        });

        group.bench_with_input(BenchmarkId::new("plain_dual_eval", n), &x, |b, x| {
            b.iter(|| black_box(rosenbrock(black_box(x))))
        });

        group.bench_with_input(BenchmarkId::new("single_direction", n), &x, |b, x| {
            b.iter(|| black_box(grad_v(rosenbrock, black_box(x), &v)))
        });
    }
    group.finish();
}

fn bench_forward_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_vector");
    for n in [10, 100, 1000] {
        let x = point(n);
        let v = DV::from(vec![1.0; n]);
        group.bench_with_input(BenchmarkId::new("rastrigin_jvp", n), &x, |b, x| {
            b.iter(|| black_box(grad_v(rastrigin, black_box(x), &v)))
        });
        let (w, bias) = layer_weights(n);
        group.bench_with_input(BenchmarkId::new("layer_jvp", n), &x, |b, x| {
            b.iter(|| black_box(jacobian_v(|x: &DV| (&(&w * x) + &bias).tanh(), black_box(x), &v)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forward_overhead, bench_forward_vector);
criterion_main!(benches);

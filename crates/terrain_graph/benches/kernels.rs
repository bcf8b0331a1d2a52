mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;
use terrain_graph::kernels::bezier::{BezierCurve, BezierSpline};
use terrain_graph::kernels::erosion::{self, ErosionParams};
use terrain_graph::kernels::noise::{self, NoiseParams};
use terrain_graph::kernels::normals::{self, NormalParams};
use terrain_graph::kernels::smooth::{self, SmoothKernel, SmoothParams};
use terrain_graph::kernels::CancelToken;
use terrain_graph::maps::IntensityMap;

fn heights(side: usize) -> IntensityMap {
    noise::generate(
        common::square(side),
        &NoiseParams::default().with_seed(7),
        &CancelToken::new(),
    )
    .expect("noise ok")
}

fn noise_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels/noise");
    let cancel = CancelToken::new();
    for &side in &common::SIDES {
        let size = common::square(side);
        group.throughput(common::cells_throughput(size));
        for octaves in [1u32, 8] {
            let params = NoiseParams::default().with_octaves(octaves);
            group.bench_with_input(
                BenchmarkId::new(format!("octaves_{octaves}"), side),
                &side,
                |b, _| {
                    b.iter(|| {
                        let map = noise::generate(size, &params, &cancel).expect("noise ok");
                        black_box(map);
                    });
                },
            );
        }
    }
    group.finish();
}

fn erosion_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels/erosion");
    for &side in &common::SIDES {
        let input = heights(side);
        let params = ErosionParams::default().with_droplets(2000);
        group.throughput(common::cells_throughput(input.size()));
        group.bench_with_input(BenchmarkId::new("droplets_2000", side), &side, |b, _| {
            b.iter(|| {
                let eroded = erosion::erode(&input, &params).expect("erosion ok");
                black_box(eroded);
            });
        });
    }
    group.finish();
}

fn normals_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels/normals");
    let cancel = CancelToken::new();
    let params = NormalParams::default();
    for &side in &common::SIDES {
        let input = heights(side);
        group.throughput(common::cells_throughput(input.size()));
        group.bench_with_input(BenchmarkId::new("sobel", side), &side, |b, _| {
            b.iter(|| {
                let map = normals::generate(&input, &params, &cancel).expect("normals ok");
                black_box(map);
            });
        });
    }
    group.finish();
}

fn remap_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels/remap");
    let spline = BezierSpline::new(vec![
        BezierCurve::new(
            DVec2::ZERO,
            DVec2::new(0.25, 0.0),
            DVec2::new(0.25, 0.6),
            DVec2::new(0.5, 0.6),
        ),
        BezierCurve::new(
            DVec2::new(0.5, 0.6),
            DVec2::new(0.75, 0.6),
            DVec2::new(0.75, 1.0),
            DVec2::ONE,
        ),
    ])
    .expect("valid spline");
    for &side in &common::SIDES {
        let input = heights(side);
        group.throughput(common::cells_throughput(input.size()));
        group.bench_with_input(BenchmarkId::new("bezier", side), &side, |b, _| {
            b.iter(|| {
                let map = spline.remap(&input).expect("remap ok");
                black_box(map);
            });
        });
        let blur = SmoothParams::new(3, SmoothKernel::Gaussian);
        group.bench_with_input(BenchmarkId::new("gaussian_r3", side), &side, |b, _| {
            b.iter(|| {
                let map = smooth::smooth(&input, &blur).expect("smooth ok");
                black_box(map);
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = noise_benches, erosion_benches, normals_benches, remap_benches
}
criterion_main!(benches);

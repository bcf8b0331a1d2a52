mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use terrain_graph::prelude::{
    ErosionParams, GraphConfig, MathOp, NodeGraph, NodeId, NodeSpec, NoiseParams, NormalParams,
    ParamValue, SmoothKernel,
};

/// noise -> erosion -> smooth -> output, with normals derived from the smoothed heights.
fn terrain_graph(side: usize) -> (NodeGraph, NodeId, NodeId) {
    let config = GraphConfig::new().with_preview_resolution(common::square(side));
    let mut graph = NodeGraph::with_config(config).expect("valid config");
    let noise = graph.add_node(NodeSpec::noise(NoiseParams::default().with_seed(3)));
    let erosion = graph.add_node(NodeSpec::erosion(
        ErosionParams::default().with_droplets(500),
    ));
    let smooth = graph.add_node(NodeSpec::smooth(1, SmoothKernel::Gaussian));
    let normals = graph.add_node(NodeSpec::normal_map(NormalParams::default()));
    let output = graph.add_node(NodeSpec::output());
    graph.connect(noise, erosion, 0).expect("connect ok");
    graph.connect(erosion, smooth, 0).expect("connect ok");
    graph.connect(smooth, normals, 0).expect("connect ok");
    graph.connect(smooth, output, 0).expect("connect ok");
    graph.connect(normals, output, 1).expect("connect ok");
    (graph, noise, output)
}

/// Wide chain of cheap arithmetic nodes.
fn arithmetic_chain(side: usize, length: usize) -> (NodeGraph, NodeId) {
    let config = GraphConfig::new().with_preview_resolution(common::square(side));
    let mut graph = NodeGraph::with_config(config).expect("valid config");
    let mut last = graph.add_node(NodeSpec::constant(0.5));
    for i in 0..length {
        let op = if i % 2 == 0 { MathOp::Add } else { MathOp::Mix };
        let next = graph.add_node(NodeSpec::math(op));
        graph.connect(last, next, 0).expect("connect ok");
        last = next;
    }
    (graph, last)
}

fn evaluate_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluator/evaluate");
    for &side in &common::SIDES {
        group.throughput(common::cells_throughput(common::square(side)));

        group.bench_with_input(BenchmarkId::new("cold/terrain", side), &side, |b, &side| {
            b.iter_batched(
                || terrain_graph(side),
                |(mut graph, _, output)| {
                    let maps = graph.evaluate(output).expect("evaluate ok");
                    black_box(maps);
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("warm/terrain", side), &side, |b, &side| {
            let (mut graph, _, output) = terrain_graph(side);
            graph.evaluate(output).expect("evaluate ok");
            b.iter(|| {
                let maps = graph.evaluate(output).expect("evaluate ok");
                black_box(maps);
            });
        });

        group.bench_with_input(
            BenchmarkId::new("warm_change/terrain", side),
            &side,
            |b, &side| {
                let (mut graph, noise, output) = terrain_graph(side);
                let mut seed: i64 = 0;
                b.iter(|| {
                    seed += 1;
                    graph
                        .set_parameter(noise, "seed", ParamValue::Int(seed))
                        .expect("set ok");
                    let maps = graph.evaluate(output).expect("evaluate ok");
                    black_box(maps);
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("cold/chain_32", side), &side, |b, &side| {
            b.iter_batched(
                || arithmetic_chain(side, 32),
                |(mut graph, last)| {
                    let map = graph.evaluate(last).expect("evaluate ok");
                    black_box(map);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = evaluate_benches
}
criterion_main!(benches);

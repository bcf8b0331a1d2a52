use std::time::Duration;

use terrain_graph::prelude::*;
use terrain_graph_examples::{init_tracing, intensity_to_png, vector_to_png};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GraphConfig::new().with_preview_resolution(MapSize::square(256)?);
    let mut graph = NodeGraph::with_config(config)?;

    // Fractal noise, eroded by droplets, lightly blurred.
    let noise = graph.add_node(NodeSpec::noise(
        NoiseParams::default().with_seed(42).with_frequency(3.0),
    ));
    let erosion = graph.add_node(NodeSpec::erosion(
        ErosionParams::default().with_droplets(20_000).with_seed(7),
    ));
    let smooth = graph.add_node(NodeSpec::smooth(1, SmoothKernel::Gaussian));
    let normals = graph.add_node(NodeSpec::normal_map(
        NormalParams::default().with_strength(32.0),
    ));
    let output = graph.add_node(NodeSpec::output());

    graph.connect(noise, erosion, 0)?;
    graph.connect(erosion, smooth, 0)?;
    graph.connect(smooth, normals, 0)?;
    graph.connect(smooth, output, 0)?;
    graph.connect(normals, output, 1)?;

    // Drive the graph the way an editor would: poll, and wait while workers run.
    loop {
        match graph.evaluate_async(output)? {
            Evaluation::Ready(_) => break,
            Evaluation::Pending { waiting_on } => {
                println!("Waiting on {} worker job(s)...", waiting_on.len());
                graph.wait_for_completion(Duration::from_secs(60));
            }
        }
    }
    println!(
        "First pass done, {} node outputs computed.",
        graph.total_computed()
    );

    let maps = graph
        .output_maps_if_ready()
        .ok_or_else(|| anyhow::anyhow!("output not ready"))?;
    intensity_to_png(&maps.height, "terrain-height.png")?;
    if let Some(normal) = &maps.normal {
        vector_to_png(normal, "terrain-normals.png", true)?;
    }

    // A smoothing edit only recomputes downstream of the smooth node.
    graph.set_parameter(smooth, "radius", ParamValue::Int(3))?;
    let maps = graph.get_output_maps()?;
    let stats = graph.last_pass();
    println!(
        "After edit: computed {}, reused {}.",
        stats.computed, stats.reused
    );
    intensity_to_png(&maps.height, "terrain-height-smoothed.png")?;
    Ok(())
}

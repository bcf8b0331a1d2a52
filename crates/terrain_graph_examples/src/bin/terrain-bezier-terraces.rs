use glam::DVec2;
use terrain_graph::prelude::*;
use terrain_graph_examples::{init_tracing, intensity_to_png};

/// Three flat steps joined by steep risers.
fn terraces() -> anyhow::Result<BezierSpline> {
    let step = |x0: f64, y0: f64, x1: f64, y1: f64| {
        BezierCurve::new(
            DVec2::new(x0, y0),
            DVec2::new(x0 + (x1 - x0) * 0.8, y0),
            DVec2::new(x0 + (x1 - x0) * 0.8, y1),
            DVec2::new(x1, y1),
        )
    };
    Ok(BezierSpline::new(vec![
        step(0.0, 0.0, 1.0 / 3.0, 1.0 / 3.0),
        step(1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0),
        step(2.0 / 3.0, 2.0 / 3.0, 1.0, 1.0),
    ])?)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GraphConfig::new().with_preview_resolution(MapSize::square(256)?);
    let mut graph = NodeGraph::with_config(config)?;

    let noise = graph.add_node(NodeSpec::noise(NoiseParams::default().with_seed(5)));
    let normalize = graph.add_node(NodeSpec::normalize(0.0, 1.0));
    let curve = graph.add_node(NodeSpec::bezier(BezierSpline::identity()));
    let output = graph.add_node(NodeSpec::output());
    graph.connect(noise, normalize, 0)?;
    graph.connect(normalize, curve, 0)?;
    graph.connect(curve, output, 0)?;

    let before = graph.get_output_maps()?;
    intensity_to_png(&before.height, "bezier-identity.png")?;

    graph.set_parameter(curve, "curve", ParamValue::Curve(terraces()?))?;
    let after = graph.get_output_maps()?;
    println!(
        "Remapped with {} recomputed node(s), {} reused.",
        graph.last_pass().computed,
        graph.last_pass().reused
    );
    intensity_to_png(&after.height, "bezier-terraces.png")?;
    Ok(())
}

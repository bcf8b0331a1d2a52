use glam::DVec4;
use terrain_graph::prelude::*;
use terrain_graph_examples::{init_tracing, intensity_to_png, load_png_texture};

/// Radial falloff, bright in the middle. Stands in for an imported island mask.
fn radial_mask(size: MapSize) -> VectorMap {
    let (w, h) = (size.width() as f64, size.height() as f64);
    VectorMap::from_fn(size, |x, y| {
        let dx = (x as f64 + 0.5) / w - 0.5;
        let dy = (y as f64 + 0.5) / h - 0.5;
        let v = (1.0 - (dx * dx + dy * dy).sqrt() * 2.0).clamp(0.0, 1.0);
        DVec4::new(v, v, v, 1.0)
    })
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let size = MapSize::square(256)?;
    let mut graph = NodeGraph::with_config(GraphConfig::new().with_preview_resolution(size))?;

    // Pass a PNG path to use your own mask.
    let mask = match std::env::args().nth(1) {
        Some(path) => load_png_texture(path)?,
        None => radial_mask(MapSize::square(64)?),
    };
    graph.register_texture("island", mask);

    let noise = graph.add_node(NodeSpec::noise(NoiseParams::default().with_seed(11)));
    let texture = graph.add_node(NodeSpec::Texture {
        params: TextureParams {
            texture_id: "island".into(),
            output: TextureOutput::Intensity(ChannelReduce::R),
            fit_resolution: true,
        },
    });
    let multiply = graph.add_node(NodeSpec::math(MathOp::Multiply));
    let output = graph.add_node(NodeSpec::output());
    graph.connect(noise, multiply, 0)?;
    graph.connect(texture, multiply, 1)?;
    graph.connect(multiply, output, 0)?;

    let maps = graph.get_output_maps()?;
    intensity_to_png(&maps.height, "texture-mask-island.png")?;

    // Swapping the registered texture only dirties the nodes reading it.
    graph.register_texture("island", radial_mask(MapSize::square(32)?));
    println!("Noise node after re-register: {:?}", graph.state(noise));
    println!("Texture node after re-register: {:?}", graph.state(texture));
    let maps = graph.get_output_maps()?;
    intensity_to_png(&maps.height, "texture-mask-coarse.png")?;
    Ok(())
}

use terrain_graph::prelude::*;
use terrain_graph_examples::{init_tracing, intensity_to_png};

/// Snaps heights to a fixed number of levels.
struct Quantize {
    levels: u32,
}

const QUANTIZE_INPUTS: &[InputSlot] = &[InputSlot::required("input", PortType::Intensity)];

impl NodeBehavior for Quantize {
    fn name(&self) -> &str {
        "Quantize"
    }

    fn inputs(&self) -> &[InputSlot] {
        QUANTIZE_INPUTS
    }

    fn output_type(&self) -> PortType {
        PortType::Intensity
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![Parameter::new("levels", ParamValue::Int(self.levels as i64))]
    }

    fn compute(&self, inputs: &[Option<MapValue>], ctx: &ComputeContext<'_>) -> Result<MapValue> {
        ctx.cancel.check()?;
        let input = inputs
            .first()
            .and_then(Option::as_ref)
            .and_then(MapValue::as_intensity)
            .ok_or_else(|| Error::MissingInput {
                name: "input".into(),
            })?;
        let steps = self.levels.max(1) as f64;
        Ok(input.map(|v| (v * steps).floor() / steps).into())
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GraphConfig::new().with_preview_resolution(MapSize::square(256)?);
    let mut graph = NodeGraph::with_config(config)?;

    let noise = graph.add_node(NodeSpec::noise(NoiseParams::default().with_seed(3)));
    let quantize = graph.add_node(NodeSpec::custom(Quantize { levels: 6 }));
    let output = graph.add_node(NodeSpec::output());
    graph.connect(noise, quantize, 0)?;
    graph.connect(quantize, output, 0)?;

    let maps = graph.get_output_maps()?;
    intensity_to_png(&maps.height, "custom-quantize-6.png")?;

    // Custom nodes are edited by replacing their behavior.
    graph.edit_node(quantize, |spec| *spec = NodeSpec::custom(Quantize { levels: 3 }))?;
    let maps = graph.get_output_maps()?;
    intensity_to_png(&maps.height, "custom-quantize-3.png")?;

    if let Some(spec) = graph.node(quantize) {
        for parameter in spec.parameters() {
            println!("{} {} = {:?}", spec.kind_name(), parameter.name, parameter.value);
        }
    }
    Ok(())
}

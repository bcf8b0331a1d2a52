//! Node specifications for the terrain graph.
//!
//! This module defines the data model for graph nodes. Each [`NodeSpec`] names a node kind
//! and carries its parameters; connections are owned by the [`NodeGraph`](super::NodeGraph).
//! Kinds outside the built-in library plug in through [`NodeBehavior`].
use std::fmt;
use std::sync::Arc;

use glam::DVec4;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::compute::ComputeContext;
use super::{InputSlot, MapValue, PortType};
use crate::error::Result;
use crate::kernels::bezier::BezierSpline;
use crate::kernels::erosion::ErosionParams;
use crate::kernels::noise::NoiseParams;
use crate::kernels::normals::NormalParams;
use crate::kernels::smooth::{SmoothKernel, SmoothParams};
use crate::maps::{Channel, ChannelReduce};

const NO_INPUTS: &[InputSlot] = &[];
const INTENSITY_INPUT: &[InputSlot] = &[InputSlot::required("input", PortType::Intensity)];
const VECTOR_INPUT: &[InputSlot] = &[InputSlot::required("input", PortType::Vector)];
const CLAMP_INPUTS: &[InputSlot] = &[
    InputSlot::required("input", PortType::Intensity),
    InputSlot::optional("min", PortType::Intensity),
    InputSlot::optional("max", PortType::Intensity),
];
const INTENSITY_PAIR: &[InputSlot] = &[
    InputSlot::optional("a", PortType::Intensity),
    InputSlot::optional("b", PortType::Intensity),
];
const VECTOR_PAIR: &[InputSlot] = &[
    InputSlot::optional("a", PortType::Vector),
    InputSlot::optional("b", PortType::Vector),
];
const COLOR_INPUTS: &[InputSlot] = &[
    InputSlot::optional("red", PortType::Intensity),
    InputSlot::optional("green", PortType::Intensity),
    InputSlot::optional("blue", PortType::Intensity),
    InputSlot::optional("alpha", PortType::Intensity),
];
const OUTPUT_INPUTS: &[InputSlot] = &[
    InputSlot::required("height", PortType::Intensity),
    InputSlot::optional("normal", PortType::Vector),
];

/// Parameters for a constant value node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantValueParams {
    pub value: f64,
}

/// Parameters for a constant vector node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstantVectorParams {
    pub value: DVec4,
}

/// What a texture node emits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureOutput {
    /// Intensity map; vector textures are reduced with the given reduction.
    Intensity(ChannelReduce),
    /// Vector map; intensity textures become grey `(v, v, v, 1)`.
    Vector,
}

impl Default for TextureOutput {
    fn default() -> Self {
        TextureOutput::Intensity(ChannelReduce::Average)
    }
}

impl TextureOutput {
    pub fn port_type(&self) -> PortType {
        match self {
            TextureOutput::Intensity(_) => PortType::Intensity,
            TextureOutput::Vector => PortType::Vector,
        }
    }
}

/// Parameters for a texture node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureParams {
    /// The ID of the registered texture.
    pub texture_id: String,
    pub output: TextureOutput,
    /// Rescale the texture to the active resolution.
    pub fit_resolution: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClampMode {
    /// Values outside `[min, max]` are cut off.
    #[default]
    Hard,
    /// Logistic curve scaled into `[min, max]`.
    Sigmoid,
}

/// Parameters for a clamp node. `min` and `max` are used when the matching slot is unconnected.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClampParams {
    pub min: f64,
    pub max: f64,
    pub mode: ClampMode,
}

impl Default for ClampParams {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            mode: ClampMode::Hard,
        }
    }
}

/// Parameters for a normalize node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizeParams {
    pub target_min: f64,
    pub target_max: f64,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            target_min: 0.0,
            target_max: 1.0,
        }
    }
}

/// Parameters for an invert node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct InvertParams {
    /// Values become `max - v`.
    pub max: f64,
}

impl Default for InvertParams {
    fn default() -> Self {
        Self { max: 1.0 }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MathOp {
    /// Average of both operands.
    #[default]
    Mix,
    Add,
    Subtract,
    Multiply,
    /// Division by zero yields zero.
    Divide,
    Min,
    Max,
    Pow,
}

impl MathOp {
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MathOp::Mix => (a + b) * 0.5,
            MathOp::Add => a + b,
            MathOp::Subtract => a - b,
            MathOp::Multiply => a * b,
            MathOp::Divide => {
                if b == 0.0 {
                    0.0
                } else {
                    a / b
                }
            }
            MathOp::Min => a.min(b),
            MathOp::Max => a.max(b),
            MathOp::Pow => a.powf(b),
        }
    }
}

/// Parameters for a math node. `a` and `b` stand in for unconnected slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MathParams {
    pub op: MathOp,
    pub a: f64,
    pub b: f64,
}

impl Default for MathParams {
    fn default() -> Self {
        Self {
            op: MathOp::Mix,
            a: 1.0,
            b: 1.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VectorMathOp {
    #[default]
    Mix,
    Add,
    Subtract,
    Multiply,
    /// Component-wise; a zero divisor yields zero in that component.
    Divide,
    /// Cross product of the xyz parts with `w = 1`.
    Cross,
    /// Unit-length `a`; zero vectors stay zero.
    Normalize,
}

impl VectorMathOp {
    #[inline]
    pub fn apply(self, a: DVec4, b: DVec4) -> DVec4 {
        match self {
            VectorMathOp::Mix => (a + b) * 0.5,
            VectorMathOp::Add => a + b,
            VectorMathOp::Subtract => a - b,
            VectorMathOp::Multiply => a * b,
            VectorMathOp::Divide => DVec4::new(
                MathOp::Divide.apply(a.x, b.x),
                MathOp::Divide.apply(a.y, b.y),
                MathOp::Divide.apply(a.z, b.z),
                MathOp::Divide.apply(a.w, b.w),
            ),
            VectorMathOp::Cross => a.truncate().cross(b.truncate()).extend(1.0),
            VectorMathOp::Normalize => a.normalize_or_zero(),
        }
    }
}

/// Parameters for a vector math node. `a` and `b` stand in for unconnected slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorMathParams {
    pub op: VectorMathOp,
    pub a: DVec4,
    pub b: DVec4,
}

impl Default for VectorMathParams {
    fn default() -> Self {
        Self {
            op: VectorMathOp::Mix,
            a: DVec4::ONE,
            b: DVec4::ONE,
        }
    }
}

/// Parameters for a vector dot node. `a` and `b` stand in for unconnected slots.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorDotParams {
    pub a: DVec4,
    pub b: DVec4,
}

impl Default for VectorDotParams {
    fn default() -> Self {
        Self {
            a: DVec4::ONE,
            b: DVec4::ONE,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorToIntensityParams {
    pub reduce: ChannelReduce,
}

/// Parameters for a color combine node. Each value stands in for its unconnected slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCombineParams {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Default for ColorCombineParams {
    fn default() -> Self {
        Self {
            red: 1.0,
            green: 1.0,
            blue: 1.0,
            alpha: 1.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorSplitParams {
    pub channel: Channel,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BezierParams {
    pub curve: BezierSpline,
}

/// Behavior of a node kind defined outside this crate.
pub trait NodeBehavior: Send + Sync {
    /// Display name of the kind.
    fn name(&self) -> &str;

    fn inputs(&self) -> &[InputSlot];

    fn output_type(&self) -> PortType;

    /// Current parameter values, for display.
    fn parameters(&self) -> Vec<super::Parameter> {
        Vec::new()
    }

    /// Produces the output map. `inputs` has one entry per slot, `None` when unconnected.
    fn compute(&self, inputs: &[Option<MapValue>], ctx: &ComputeContext<'_>) -> Result<MapValue>;

    /// `true` to run on a worker thread under asynchronous evaluation. Such kinds should poll
    /// `ctx.cancel`.
    fn runs_on_worker(&self) -> bool {
        false
    }
}

/// Shared handle to a [`NodeBehavior`].
#[derive(Clone)]
pub struct CustomNode(pub Arc<dyn NodeBehavior>);

impl CustomNode {
    pub fn new(behavior: impl NodeBehavior + 'static) -> Self {
        Self(Arc::new(behavior))
    }
}

impl fmt::Debug for CustomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomNode").field(&self.0.name()).finish()
    }
}

/// Specification of a node in the terrain graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum NodeSpec {
    ConstantValue {
        params: ConstantValueParams,
    },
    ConstantVector {
        params: ConstantVectorParams,
    },
    SimplexNoise {
        params: NoiseParams,
    },
    Texture {
        params: TextureParams,
    },
    Clamp {
        params: ClampParams,
    },
    Normalize {
        params: NormalizeParams,
    },
    Smooth {
        params: SmoothParams,
    },
    Invert {
        params: InvertParams,
    },
    Erosion {
        params: ErosionParams,
    },
    Math {
        params: MathParams,
    },
    VectorMath {
        params: VectorMathParams,
    },
    VectorDot {
        params: VectorDotParams,
    },
    VectorToIntensity {
        params: VectorToIntensityParams,
    },
    ColorCombine {
        params: ColorCombineParams,
    },
    ColorSplit {
        params: ColorSplitParams,
    },
    Bezier {
        params: BezierParams,
    },
    NormalMap {
        params: NormalParams,
    },
    /// Terminal sink exposing the final height and normal maps.
    Output,
    #[cfg_attr(feature = "serde", serde(skip))]
    Custom(CustomNode),
}

impl NodeSpec {
    /// Ordered input slots of this node.
    pub fn inputs(&self) -> &[InputSlot] {
        match self {
            NodeSpec::ConstantValue { .. }
            | NodeSpec::ConstantVector { .. }
            | NodeSpec::SimplexNoise { .. }
            | NodeSpec::Texture { .. } => NO_INPUTS,
            NodeSpec::Clamp { .. } => CLAMP_INPUTS,
            NodeSpec::Normalize { .. }
            | NodeSpec::Smooth { .. }
            | NodeSpec::Invert { .. }
            | NodeSpec::Erosion { .. }
            | NodeSpec::Bezier { .. }
            | NodeSpec::NormalMap { .. } => INTENSITY_INPUT,
            NodeSpec::Math { .. } => INTENSITY_PAIR,
            NodeSpec::VectorMath { .. } | NodeSpec::VectorDot { .. } => VECTOR_PAIR,
            NodeSpec::VectorToIntensity { .. } | NodeSpec::ColorSplit { .. } => VECTOR_INPUT,
            NodeSpec::ColorCombine { .. } => COLOR_INPUTS,
            NodeSpec::Output => OUTPUT_INPUTS,
            NodeSpec::Custom(node) => node.0.inputs(),
        }
    }

    /// Type of the single output port.
    pub fn output_type(&self) -> PortType {
        match self {
            NodeSpec::ConstantVector { .. }
            | NodeSpec::VectorMath { .. }
            | NodeSpec::ColorCombine { .. }
            | NodeSpec::NormalMap { .. } => PortType::Vector,
            NodeSpec::Texture { params } => params.output.port_type(),
            NodeSpec::Custom(node) => node.0.output_type(),
            _ => PortType::Intensity,
        }
    }

    /// Display name of the node kind.
    pub fn kind_name(&self) -> &str {
        match self {
            NodeSpec::ConstantValue { .. } => "Constant value",
            NodeSpec::ConstantVector { .. } => "Constant vector",
            NodeSpec::SimplexNoise { .. } => "Simplex noise",
            NodeSpec::Texture { .. } => "Texture",
            NodeSpec::Clamp { .. } => "Clamp",
            NodeSpec::Normalize { .. } => "Normalize",
            NodeSpec::Smooth { .. } => "Smooth",
            NodeSpec::Invert { .. } => "Invert",
            NodeSpec::Erosion { .. } => "Erosion",
            NodeSpec::Math { .. } => "Math",
            NodeSpec::VectorMath { .. } => "Vector math",
            NodeSpec::VectorDot { .. } => "Vector dot",
            NodeSpec::VectorToIntensity { .. } => "Vector to intensity",
            NodeSpec::ColorCombine { .. } => "Color combine",
            NodeSpec::ColorSplit { .. } => "Color split",
            NodeSpec::Bezier { .. } => "Bezier",
            NodeSpec::NormalMap { .. } => "Normal map",
            NodeSpec::Output => "Output",
            NodeSpec::Custom(node) => node.0.name(),
        }
    }

    /// `true` for kinds that run on a worker thread under asynchronous evaluation.
    pub fn runs_on_worker(&self) -> bool {
        match self {
            NodeSpec::SimplexNoise { .. } | NodeSpec::NormalMap { .. } => true,
            NodeSpec::Custom(node) => node.0.runs_on_worker(),
            _ => false,
        }
    }

    /// Texture id this node reads, if any.
    pub fn texture_id(&self) -> Option<&str> {
        match self {
            NodeSpec::Texture { params } => Some(&params.texture_id),
            _ => None,
        }
    }

    /// Creates a new constant value node specification.
    pub fn constant(value: f64) -> Self {
        NodeSpec::ConstantValue {
            params: ConstantValueParams { value },
        }
    }

    /// Creates a new constant vector node specification.
    pub fn constant_vector(value: impl Into<mint::Vector4<f64>>) -> Self {
        NodeSpec::ConstantVector {
            params: ConstantVectorParams {
                value: DVec4::from(value.into()),
            },
        }
    }

    /// Creates a new simplex noise node specification.
    pub fn noise(params: NoiseParams) -> Self {
        NodeSpec::SimplexNoise { params }
    }

    /// Creates a new texture node specification.
    pub fn texture(id: impl Into<String>, output: TextureOutput) -> Self {
        NodeSpec::Texture {
            params: TextureParams {
                texture_id: id.into(),
                output,
                fit_resolution: false,
            },
        }
    }

    /// Creates a new hard clamp node specification.
    pub fn clamp(min: f64, max: f64) -> Self {
        NodeSpec::Clamp {
            params: ClampParams {
                min,
                max,
                mode: ClampMode::Hard,
            },
        }
    }

    /// Creates a new normalize node specification.
    pub fn normalize(target_min: f64, target_max: f64) -> Self {
        NodeSpec::Normalize {
            params: NormalizeParams {
                target_min,
                target_max,
            },
        }
    }

    /// Creates a new smooth node specification.
    pub fn smooth(radius: usize, kernel: SmoothKernel) -> Self {
        NodeSpec::Smooth {
            params: SmoothParams::new(radius, kernel),
        }
    }

    /// Creates a new invert node specification.
    pub fn invert() -> Self {
        NodeSpec::Invert {
            params: InvertParams::default(),
        }
    }

    /// Creates a new erosion node specification.
    pub fn erosion(params: ErosionParams) -> Self {
        NodeSpec::Erosion { params }
    }

    /// Creates a new math node specification with default fallbacks.
    pub fn math(op: MathOp) -> Self {
        NodeSpec::Math {
            params: MathParams {
                op,
                ..MathParams::default()
            },
        }
    }

    /// Creates a new vector math node specification with default fallbacks.
    pub fn vector_math(op: VectorMathOp) -> Self {
        NodeSpec::VectorMath {
            params: VectorMathParams {
                op,
                ..VectorMathParams::default()
            },
        }
    }

    /// Creates a new vector dot node specification.
    pub fn vector_dot() -> Self {
        NodeSpec::VectorDot {
            params: VectorDotParams::default(),
        }
    }

    /// Creates a new vector-to-intensity node specification.
    pub fn vector_to_intensity(reduce: ChannelReduce) -> Self {
        NodeSpec::VectorToIntensity {
            params: VectorToIntensityParams { reduce },
        }
    }

    /// Creates a new color combine node specification.
    pub fn color_combine() -> Self {
        NodeSpec::ColorCombine {
            params: ColorCombineParams::default(),
        }
    }

    /// Creates a new color split node specification.
    pub fn color_split(channel: Channel) -> Self {
        NodeSpec::ColorSplit {
            params: ColorSplitParams { channel },
        }
    }

    /// Creates a new bezier remap node specification.
    pub fn bezier(curve: BezierSpline) -> Self {
        NodeSpec::Bezier {
            params: BezierParams { curve },
        }
    }

    /// Creates a new normal map node specification.
    pub fn normal_map(params: NormalParams) -> Self {
        NodeSpec::NormalMap { params }
    }

    /// Creates a new output node specification.
    pub fn output() -> Self {
        NodeSpec::Output
    }

    /// Wraps an externally defined node kind.
    pub fn custom(behavior: impl NodeBehavior + 'static) -> Self {
        NodeSpec::Custom(CustomNode::new(behavior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_node_kind() {
        assert!(NodeSpec::constant(1.0).inputs().is_empty());
        let clamp = NodeSpec::clamp(0.0, 1.0);
        let names: Vec<_> = clamp.inputs().iter().map(|s| s.name).collect();
        assert_eq!(names, ["input", "min", "max"]);
        assert!(clamp.inputs()[0].required);
        assert!(!clamp.inputs()[1].required);
        let output = NodeSpec::output();
        assert_eq!(output.inputs()[1].port_type, PortType::Vector);
    }

    #[test]
    fn output_types() {
        assert_eq!(NodeSpec::color_combine().output_type(), PortType::Vector);
        assert_eq!(
            NodeSpec::normal_map(NormalParams::default()).output_type(),
            PortType::Vector
        );
        assert_eq!(NodeSpec::vector_dot().output_type(), PortType::Intensity);
        assert_eq!(
            NodeSpec::texture("t", TextureOutput::Vector).output_type(),
            PortType::Vector
        );
        assert_eq!(
            NodeSpec::texture("t", TextureOutput::Intensity(ChannelReduce::R)).output_type(),
            PortType::Intensity
        );
    }

    #[test]
    fn math_ops() {
        assert_eq!(MathOp::Mix.apply(1.0, 3.0), 2.0);
        assert_eq!(MathOp::Divide.apply(1.0, 0.0), 0.0);
        assert_eq!(MathOp::Divide.apply(1.0, 4.0), 0.25);
        assert_eq!(MathOp::Pow.apply(2.0, 3.0), 8.0);
        assert_eq!(MathOp::Min.apply(2.0, -3.0), -3.0);
    }

    #[test]
    fn vector_ops() {
        let x = DVec4::new(1.0, 0.0, 0.0, 0.0);
        let y = DVec4::new(0.0, 1.0, 0.0, 0.0);
        assert_eq!(VectorMathOp::Cross.apply(x, y), DVec4::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(
            VectorMathOp::Divide.apply(DVec4::splat(2.0), DVec4::new(1.0, 0.0, 4.0, 2.0)),
            DVec4::new(2.0, 0.0, 0.5, 1.0)
        );
        assert_eq!(VectorMathOp::Normalize.apply(DVec4::ZERO, x), DVec4::ZERO);
        assert!(VectorMathOp::Normalize
            .apply(DVec4::new(0.0, 3.0, 0.0, 4.0), x)
            .abs_diff_eq(DVec4::new(0.0, 0.6, 0.0, 0.8), 1e-12));
    }

    #[test]
    fn worker_kinds() {
        assert!(NodeSpec::noise(NoiseParams::default()).runs_on_worker());
        assert!(NodeSpec::normal_map(NormalParams::default()).runs_on_worker());
        assert!(!NodeSpec::erosion(ErosionParams::default()).runs_on_worker());
    }

    #[test]
    fn constant_vector_accepts_mint() {
        let spec = NodeSpec::constant_vector(mint::Vector4 {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            w: 4.0,
        });
        assert!(matches!(
            spec,
            NodeSpec::ConstantVector { params } if params.value == DVec4::new(1.0, 2.0, 3.0, 4.0)
        ));
    }
}

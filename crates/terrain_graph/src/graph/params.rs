//! Name-based parameter access for editor front-ends.
//!
//! [`NodeSpec::parameters`] lists the current values of a node and [`NodeSpec::set_parameter`]
//! writes one back, checking the value kind. Enumerations travel as [`ParamValue::Choice`]
//! strings; see [`Choice`].
use glam::DVec4;

use super::node::{ClampMode, MathOp, NodeSpec, TextureOutput, VectorMathOp};
use super::PortType;
use crate::error::{Error, Result};
use crate::kernels::bezier::BezierSpline;
use crate::kernels::erosion::ErosionOutput;
use crate::kernels::normals::{GradientMethod, NormalEncoding};
use crate::kernels::noise;
use crate::kernels::smooth::{self, SmoothKernel};
use crate::maps::{Channel, ChannelReduce};

/// Dynamically typed parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Vector(DVec4),
    Choice(String),
    Text(String),
    Curve(BezierSpline),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Float(_) => "float",
            ParamValue::Int(_) => "int",
            ParamValue::Bool(_) => "bool",
            ParamValue::Vector(_) => "vector",
            ParamValue::Choice(_) => "choice",
            ParamValue::Text(_) => "text",
            ParamValue::Curve(_) => "curve",
        }
    }

    fn mismatch(&self, name: &str, expected: &str) -> Error {
        Error::invalid_parameter(name, format!("expected {expected}, got {}", self.kind()))
    }

    /// Floats, or integers widened to float.
    pub fn as_float(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(other.mismatch(name, "float")),
        }
    }

    pub fn as_int(&self, name: &str) -> Result<i64> {
        match self {
            ParamValue::Int(v) => Ok(*v),
            other => Err(other.mismatch(name, "int")),
        }
    }

    /// Integer converted into `T`, failing when out of range.
    pub fn as_count<T: TryFrom<i64>>(&self, name: &str) -> Result<T> {
        let v = self.as_int(name)?;
        T::try_from(v).map_err(|_| Error::invalid_parameter(name, format!("{v} is out of range")))
    }

    pub fn as_bool(&self, name: &str) -> Result<bool> {
        match self {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch(name, "bool")),
        }
    }

    pub fn as_vector(&self, name: &str) -> Result<DVec4> {
        match self {
            ParamValue::Vector(v) => Ok(*v),
            other => Err(other.mismatch(name, "vector")),
        }
    }

    pub fn as_text(&self, name: &str) -> Result<&str> {
        match self {
            ParamValue::Text(v) => Ok(v),
            other => Err(other.mismatch(name, "text")),
        }
    }

    pub fn as_choice<T: Choice>(&self, name: &str) -> Result<T> {
        match self {
            ParamValue::Choice(v) => T::parse(v).ok_or_else(|| {
                let options: Vec<_> = T::VARIANTS.iter().map(|(_, n)| *n).collect();
                Error::invalid_parameter(
                    name,
                    format!("unknown option '{v}', expected one of {}", options.join(", ")),
                )
            }),
            other => Err(other.mismatch(name, "choice")),
        }
    }

    pub fn as_curve(&self, name: &str) -> Result<BezierSpline> {
        match self {
            ParamValue::Curve(v) => {
                v.validate()
                    .map_err(|e| Error::invalid_parameter(name, e.to_string()))?;
                Ok(v.clone())
            }
            other => Err(other.mismatch(name, "curve")),
        }
    }

    pub fn choice<T: Choice>(value: T) -> Self {
        ParamValue::Choice(value.as_str().to_owned())
    }
}

/// A named parameter value.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub value: ParamValue,
}

impl Parameter {
    pub fn new(name: &'static str, value: ParamValue) -> Self {
        Self { name, value }
    }
}

/// Enumeration exposed to editors by name.
pub trait Choice: Copy + PartialEq + 'static {
    /// Every variant with its name.
    const VARIANTS: &'static [(Self, &'static str)];

    fn as_str(self) -> &'static str {
        Self::VARIANTS
            .iter()
            .find(|(v, _)| *v == self)
            .map_or("", |(_, n)| *n)
    }

    fn parse(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(v, _)| *v)
    }
}

impl Choice for MathOp {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (MathOp::Mix, "mix"),
        (MathOp::Add, "add"),
        (MathOp::Subtract, "subtract"),
        (MathOp::Multiply, "multiply"),
        (MathOp::Divide, "divide"),
        (MathOp::Min, "min"),
        (MathOp::Max, "max"),
        (MathOp::Pow, "pow"),
    ];
}

impl Choice for VectorMathOp {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (VectorMathOp::Mix, "mix"),
        (VectorMathOp::Add, "add"),
        (VectorMathOp::Subtract, "subtract"),
        (VectorMathOp::Multiply, "multiply"),
        (VectorMathOp::Divide, "divide"),
        (VectorMathOp::Cross, "cross"),
        (VectorMathOp::Normalize, "normalize"),
    ];
}

impl Choice for ClampMode {
    const VARIANTS: &'static [(Self, &'static str)] =
        &[(ClampMode::Hard, "hard"), (ClampMode::Sigmoid, "sigmoid")];
}

impl Choice for SmoothKernel {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (SmoothKernel::Box, "box"),
        (SmoothKernel::Gaussian, "gaussian"),
    ];
}

impl Choice for ErosionOutput {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (ErosionOutput::Height, "height"),
        (ErosionOutput::Deposition, "deposition"),
        (ErosionOutput::Erosion, "erosion"),
    ];
}

impl Choice for GradientMethod {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (GradientMethod::Sobel, "sobel"),
        (GradientMethod::CentralDifference, "central_difference"),
    ];
}

impl Choice for NormalEncoding {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (NormalEncoding::Signed, "signed"),
        (NormalEncoding::Unsigned, "unsigned"),
    ];
}

impl Choice for Channel {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (Channel::R, "r"),
        (Channel::G, "g"),
        (Channel::B, "b"),
        (Channel::A, "a"),
    ];
}

impl Choice for ChannelReduce {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (ChannelReduce::R, "r"),
        (ChannelReduce::G, "g"),
        (ChannelReduce::B, "b"),
        (ChannelReduce::A, "a"),
        (ChannelReduce::Average, "average"),
        (ChannelReduce::Min, "min"),
        (ChannelReduce::Max, "max"),
    ];
}

impl Choice for PortType {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (PortType::Intensity, "intensity"),
        (PortType::Vector, "vector"),
    ];
}

fn float(name: &'static str, v: f64) -> Parameter {
    Parameter::new(name, ParamValue::Float(v))
}

fn int(name: &'static str, v: impl Into<i64>) -> Parameter {
    Parameter::new(name, ParamValue::Int(v.into()))
}

fn choice<T: Choice>(name: &'static str, v: T) -> Parameter {
    Parameter::new(name, ParamValue::choice(v))
}

fn vector(name: &'static str, v: DVec4) -> Parameter {
    Parameter::new(name, ParamValue::Vector(v))
}

fn unknown(name: &str, kind: &str) -> Error {
    Error::invalid_parameter(name, format!("no such parameter on {kind} nodes"))
}

impl NodeSpec {
    /// Current parameter values in display order.
    pub fn parameters(&self) -> Vec<Parameter> {
        match self {
            NodeSpec::ConstantValue { params } => vec![float("value", params.value)],
            NodeSpec::ConstantVector { params } => vec![vector("value", params.value)],
            NodeSpec::SimplexNoise { params } => vec![
                // Seeds are shown as the signed bit pattern.
                int("seed", params.seed as i64),
                float("frequency", params.frequency),
                int("octaves", params.octaves),
                float("persistence", params.persistence),
                float("lacunarity", params.lacunarity),
                vector("offset", params.offset.extend(0.0)),
            ],
            NodeSpec::Texture { params } => {
                let mut list = vec![
                    Parameter::new("texture_id", ParamValue::Text(params.texture_id.clone())),
                    choice("output", params.output.port_type()),
                ];
                if let TextureOutput::Intensity(reduce) = params.output {
                    list.push(choice("reduce", reduce));
                }
                list.push(Parameter::new(
                    "fit_resolution",
                    ParamValue::Bool(params.fit_resolution),
                ));
                list
            }
            NodeSpec::Clamp { params } => vec![
                float("min", params.min),
                float("max", params.max),
                choice("mode", params.mode),
            ],
            NodeSpec::Normalize { params } => vec![
                float("target_min", params.target_min),
                float("target_max", params.target_max),
            ],
            NodeSpec::Smooth { params } => vec![
                int("radius", params.radius as i64),
                choice("kernel", params.kernel),
                float("sigma", params.sigma),
            ],
            NodeSpec::Invert { params } => vec![float("max", params.max)],
            NodeSpec::Erosion { params } => vec![
                int("iterations", params.iterations),
                int("droplets", params.droplets),
                float("erosion_rate", params.erosion_rate),
                float("deposition_rate", params.deposition_rate),
                float("evaporation_rate", params.evaporation_rate),
                float("min_slope", params.min_slope),
                float("inertia", params.inertia),
                float("capacity", params.capacity),
                float("gravity", params.gravity),
                int("max_lifetime", params.max_lifetime),
                int("seed", params.seed as i64),
                choice("output", params.output),
            ],
            NodeSpec::Math { params } => vec![
                choice("op", params.op),
                float("a", params.a),
                float("b", params.b),
            ],
            NodeSpec::VectorMath { params } => vec![
                choice("op", params.op),
                vector("a", params.a),
                vector("b", params.b),
            ],
            NodeSpec::VectorDot { params } => vec![vector("a", params.a), vector("b", params.b)],
            NodeSpec::VectorToIntensity { params } => vec![choice("reduce", params.reduce)],
            NodeSpec::ColorCombine { params } => vec![
                float("red", params.red),
                float("green", params.green),
                float("blue", params.blue),
                float("alpha", params.alpha),
            ],
            NodeSpec::ColorSplit { params } => vec![choice("channel", params.channel)],
            NodeSpec::Bezier { params } => vec![Parameter::new(
                "curve",
                ParamValue::Curve(params.curve.clone()),
            )],
            NodeSpec::NormalMap { params } => vec![
                float("strength", params.strength),
                float("texel_spacing", params.texel_spacing),
                choice("method", params.method),
                choice("encoding", params.encoding),
            ],
            NodeSpec::Output => Vec::new(),
            NodeSpec::Custom(node) => node.0.parameters(),
        }
    }

    /// Writes one parameter by name. On error the node is left unchanged.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<()> {
        let kind = self.kind_name().to_owned();
        match self {
            NodeSpec::ConstantValue { params } => match name {
                "value" => params.value = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::ConstantVector { params } => match name {
                "value" => params.value = value.as_vector(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::SimplexNoise { params } => match name {
                "seed" => params.seed = value.as_int(name)? as u64,
                "frequency" => params.frequency = value.as_float(name)?,
                "octaves" => {
                    let octaves: u32 = value.as_count(name)?;
                    if octaves == 0 || octaves > noise::MAX_OCTAVES {
                        return Err(Error::invalid_parameter(
                            name,
                            format!("{octaves} is outside 1..={}", noise::MAX_OCTAVES),
                        ));
                    }
                    params.octaves = octaves;
                }
                "persistence" => params.persistence = value.as_float(name)?,
                "lacunarity" => params.lacunarity = value.as_float(name)?,
                "offset" => params.offset = value.as_vector(name)?.truncate(),
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Texture { params } => match name {
                "texture_id" => params.texture_id = value.as_text(name)?.to_owned(),
                "output" => {
                    params.output = match value.as_choice::<PortType>(name)? {
                        PortType::Vector => TextureOutput::Vector,
                        PortType::Intensity => match params.output {
                            TextureOutput::Intensity(reduce) => TextureOutput::Intensity(reduce),
                            TextureOutput::Vector => TextureOutput::default(),
                        },
                    }
                }
                "reduce" => {
                    let reduce = value.as_choice(name)?;
                    match &mut params.output {
                        TextureOutput::Intensity(current) => *current = reduce,
                        TextureOutput::Vector => {
                            return Err(Error::InvalidConfig(
                                "reduce only applies to intensity texture output".into(),
                            ))
                        }
                    }
                }
                "fit_resolution" => params.fit_resolution = value.as_bool(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Clamp { params } => match name {
                "min" => params.min = value.as_float(name)?,
                "max" => params.max = value.as_float(name)?,
                "mode" => params.mode = value.as_choice(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Normalize { params } => match name {
                "target_min" => params.target_min = value.as_float(name)?,
                "target_max" => params.target_max = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Smooth { params } => match name {
                "radius" => {
                    let radius: usize = value.as_count(name)?;
                    if radius > smooth::MAX_RADIUS {
                        return Err(Error::invalid_parameter(
                            name,
                            format!("{radius} exceeds {}", smooth::MAX_RADIUS),
                        ));
                    }
                    params.radius = radius;
                }
                "kernel" => params.kernel = value.as_choice(name)?,
                "sigma" => params.sigma = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Invert { params } => match name {
                "max" => params.max = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Erosion { params } => match name {
                "iterations" => params.iterations = value.as_count(name)?,
                "droplets" => params.droplets = value.as_count(name)?,
                "erosion_rate" => params.erosion_rate = value.as_float(name)?,
                "deposition_rate" => params.deposition_rate = value.as_float(name)?,
                "evaporation_rate" => params.evaporation_rate = value.as_float(name)?,
                "min_slope" => params.min_slope = value.as_float(name)?,
                "inertia" => params.inertia = value.as_float(name)?,
                "capacity" => params.capacity = value.as_float(name)?,
                "gravity" => params.gravity = value.as_float(name)?,
                "max_lifetime" => params.max_lifetime = value.as_count(name)?,
                "seed" => params.seed = value.as_int(name)? as u64,
                "output" => params.output = value.as_choice(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Math { params } => match name {
                "op" => params.op = value.as_choice(name)?,
                "a" => params.a = value.as_float(name)?,
                "b" => params.b = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::VectorMath { params } => match name {
                "op" => params.op = value.as_choice(name)?,
                "a" => params.a = value.as_vector(name)?,
                "b" => params.b = value.as_vector(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::VectorDot { params } => match name {
                "a" => params.a = value.as_vector(name)?,
                "b" => params.b = value.as_vector(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::VectorToIntensity { params } => match name {
                "reduce" => params.reduce = value.as_choice(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::ColorCombine { params } => match name {
                "red" => params.red = value.as_float(name)?,
                "green" => params.green = value.as_float(name)?,
                "blue" => params.blue = value.as_float(name)?,
                "alpha" => params.alpha = value.as_float(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::ColorSplit { params } => match name {
                "channel" => params.channel = value.as_choice(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Bezier { params } => match name {
                "curve" => params.curve = value.as_curve(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::NormalMap { params } => match name {
                "strength" => params.strength = value.as_float(name)?,
                "texel_spacing" => params.texel_spacing = value.as_float(name)?,
                "method" => params.method = value.as_choice(name)?,
                "encoding" => params.encoding = value.as_choice(name)?,
                _ => return Err(unknown(name, &kind)),
            },
            NodeSpec::Output => return Err(unknown(name, &kind)),
            NodeSpec::Custom(_) => {
                return Err(Error::invalid_parameter(
                    name,
                    "custom nodes are replaced through NodeGraph::edit_node",
                ))
            }
        }
        Ok(())
    }
}

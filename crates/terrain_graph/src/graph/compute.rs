//! Per-kind node computation.
//!
//! [`compute_output`] turns a [`NodeSpec`] plus its resolved input maps into an output map.
//! Nodes with no connected input produce maps at the active resolution; otherwise the output
//! takes the size of the connected inputs, which must agree.
use std::sync::Arc;

use glam::DVec4;

use super::node::{
    ClampMode, ClampParams, ColorCombineParams, MathParams, NodeSpec, NormalizeParams,
    TextureOutput, TextureParams, VectorDotParams, VectorMathParams,
};
use super::{MapValue, PortType, TextureRegistry};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::kernels::{erosion, noise, normals, smooth, CancelToken};
use crate::maps::{IntensityMap, MapSize, Operand, Resampling, VectorMap};

/// Everything a node may read besides its inputs.
#[derive(Clone, Copy)]
pub struct ComputeContext<'a> {
    pub config: &'a GraphConfig,
    pub textures: &'a TextureRegistry,
    pub cancel: &'a CancelToken,
}

impl<'a> ComputeContext<'a> {
    pub fn new(
        config: &'a GraphConfig,
        textures: &'a TextureRegistry,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            config,
            textures,
            cancel,
        }
    }

    /// Size of maps produced without a connected input.
    pub fn resolution(&self) -> MapSize {
        self.config.active_resolution()
    }
}

/// Computes the output of `spec`. `inputs` holds one entry per input slot.
pub fn compute_output(
    spec: &NodeSpec,
    inputs: &[Option<MapValue>],
    ctx: &ComputeContext<'_>,
) -> Result<MapValue> {
    let slots = Inputs { spec, inputs };
    let value: MapValue = match spec {
        NodeSpec::ConstantValue { params } => {
            IntensityMap::uniform(ctx.resolution(), params.value).into()
        }
        NodeSpec::ConstantVector { params } => VectorMap::new(ctx.resolution(), params.value).into(),
        NodeSpec::SimplexNoise { params } => {
            noise::generate(ctx.resolution(), params, ctx.cancel)?.into()
        }
        NodeSpec::Texture { params } => texture(params, ctx)?,
        NodeSpec::Clamp { params } => clamp(params, &slots)?.into(),
        NodeSpec::Normalize { params } => normalize(params, slots.intensity(0)?).into(),
        NodeSpec::Smooth { params } => smooth::smooth(slots.intensity(0)?, params)?.into(),
        NodeSpec::Invert { params } => {
            let max = params.max;
            slots.intensity(0)?.map(|v| max - v).into()
        }
        NodeSpec::Erosion { params } => erosion::erode(slots.intensity(0)?, params)?
            .select(params.output)
            .into(),
        NodeSpec::Math { params } => math(params, &slots, ctx)?.into(),
        NodeSpec::VectorMath { params } => vector_math(params, &slots, ctx)?.into(),
        NodeSpec::VectorDot { params } => vector_dot(params, &slots, ctx)?.into(),
        NodeSpec::VectorToIntensity { params } => {
            slots.vector(0)?.to_intensity(params.reduce).into()
        }
        NodeSpec::ColorCombine { params } => color_combine(params, &slots, ctx)?.into(),
        NodeSpec::ColorSplit { params } => slots.vector(0)?.channel(params.channel).into(),
        NodeSpec::Bezier { params } => params.curve.remap(slots.intensity(0)?)?.into(),
        NodeSpec::NormalMap { params } => {
            normals::generate(slots.intensity(0)?, params, ctx.cancel)?.into()
        }
        NodeSpec::Output => {
            let height = slots.intensity_arc(0)?;
            if let Some(normal) = slots.optional_vector(1)? {
                height.ensure_size(normal.size())?;
            }
            MapValue::Intensity(Arc::clone(height))
        }
        NodeSpec::Custom(node) => node.0.compute(inputs, ctx)?,
    };
    if value.port_type() != spec.output_type() {
        return Err(Error::TypeMismatch {
            expected: spec.output_type(),
            found: value.port_type(),
        });
    }
    Ok(value)
}

/// Typed view over the resolved inputs of one node.
struct Inputs<'a> {
    spec: &'a NodeSpec,
    inputs: &'a [Option<MapValue>],
}

impl<'a> Inputs<'a> {
    fn slot_name(&self, index: usize) -> String {
        self.spec
            .inputs()
            .get(index)
            .map_or_else(|| format!("#{index}"), |s| s.name.to_owned())
    }

    fn get(&self, index: usize) -> Option<&'a MapValue> {
        self.inputs.get(index).and_then(Option::as_ref)
    }

    fn optional_intensity(&self, index: usize) -> Result<Option<&'a Arc<IntensityMap>>> {
        match self.get(index) {
            None => Ok(None),
            Some(value) => value.as_intensity().map(Some).ok_or(Error::TypeMismatch {
                expected: PortType::Intensity,
                found: value.port_type(),
            }),
        }
    }

    fn optional_vector(&self, index: usize) -> Result<Option<&'a Arc<VectorMap>>> {
        match self.get(index) {
            None => Ok(None),
            Some(value) => value.as_vector().map(Some).ok_or(Error::TypeMismatch {
                expected: PortType::Vector,
                found: value.port_type(),
            }),
        }
    }

    fn intensity_arc(&self, index: usize) -> Result<&'a Arc<IntensityMap>> {
        self.optional_intensity(index)?
            .ok_or_else(|| Error::MissingInput {
                name: self.slot_name(index),
            })
    }

    fn intensity(&self, index: usize) -> Result<&'a IntensityMap> {
        self.intensity_arc(index).map(Arc::as_ref)
    }

    fn vector(&self, index: usize) -> Result<&'a VectorMap> {
        self.optional_vector(index)?
            .map(Arc::as_ref)
            .ok_or_else(|| Error::MissingInput {
                name: self.slot_name(index),
            })
    }
}

/// Size shared by all connected maps, or `fallback` when none is connected.
fn common_size(sizes: impl IntoIterator<Item = MapSize>, fallback: MapSize) -> Result<MapSize> {
    let mut common: Option<MapSize> = None;
    for size in sizes {
        match common {
            None => common = Some(size),
            Some(expected) if expected != size => {
                return Err(Error::DimensionMismatch {
                    expected,
                    found: size,
                })
            }
            Some(_) => {}
        }
    }
    Ok(common.unwrap_or(fallback))
}

fn texture(params: &TextureParams, ctx: &ComputeContext<'_>) -> Result<MapValue> {
    let source = ctx.textures.require(&params.texture_id)?;
    let converted = match (params.output, source) {
        (TextureOutput::Intensity(reduce), MapValue::Vector(map)) => {
            map.to_intensity(reduce).into()
        }
        (TextureOutput::Vector, MapValue::Intensity(map)) => {
            VectorMap::from_intensity(&map).into()
        }
        (_, same) => same,
    };
    let target = ctx.resolution();
    if !params.fit_resolution || converted.size() == target {
        return Ok(converted);
    }
    // The active resolution was validated against the configured limit.
    Ok(match converted {
        MapValue::Intensity(map) => map.resized(target, Resampling::Nearest).into(),
        MapValue::Vector(map) => map.resized(target, Resampling::Nearest).into(),
    })
}

#[inline]
fn logistic(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn clamp(params: &ClampParams, slots: &Inputs<'_>) -> Result<IntensityMap> {
    let input = slots.intensity(0)?;
    let min = slots.optional_intensity(1)?;
    let max = slots.optional_intensity(2)?;
    for bound in [min, max].into_iter().flatten() {
        input.ensure_size(bound.size())?;
    }
    let mode = params.mode;
    let (lo, hi) = (params.min, params.max);
    Ok(IntensityMap::from_fn(input.size(), |x, y| {
        let i = y * input.width() + x;
        let v = input.values()[i];
        let lo = min.map_or(lo, |m| m.values()[i]);
        let hi = max.map_or(hi, |m| m.values()[i]);
        match mode {
            ClampMode::Hard => v.max(lo).min(hi),
            ClampMode::Sigmoid => logistic(v) * (hi - lo) + lo,
        }
    }))
}

fn normalize(params: &NormalizeParams, input: &IntensityMap) -> IntensityMap {
    let (lo, hi) = input.min_max();
    let (target_min, target_max) = (params.target_min, params.target_max);
    let range = hi - lo;
    if !(range > f64::EPSILON) {
        return IntensityMap::uniform(input.size(), target_min);
    }
    input.map(|v| (v - lo) / range * (target_max - target_min) + target_min)
}

fn math(params: &MathParams, slots: &Inputs<'_>, ctx: &ComputeContext<'_>) -> Result<IntensityMap> {
    let op = params.op;
    let f = move |a: f64, b: f64| op.apply(a, b);
    let a = slots.optional_intensity(0)?.map(Arc::as_ref);
    let b = slots.optional_intensity(1)?.map(Arc::as_ref);
    match (a, b) {
        (Some(a), Some(b)) => a.transform(f, Operand::Map(b)),
        (Some(a), None) => a.transform(f, Operand::Constant(params.b)),
        (None, Some(b)) => {
            let fallback = params.a;
            Ok(b.map(|v| f(fallback, v)))
        }
        (None, None) => Ok(IntensityMap::uniform(
            ctx.resolution(),
            f(params.a, params.b),
        )),
    }
}

fn vector_math(
    params: &VectorMathParams,
    slots: &Inputs<'_>,
    ctx: &ComputeContext<'_>,
) -> Result<VectorMap> {
    let op = params.op;
    let f = move |a: DVec4, b: DVec4| op.apply(a, b);
    let a = slots.optional_vector(0)?.map(Arc::as_ref);
    let b = slots.optional_vector(1)?.map(Arc::as_ref);
    match (a, b) {
        (Some(a), Some(b)) => a.transform(f, Operand::Map(b)),
        (Some(a), None) => a.transform(f, Operand::Constant(params.b)),
        (None, Some(b)) => {
            let fallback = params.a;
            Ok(b.map(|v| f(fallback, v)))
        }
        (None, None) => Ok(VectorMap::new(ctx.resolution(), f(params.a, params.b))),
    }
}

fn vector_dot(
    params: &VectorDotParams,
    slots: &Inputs<'_>,
    ctx: &ComputeContext<'_>,
) -> Result<IntensityMap> {
    let a = slots.optional_vector(0)?.map(Arc::as_ref);
    let b = slots.optional_vector(1)?.map(Arc::as_ref);
    match (a, b) {
        (Some(a), Some(b)) => a.zip_with(b, |x, y| x.dot(y)),
        (Some(a), None) => Ok(a.map_into(|x| x.dot(params.b))),
        (None, Some(b)) => Ok(b.map_into(|y| params.a.dot(y))),
        (None, None) => Ok(IntensityMap::uniform(
            ctx.resolution(),
            params.a.dot(params.b),
        )),
    }
}

fn color_combine(
    params: &ColorCombineParams,
    slots: &Inputs<'_>,
    ctx: &ComputeContext<'_>,
) -> Result<VectorMap> {
    let channels = [
        slots.optional_intensity(0)?,
        slots.optional_intensity(1)?,
        slots.optional_intensity(2)?,
        slots.optional_intensity(3)?,
    ];
    let fallbacks = [params.red, params.green, params.blue, params.alpha];
    let size = common_size(
        channels.iter().flatten().map(|m| m.size()),
        ctx.resolution(),
    )?;
    let pick = |c: usize, i: usize| channels[c].map_or(fallbacks[c], |m| m.values()[i]);
    Ok(VectorMap::from_fn(size, |x, y| {
        let i = y * size.width() + x;
        DVec4::new(pick(0, i), pick(1, i), pick(2, i), pick(3, i))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MathOp;
    use crate::kernels::bezier::{BezierCurve, BezierSpline};
    use crate::maps::{Channel, ChannelReduce};
    use glam::DVec2;

    struct Fixture {
        config: GraphConfig,
        textures: TextureRegistry,
        cancel: CancelToken,
    }

    impl Fixture {
        fn new(side: usize) -> Self {
            let size = MapSize::square(side).expect("valid size");
            Self {
                config: GraphConfig::new().with_preview_resolution(size),
                textures: TextureRegistry::new(),
                cancel: CancelToken::new(),
            }
        }

        fn ctx(&self) -> ComputeContext<'_> {
            ComputeContext::new(&self.config, &self.textures, &self.cancel)
        }

        fn run(&self, spec: &NodeSpec, inputs: &[Option<MapValue>]) -> Result<MapValue> {
            compute_output(spec, inputs, &self.ctx())
        }
    }

    fn intensity(value: &MapValue) -> &IntensityMap {
        value.as_intensity().expect("intensity output")
    }

    fn vector(value: &MapValue) -> &VectorMap {
        value.as_vector().expect("vector output")
    }

    fn uniform(side: usize, v: f64) -> MapValue {
        IntensityMap::uniform(MapSize::square(side).expect("valid size"), v).into()
    }

    fn row(values: &[f64]) -> MapValue {
        let size = MapSize::new(values.len(), 1).expect("valid size");
        IntensityMap::from_values(size, values.to_vec())
            .expect("valid")
            .into()
    }

    #[test]
    fn constants_use_active_resolution() {
        let fx = Fixture::new(8);
        let out = fx.run(&NodeSpec::constant(0.25), &[]).expect("constant");
        let map = intensity(&out);
        assert_eq!(map.size(), fx.config.active_resolution());
        assert!(map.values().iter().all(|v| *v == 0.25));
        let out = fx
            .run(&NodeSpec::constant_vector(DVec4::ONE), &[])
            .expect("constant");
        assert_eq!(vector(&out).get(7, 7), Some(DVec4::ONE));
    }

    #[test]
    fn clamp_hard_and_sigmoid() {
        let fx = Fixture::new(4);
        let input = row(&[-1.0, 0.5, 2.0]);
        let out = fx
            .run(&NodeSpec::clamp(0.0, 1.0), &[Some(input.clone()), None, None])
            .expect("clamp");
        assert_eq!(intensity(&out).values(), &[0.0, 0.5, 1.0]);

        let sigmoid = NodeSpec::Clamp {
            params: ClampParams {
                min: 0.0,
                max: 2.0,
                mode: ClampMode::Sigmoid,
            },
        };
        let out = fx.run(&sigmoid, &[Some(row(&[0.0])), None, None]).expect("clamp");
        assert!((intensity(&out).values()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_bounds_from_maps() {
        let fx = Fixture::new(4);
        let input = row(&[0.0, 0.5, 1.0]);
        let lo = row(&[0.2, 0.6, 0.0]);
        let out = fx
            .run(&NodeSpec::clamp(0.0, 0.9), &[Some(input), Some(lo), None])
            .expect("clamp");
        assert_eq!(intensity(&out).values(), &[0.2, 0.6, 0.9]);
    }

    #[test]
    fn clamp_requires_input() {
        let fx = Fixture::new(4);
        let err = fx
            .run(&NodeSpec::clamp(0.0, 1.0), &[None, None, None])
            .expect_err("missing input");
        assert!(matches!(err, Error::MissingInput { ref name } if name == "input"));
    }

    #[test]
    fn normalize_rescales_and_handles_flat_maps() {
        let fx = Fixture::new(4);
        let out = fx
            .run(&NodeSpec::normalize(0.0, 10.0), &[Some(row(&[2.0, 3.0, 4.0]))])
            .expect("normalize");
        assert_eq!(intensity(&out).values(), &[0.0, 5.0, 10.0]);
        let out = fx
            .run(&NodeSpec::normalize(0.25, 1.0), &[Some(uniform(3, 7.0))])
            .expect("normalize");
        assert!(intensity(&out).values().iter().all(|v| *v == 0.25));
    }

    #[test]
    fn invert_subtracts_from_max() {
        let fx = Fixture::new(4);
        let out = fx
            .run(&NodeSpec::invert(), &[Some(row(&[0.0, 0.25, 1.0]))])
            .expect("invert");
        assert_eq!(intensity(&out).values(), &[1.0, 0.75, 0.0]);
    }

    #[test]
    fn math_with_fallbacks() {
        let fx = Fixture::new(2);
        let spec = NodeSpec::Math {
            params: MathParams {
                op: MathOp::Subtract,
                a: 10.0,
                b: 3.0,
            },
        };
        let out = fx.run(&spec, &[None, None]).expect("math");
        assert!(intensity(&out).values().iter().all(|v| *v == 7.0));
        let out = fx.run(&spec, &[Some(row(&[1.0, 2.0])), None]).expect("math");
        assert_eq!(intensity(&out).values(), &[-2.0, -1.0]);
        let out = fx.run(&spec, &[None, Some(row(&[1.0, 2.0]))]).expect("math");
        assert_eq!(intensity(&out).values(), &[9.0, 8.0]);
        let out = fx
            .run(&spec, &[Some(row(&[5.0, 5.0])), Some(row(&[1.0, 2.0]))])
            .expect("math");
        assert_eq!(intensity(&out).values(), &[4.0, 3.0]);
    }

    #[test]
    fn math_rejects_mismatched_inputs() {
        let fx = Fixture::new(2);
        let err = fx
            .run(
                &NodeSpec::math(MathOp::Add),
                &[Some(row(&[1.0, 2.0])), Some(row(&[1.0]))],
            )
            .expect_err("mismatch");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn color_combine_and_split() {
        let fx = Fixture::new(2);
        let red = row(&[0.1, 0.2]);
        let out = fx
            .run(&NodeSpec::color_combine(), &[Some(red), None, None, None])
            .expect("combine");
        let packed = vector(&out);
        assert_eq!(packed.size(), MapSize::new(2, 1).expect("valid size"));
        assert_eq!(packed.get(1, 0), Some(DVec4::new(0.2, 1.0, 1.0, 1.0)));

        let out = fx
            .run(&NodeSpec::color_split(Channel::R), &[Some(out.clone())])
            .expect("split");
        assert_eq!(intensity(&out).values(), &[0.1, 0.2]);
    }

    #[test]
    fn color_combine_checks_sizes() {
        let fx = Fixture::new(2);
        let err = fx
            .run(
                &NodeSpec::color_combine(),
                &[Some(row(&[0.0])), Some(row(&[0.0, 1.0])), None, None],
            )
            .expect_err("mismatch");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn vector_dot_and_reduce() {
        let fx = Fixture::new(2);
        let out = fx.run(&NodeSpec::vector_dot(), &[None, None]).expect("dot");
        assert!(intensity(&out).values().iter().all(|v| *v == 4.0));
        let v: MapValue =
            VectorMap::new(MapSize::new(1, 1).expect("valid"), DVec4::new(0.0, 1.0, 2.0, 3.0))
                .into();
        let out = fx
            .run(&NodeSpec::vector_to_intensity(ChannelReduce::Max), &[Some(v)])
            .expect("reduce");
        assert_eq!(intensity(&out).values(), &[2.0]);
    }

    #[test]
    fn bezier_remaps_cells() {
        let fx = Fixture::new(2);
        let steps = BezierSpline::new(vec![
            BezierCurve::linear(DVec2::ZERO, DVec2::new(0.5, 0.0)),
            BezierCurve::linear(DVec2::new(0.5, 0.0), DVec2::ONE),
        ])
        .expect("valid");
        let out = fx
            .run(&NodeSpec::bezier(steps), &[Some(row(&[0.25, 0.75, 1.0]))])
            .expect("bezier");
        let values = intensity(&out).values();
        assert!(values[0].abs() < 1e-9);
        assert!((values[1] - 0.5).abs() < 1e-9);
        assert!((values[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn texture_conversion_and_fit() {
        let mut fx = Fixture::new(4);
        let size = MapSize::new(2, 2).expect("valid size");
        fx.textures
            .register("rgb", VectorMap::new(size, DVec4::new(0.2, 0.4, 0.6, 1.0)));
        let spec = NodeSpec::texture("rgb", TextureOutput::Intensity(ChannelReduce::G));
        let out = fx.run(&spec, &[]).expect("texture");
        assert_eq!(out.size(), size);
        assert!(intensity(&out).values().iter().all(|v| *v == 0.4));

        let fitted = NodeSpec::Texture {
            params: TextureParams {
                texture_id: "rgb".into(),
                output: TextureOutput::Vector,
                fit_resolution: true,
            },
        };
        let out = fx.run(&fitted, &[]).expect("texture");
        assert_eq!(out.size(), fx.config.active_resolution());

        let registered = fx.textures.get("rgb").expect("registered");
        let unscaled = fx
            .run(&NodeSpec::texture("rgb", TextureOutput::Vector), &[])
            .expect("texture");
        assert!(unscaled.ptr_eq(&registered));
    }

    #[test]
    fn missing_texture_fails() {
        let fx = Fixture::new(2);
        let err = fx
            .run(&NodeSpec::texture("nope", TextureOutput::Vector), &[])
            .expect_err("missing");
        assert!(matches!(err, Error::MissingTexture { .. }));
    }

    #[test]
    fn output_passes_height_through() {
        let fx = Fixture::new(2);
        let height = uniform(2, 0.3);
        let out = fx
            .run(&NodeSpec::output(), &[Some(height.clone()), None])
            .expect("output");
        assert!(out.ptr_eq(&height));
    }

    #[test]
    fn output_rejects_normals_of_another_size() {
        let fx = Fixture::new(2);
        let normal: MapValue =
            VectorMap::new(MapSize::square(3).expect("valid"), DVec4::Z).into();
        let err = fx
            .run(&NodeSpec::output(), &[Some(uniform(2, 0.3)), Some(normal)])
            .expect_err("size mismatch");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn texture_fit_uses_configured_limit() {
        let mut fx = Fixture::new(2);
        let target = MapSize::with_max_cells(5, 3, 15).expect("within custom limit");
        fx.config = GraphConfig::new()
            .with_max_cells(15)
            .with_preview_resolution(target);
        fx.textures
            .register("mask", IntensityMap::uniform(MapSize::square(2).expect("valid"), 0.5));
        let spec = NodeSpec::Texture {
            params: TextureParams {
                texture_id: "mask".into(),
                output: TextureOutput::Intensity(ChannelReduce::R),
                fit_resolution: true,
            },
        };
        let out = fx.run(&spec, &[]).expect("texture");
        assert_eq!(out.size(), target);
    }

    #[test]
    fn wrong_input_type_is_reported() {
        let fx = Fixture::new(2);
        let v: MapValue = VectorMap::new(MapSize::new(1, 1).expect("valid"), DVec4::ONE).into();
        let err = fx.run(&NodeSpec::invert(), &[Some(v)]).expect_err("type");
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }
}

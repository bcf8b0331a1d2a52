#![forbid(unsafe_code)]
//! terrain_graph: node-graph engine for procedural terrain heightmaps and normal maps.
//!
//! Modules:
//! - maps: dense intensity and vector grids with resampling and element-wise transforms
//! - kernels: simplex noise, hydraulic erosion, normal derivation, bezier remapping, blur
//! - graph: typed nodes, connections, cached incremental evaluation and background workers
//! - config: preview/render resolutions and size limits
//!
//! For examples, see the README and the `terrain_graph_examples` crate.
pub mod config;
pub mod error;
pub mod graph;
pub mod kernels;
pub mod maps;

/// Convenient re-exports for common types. Import with `use terrain_graph::prelude::*;`.
pub mod prelude {
    pub use crate::config::{GraphConfig, ResolutionMode};
    pub use crate::error::{Error, Result};
    pub use crate::graph::{
        ClampMode, ComputeContext, CustomNode, Evaluation, InputSlot, MapValue, MathOp,
        NodeBehavior, NodeGraph, NodeId, NodeSpec, NodeState, OutputMaps, ParamValue, Parameter,
        PassStats, PortType, TextureOutput, TextureParams, TextureRegistry, VectorMathOp,
    };
    pub use crate::kernels::bezier::{BezierCurve, BezierSpline};
    pub use crate::kernels::erosion::{ErosionOutput, ErosionParams};
    pub use crate::kernels::noise::NoiseParams;
    pub use crate::kernels::normals::{GradientMethod, NormalEncoding, NormalParams};
    pub use crate::kernels::smooth::{SmoothKernel, SmoothParams};
    pub use crate::kernels::CancelToken;
    pub use crate::maps::{
        Channel, ChannelReduce, Grid, IntensityMap, MapSize, Operand, Resampling, VectorMap,
    };
}

//! Node graph: typed nodes, port connections, cached evaluation and background workers.
//!
//! - Describe nodes with [`NodeSpec`] and its parameter structs.
//! - Wire and evaluate them with [`NodeGraph`].
//! - Feed imported images in through the graph's [`TextureRegistry`].
//! - Extend the node library by implementing [`NodeBehavior`].
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::maps::{IntensityMap, MapSize, VectorMap};

pub mod compute;
pub mod engine;
pub mod node;
pub mod params;
pub mod texture;
pub mod worker;

pub use compute::{compute_output, ComputeContext};
pub use engine::{Connection, Evaluation, NodeGraph, NodeState, OutputMaps, PassStats};
pub use node::{
    BezierParams, ClampMode, ClampParams, ColorCombineParams, ColorSplitParams,
    ConstantValueParams, ConstantVectorParams, CustomNode, InvertParams, MathOp, MathParams,
    NodeBehavior, NodeSpec, NormalizeParams, TextureOutput, TextureParams, VectorDotParams,
    VectorMathOp, VectorMathParams, VectorToIntensityParams,
};
pub use params::{Choice, ParamValue, Parameter};
pub use texture::TextureRegistry;

/// Stable handle of a node inside one [`NodeGraph`]. Handles are never reused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of map carried by a port.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortType {
    Intensity,
    Vector,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::Intensity => f.write_str("intensity"),
            PortType::Vector => f.write_str("vector"),
        }
    }
}

/// Input slot of a node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSlot {
    pub name: &'static str,
    pub port_type: PortType,
    /// Evaluation fails while a required slot is unconnected. Optional slots fall back to a
    /// node parameter.
    pub required: bool,
}

impl InputSlot {
    pub const fn required(name: &'static str, port_type: PortType) -> Self {
        Self {
            name,
            port_type,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, port_type: PortType) -> Self {
        Self {
            name,
            port_type,
            required: false,
        }
    }
}

/// Map travelling along a connection. Clones share the underlying map.
#[derive(Clone, Debug)]
pub enum MapValue {
    Intensity(Arc<IntensityMap>),
    Vector(Arc<VectorMap>),
}

impl MapValue {
    pub fn port_type(&self) -> PortType {
        match self {
            MapValue::Intensity(_) => PortType::Intensity,
            MapValue::Vector(_) => PortType::Vector,
        }
    }

    pub fn size(&self) -> MapSize {
        match self {
            MapValue::Intensity(m) => m.size(),
            MapValue::Vector(m) => m.size(),
        }
    }

    pub fn as_intensity(&self) -> Option<&Arc<IntensityMap>> {
        match self {
            MapValue::Intensity(m) => Some(m),
            MapValue::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Arc<VectorMap>> {
        match self {
            MapValue::Vector(m) => Some(m),
            MapValue::Intensity(_) => None,
        }
    }

    /// `true` if both values point at the same allocation.
    pub fn ptr_eq(&self, other: &MapValue) -> bool {
        match (self, other) {
            (MapValue::Intensity(a), MapValue::Intensity(b)) => Arc::ptr_eq(a, b),
            (MapValue::Vector(a), MapValue::Vector(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<IntensityMap> for MapValue {
    fn from(map: IntensityMap) -> Self {
        MapValue::Intensity(Arc::new(map))
    }
}

impl From<VectorMap> for MapValue {
    fn from(map: VectorMap) -> Self {
        MapValue::Vector(Arc::new(map))
    }
}

impl From<Arc<IntensityMap>> for MapValue {
    fn from(map: Arc<IntensityMap>) -> Self {
        MapValue::Intensity(map)
    }
}

impl From<Arc<VectorMap>> for MapValue {
    fn from(map: Arc<VectorMap>) -> Self {
        MapValue::Vector(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec4;

    #[test]
    fn map_value_reports_type_and_size() {
        let size = MapSize::new(3, 2).expect("valid size");
        let intensity = MapValue::from(IntensityMap::uniform(size, 1.0));
        let vector = MapValue::from(VectorMap::new(size, DVec4::ONE));
        assert_eq!(intensity.port_type(), PortType::Intensity);
        assert_eq!(vector.port_type(), PortType::Vector);
        assert_eq!(vector.size(), size);
        assert!(intensity.as_vector().is_none());
    }

    #[test]
    fn clones_share_storage() {
        let size = MapSize::new(2, 2).expect("valid size");
        let a = MapValue::from(IntensityMap::uniform(size, 0.0));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        let c = MapValue::from(IntensityMap::uniform(size, 0.0));
        assert!(!a.ptr_eq(&c));
    }
}

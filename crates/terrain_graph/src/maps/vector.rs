use glam::DVec4;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Grid, IntensityMap};
use crate::error::Result;

/// Dense grid of 4-component vectors (normals, colors).
pub type VectorMap = Grid<DVec4>;

/// Single vector component.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Channel {
    #[default]
    R,
    G,
    B,
    A,
}

impl Channel {
    #[inline]
    pub fn pick(self, v: DVec4) -> f64 {
        match self {
            Channel::R => v.x,
            Channel::G => v.y,
            Channel::B => v.z,
            Channel::A => v.w,
        }
    }
}

/// Reduction of a vector to one intensity.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChannelReduce {
    R,
    G,
    B,
    A,
    /// Mean of the rgb components.
    #[default]
    Average,
    /// Smallest rgb component.
    Min,
    /// Largest rgb component.
    Max,
}

impl ChannelReduce {
    #[inline]
    pub fn reduce(self, v: DVec4) -> f64 {
        match self {
            ChannelReduce::R => v.x,
            ChannelReduce::G => v.y,
            ChannelReduce::B => v.z,
            ChannelReduce::A => v.w,
            ChannelReduce::Average => (v.x + v.y + v.z) / 3.0,
            ChannelReduce::Min => v.x.min(v.y).min(v.z),
            ChannelReduce::Max => v.x.max(v.y).max(v.z),
        }
    }
}

impl From<Channel> for ChannelReduce {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::R => ChannelReduce::R,
            Channel::G => ChannelReduce::G,
            Channel::B => ChannelReduce::B,
            Channel::A => ChannelReduce::A,
        }
    }
}

impl Grid<DVec4> {
    /// Reduces every vector to an intensity.
    pub fn to_intensity(&self, reduce: ChannelReduce) -> IntensityMap {
        self.map_into(|v| reduce.reduce(v))
    }

    /// Extracts one component.
    pub fn channel(&self, channel: Channel) -> IntensityMap {
        self.map_into(|v| channel.pick(v))
    }

    /// Packs four equally sized intensity maps into `(r, g, b, a)` vectors.
    pub fn from_channels(channels: [&IntensityMap; 4]) -> Result<Self> {
        let [r, g, b, a] = channels;
        let rg = r.zip_with(g, |x, y| DVec4::new(x, y, 0.0, 0.0))?;
        let rgb = rg.zip_with(b, |v, z| DVec4::new(v.x, v.y, z, 0.0))?;
        rgb.zip_with(a, |v, w| DVec4::new(v.x, v.y, v.z, w))
    }

    /// Grey vectors `(v, v, v, 1)` from an intensity map.
    pub fn from_intensity(map: &IntensityMap) -> Self {
        map.map_into(|v| DVec4::new(v, v, v, 1.0))
    }
}

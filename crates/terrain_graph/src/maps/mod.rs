//! Dense 2-D maps flowing between graph nodes.
//!
//! - [`Grid`] is the generic row-major storage with `(0, 0)` at the top-left corner.
//! - [`IntensityMap`] stores one `f64` per cell (heights, masks).
//! - [`VectorMap`] stores one [`DVec4`](glam::DVec4) per cell (normals, colors).
//! - [`MapSize`] is a validated width/height pair.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

mod grid;
mod intensity;
mod vector;

pub use grid::{Grid, Operand, Texel};
pub use intensity::IntensityMap;
pub use vector::{Channel, ChannelReduce, VectorMap};

/// Upper bound on `width * height` applied by [`MapSize::new`].
pub const DEFAULT_MAX_CELLS: usize = 1 << 26;

/// Width and height of a map in cells. Both are non-zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawSize"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapSize {
    width: usize,
    height: usize,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawSize {
    width: usize,
    height: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSize> for MapSize {
    type Error = Error;

    fn try_from(raw: RawSize) -> Result<Self> {
        MapSize::new(raw.width, raw.height)
    }
}

impl MapSize {
    pub(crate) const PREVIEW: MapSize = MapSize {
        width: 256,
        height: 256,
    };

    pub(crate) const RENDER: MapSize = MapSize {
        width: 1024,
        height: 1024,
    };

    /// Creates a size bounded by [`DEFAULT_MAX_CELLS`].
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_max_cells(width, height, DEFAULT_MAX_CELLS)
    }

    /// Creates a size bounded by `max_cells`.
    pub fn with_max_cells(width: usize, height: usize, max_cells: usize) -> Result<Self> {
        let fits = width
            .checked_mul(height)
            .is_some_and(|cells| cells <= max_cells);
        if width == 0 || height == 0 || !fits {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// Creates a square size.
    pub fn square(side: usize) -> Result<Self> {
        Self::new(side, side)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    #[inline]
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Returns an error if this size holds more than `max_cells` cells.
    pub fn check_limit(&self, max_cells: usize) -> Result<()> {
        if self.cells() > max_cells {
            return Err(Error::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for MapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resampling filter used by [`Grid::scaled_with`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Resampling {
    /// Nearest texel centre. Exact for identity scale.
    #[default]
    Nearest,
    /// Bilinear blend of the four surrounding texel centres.
    Bilinear,
}

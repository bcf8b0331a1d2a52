//! Generic dense grid storage shared by intensity and vector maps.
use std::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{MapSize, Resampling};
use crate::error::{Error, Result};

/// Cell value stored in a [`Grid`].
pub trait Texel: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Linear blend between `a` and `b`.
    fn lerp(a: Self, b: Self, t: f64) -> Self;
}

impl Texel for f64 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Texel for glam::DVec4 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a.lerp(b, t)
    }
}

/// Right-hand side of [`Grid::transform`].
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a, T> {
    Constant(T),
    Map(&'a Grid<T>),
}

/// Row-major 2-D grid. `(0, 0)` is the top-left cell and `y` grows downward.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        try_from = "RawGrid<T>",
        bound(deserialize = "T: Texel + Deserialize<'de>")
    )
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    size: MapSize,
    values: Vec<T>,
}

/// Unchecked wire form of a [`Grid`]; deserialization goes through [`Grid::from_values`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawGrid<T> {
    size: MapSize,
    values: Vec<T>,
}

#[cfg(feature = "serde")]
impl<T: Texel> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = Error;

    fn try_from(raw: RawGrid<T>) -> Result<Self> {
        Grid::from_values(raw.size, raw.values)
    }
}

impl<T: Texel> Grid<T> {
    /// Creates a grid with every cell set to `fill`.
    pub fn new(size: MapSize, fill: T) -> Self {
        Self {
            size,
            values: vec![fill; size.cells()],
        }
    }

    /// Wraps row-major `values`; the length must equal `width * height`.
    pub fn from_values(size: MapSize, values: Vec<T>) -> Result<Self> {
        if values.len() != size.cells() {
            return Err(Error::LengthMismatch {
                expected: size.cells(),
                found: values.len(),
            });
        }
        Ok(Self { size, values })
    }

    /// Builds a grid by calling `f(x, y)` for every cell in row-major order.
    pub fn from_fn(size: MapSize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut values = Vec::with_capacity(size.cells());
        for y in 0..size.height() {
            for x in 0..size.width() {
                values.push(f(x, y));
            }
        }
        Self { size, values }
    }

    #[inline]
    pub fn size(&self) -> MapSize {
        self.size
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.size.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.size.height()
    }

    /// Row-major cell values.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.size.width() + x
    }

    /// Value at `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.values[self.index(x, y)])
    }

    /// Value at `(x, y)` with coordinates clamped to the grid edges.
    #[inline]
    pub fn get_clamped(&self, x: isize, y: isize) -> T {
        let cx = x.clamp(0, self.width() as isize - 1) as usize;
        let cy = y.clamp(0, self.height() as isize - 1) as usize;
        self.values[self.index(cx, cy)]
    }

    /// Writes `value` at `(x, y)`. Returns `false` if the cell is outside the grid.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }
        let i = self.index(x, y);
        self.values[i] = value;
        true
    }

    /// `true` if every cell holds the same value.
    pub fn is_uniform(&self) -> bool {
        let first = self.values[0];
        self.values.iter().all(|v| *v == first)
    }

    /// Returns an error unless `other` has the same size as this grid.
    pub fn ensure_size(&self, other: MapSize) -> Result<()> {
        if self.size != other {
            return Err(Error::DimensionMismatch {
                expected: self.size,
                found: other,
            });
        }
        Ok(())
    }

    /// Applies `f` to every cell.
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            size: self.size,
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Applies `f` to every cell, producing a grid of another texel type.
    pub fn map_into<U: Texel>(&self, f: impl Fn(T) -> U) -> Grid<U> {
        Grid {
            size: self.size,
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Combines two grids of the same size cell by cell.
    pub fn zip_with<U: Texel, V: Texel>(
        &self,
        other: &Grid<U>,
        f: impl Fn(T, U) -> V,
    ) -> Result<Grid<V>> {
        self.ensure_size(other.size())?;
        Ok(Grid {
            size: self.size,
            values: self
                .values
                .iter()
                .zip(other.values())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        })
    }

    /// Element-wise `f(self, operand)` into a new grid. The receiver is left untouched.
    pub fn transform(&self, f: impl Fn(T, T) -> T, operand: Operand<'_, T>) -> Result<Self> {
        match operand {
            Operand::Constant(c) => Ok(self.map(|v| f(v, c))),
            Operand::Map(other) => self.zip_with(other, f),
        }
    }

    /// Element-wise `f(self, operand)` in place. Nothing is written if the sizes differ.
    pub fn transform_in_place(
        &mut self,
        f: impl Fn(T, T) -> T,
        operand: Operand<'_, T>,
    ) -> Result<()> {
        match operand {
            Operand::Constant(c) => {
                for v in &mut self.values {
                    *v = f(*v, c);
                }
            }
            Operand::Map(other) => {
                self.ensure_size(other.size())?;
                for (v, o) in self.values.iter_mut().zip(other.values()) {
                    *v = f(*v, *o);
                }
            }
        }
        Ok(())
    }

    /// Resampled copy using nearest texel centres.
    pub fn scaled(&self, width: usize, height: usize) -> Result<Self> {
        self.scaled_with(width, height, Resampling::Nearest)
    }

    /// Resampled copy using the given filter. The target is bounded by
    /// [`DEFAULT_MAX_CELLS`](super::DEFAULT_MAX_CELLS); see [`resized`](Self::resized).
    pub fn scaled_with(&self, width: usize, height: usize, filter: Resampling) -> Result<Self> {
        Ok(self.resized(MapSize::new(width, height)?, filter))
    }

    /// Resampled copy at an already validated `target` size.
    pub fn resized(&self, target: MapSize, filter: Resampling) -> Self {
        if target == self.size {
            return self.clone();
        }
        let sx = self.width() as f64 / target.width() as f64;
        let sy = self.height() as f64 / target.height() as f64;
        match filter {
            Resampling::Nearest => Self::from_fn(target, |x, y| {
                let src_x = (((x as f64 + 0.5) * sx) as usize).min(self.width() - 1);
                let src_y = (((y as f64 + 0.5) * sy) as usize).min(self.height() - 1);
                self.values[self.index(src_x, src_y)]
            }),
            Resampling::Bilinear => Self::from_fn(target, |x, y| {
                self.sample_bilinear((x as f64 + 0.5) * sx - 0.5, (y as f64 + 0.5) * sy - 0.5)
            }),
        }
    }

    /// Bilinear sample at continuous texel coordinates, clamped to the edges.
    pub fn sample_bilinear(&self, fx: f64, fy: f64) -> T {
        let fx = fx.clamp(0.0, (self.width() - 1) as f64);
        let fy = fy.clamp(0.0, (self.height() - 1) as f64);
        let x0 = fx.floor() as isize;
        let y0 = fy.floor() as isize;
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;
        let top = T::lerp(
            self.get_clamped(x0, y0),
            self.get_clamped(x0 + 1, y0),
            tx,
        );
        let bottom = T::lerp(
            self.get_clamped(x0, y0 + 1),
            self.get_clamped(x0 + 1, y0 + 1),
            tx,
        );
        T::lerp(top, bottom, ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: usize, h: usize) -> MapSize {
        MapSize::new(w, h).expect("valid size")
    }

    fn ramp(w: usize, h: usize) -> Grid<f64> {
        Grid::from_fn(size(w, h), |x, y| (y * w + x) as f64)
    }

    #[test]
    fn from_values_checks_length() {
        let err = Grid::from_values(size(2, 2), vec![0.0; 3]).expect_err("length mismatch");
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 4,
                found: 3
            }
        ));
        let err = Grid::from_values(size(1, 1), vec![0.0; 5]).expect_err("too long");
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 1,
                found: 5
            }
        ));
        let grid = Grid::from_values(size(2, 2), vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
        assert_eq!(grid.get(1, 1), Some(4.0));
    }

    #[test]
    fn origin_is_top_left_and_row_major() {
        let grid = ramp(3, 2);
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(2, 0), Some(2.0));
        assert_eq!(grid.get(0, 1), Some(3.0));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn clamped_lookup_stays_on_edges() {
        let grid = ramp(3, 2);
        assert_eq!(grid.get_clamped(-5, -5), 0.0);
        assert_eq!(grid.get_clamped(10, 10), 5.0);
    }

    #[test]
    fn set_rejects_out_of_bounds() {
        let mut grid = Grid::new(size(2, 2), 0.0);
        assert!(grid.set(1, 0, 7.0));
        assert!(!grid.set(2, 0, 7.0));
        assert_eq!(grid.values(), &[0.0, 7.0, 0.0, 0.0]);
    }

    #[test]
    fn transform_with_constant_and_map() {
        let a = ramp(2, 2);
        let b = Grid::new(size(2, 2), 10.0);
        let added = a.transform(|x, y| x + y, Operand::Constant(1.0)).expect("constant");
        assert_eq!(added.values(), &[1.0, 2.0, 3.0, 4.0]);
        let summed = a.transform(|x, y| x + y, Operand::Map(&b)).expect("same size");
        assert_eq!(summed.values(), &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn transform_mismatch_fails_and_leaves_receiver_untouched() {
        let mut a = ramp(2, 2);
        let b = Grid::new(size(3, 2), 1.0);
        let before = a.clone();
        let err = a
            .transform(|x, y| x + y, Operand::Map(&b))
            .expect_err("mismatch");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        let err = a
            .transform_in_place(|x, y| x + y, Operand::Map(&b))
            .expect_err("mismatch");
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(a, before);
    }

    #[test]
    fn scaled_has_requested_size() {
        let grid = ramp(4, 4);
        let up = grid.scaled(9, 5).expect("upscale");
        assert_eq!((up.width(), up.height()), (9, 5));
        let down = grid.scaled_with(2, 3, Resampling::Bilinear).expect("downscale");
        assert_eq!((down.width(), down.height()), (2, 3));
    }

    #[test]
    fn identity_scale_is_exact() {
        let grid = ramp(5, 3);
        assert_eq!(grid.scaled(5, 3).expect("identity"), grid);
        assert_eq!(
            grid.scaled_with(5, 3, Resampling::Bilinear).expect("identity"),
            grid
        );
    }

    #[test]
    fn resized_accepts_sizes_with_their_own_limit() {
        let target = MapSize::with_max_cells(6, 2, 12).expect("within custom limit");
        let grid = ramp(3, 1);
        let out = grid.resized(target, Resampling::Nearest);
        assert_eq!(out.size(), target);
        assert_eq!(&out.values()[..6], &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn nearest_upscale_repeats_texels() {
        let grid = Grid::from_values(size(2, 1), vec![1.0, 2.0]).expect("valid");
        let up = grid.scaled(4, 1).expect("upscale");
        assert_eq!(up.values(), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn scaled_rejects_zero_size() {
        let grid = ramp(2, 2);
        assert!(matches!(
            grid.scaled(0, 2),
            Err(Error::InvalidDimension { .. })
        ));
    }

    #[test]
    fn bilinear_sample_blends_neighbours() {
        let grid = Grid::from_values(size(2, 1), vec![0.0, 1.0]).expect("valid");
        assert!((grid.sample_bilinear(0.25, 0.0) - 0.25).abs() < 1e-12);
        assert_eq!(grid.sample_bilinear(-1.0, 0.0), 0.0);
        assert_eq!(grid.sample_bilinear(3.0, 0.0), 1.0);
    }

    #[test]
    fn uniform_detection() {
        assert!(Grid::new(size(3, 3), 0.5).is_uniform());
        assert!(!ramp(2, 2).is_uniform());
    }
}

//! Tangent-space normal maps derived from height gradients.
use glam::{DVec2, DVec3, DVec4};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ensure_finite, CancelToken};
use crate::error::{Error, Result};
use crate::maps::{IntensityMap, VectorMap};

/// Finite-difference operator used for the height gradient.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GradientMethod {
    /// 3x3 Sobel operator.
    #[default]
    Sobel,
    /// Difference of the two direct neighbours.
    CentralDifference,
}

/// How normals are written into the vector map.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormalEncoding {
    /// Components in `[-1, 1]`.
    #[default]
    Signed,
    /// Components remapped to `[0, 1]` for storage in images.
    Unsigned,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NormalParams {
    /// Height exaggeration applied to the gradient.
    pub strength: f64,
    /// Distance between neighbouring texels in height units.
    pub texel_spacing: f64,
    pub method: GradientMethod,
    pub encoding: NormalEncoding,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self {
            strength: 1.0,
            texel_spacing: 1.0,
            method: GradientMethod::Sobel,
            encoding: NormalEncoding::Signed,
        }
    }
}

impl NormalParams {
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_method(mut self, method: GradientMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_encoding(mut self, encoding: NormalEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Validates the parameters, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        ensure_finite("strength", self.strength)?;
        ensure_finite("texel_spacing", self.texel_spacing)?;
        if self.texel_spacing <= 0.0 {
            return Err(Error::InvalidConfig("texel_spacing must be > 0".into()));
        }
        Ok(())
    }
}

/// Height gradient at `(x, y)` with edge-clamped lookups.
pub fn gradient(heights: &IntensityMap, x: usize, y: usize, params: &NormalParams) -> DVec2 {
    let (x, y) = (x as isize, y as isize);
    let h = |dx: isize, dy: isize| heights.get_clamped(x + dx, y + dy);
    match params.method {
        GradientMethod::Sobel => {
            let dx = (h(1, -1) + 2.0 * h(1, 0) + h(1, 1)) - (h(-1, -1) + 2.0 * h(-1, 0) + h(-1, 1));
            let dy = (h(-1, 1) + 2.0 * h(0, 1) + h(1, 1)) - (h(-1, -1) + 2.0 * h(0, -1) + h(1, -1));
            DVec2::new(dx, dy) / (8.0 * params.texel_spacing)
        }
        GradientMethod::CentralDifference => {
            DVec2::new(h(1, 0) - h(-1, 0), h(0, 1) - h(0, -1)) / (2.0 * params.texel_spacing)
        }
    }
}

/// Unit normal for a gradient. The z component is always positive.
#[inline]
pub fn normal_from_gradient(gradient: DVec2, strength: f64) -> DVec3 {
    DVec3::new(-gradient.x * strength, -gradient.y * strength, 1.0).normalize()
}

#[inline]
pub fn encode(normal: DVec3, encoding: NormalEncoding) -> DVec4 {
    let n = match encoding {
        NormalEncoding::Signed => normal,
        NormalEncoding::Unsigned => (normal + DVec3::ONE) * 0.5,
    };
    n.extend(1.0)
}

/// Derives a normal map the size of `heights`.
pub fn generate(
    heights: &IntensityMap,
    params: &NormalParams,
    cancel: &CancelToken,
) -> Result<VectorMap> {
    params.validate()?;
    let size = heights.size();
    let mut values = Vec::with_capacity(size.cells());
    for y in 0..size.height() {
        cancel.check()?;
        for x in 0..size.width() {
            let n = normal_from_gradient(gradient(heights, x, y, params), params.strength);
            values.push(encode(n, params.encoding));
        }
    }
    VectorMap::from_values(size, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::MapSize;

    fn size(w: usize, h: usize) -> MapSize {
        MapSize::new(w, h).expect("valid size")
    }

    #[test]
    fn flat_input_points_straight_up() {
        let flat = IntensityMap::uniform(size(8, 5), 0.4);
        let normals = generate(&flat, &NormalParams::default(), &CancelToken::new()).expect("normals");
        assert!(normals.values().iter().all(|n| *n == DVec4::new(0.0, 0.0, 1.0, 1.0)));

        let params = NormalParams::default().with_encoding(NormalEncoding::Unsigned);
        let normals = generate(&flat, &params, &CancelToken::new()).expect("normals");
        assert!(normals.values().iter().all(|n| *n == DVec4::new(0.5, 0.5, 1.0, 1.0)));
    }

    #[test]
    fn slope_tilts_against_the_gradient() {
        let ramp = IntensityMap::from_fn(size(6, 6), |x, _| x as f64);
        for method in [GradientMethod::Sobel, GradientMethod::CentralDifference] {
            let params = NormalParams::default().with_method(method);
            let g = gradient(&ramp, 3, 3, &params);
            assert!((g.x - 1.0).abs() < 1e-12, "{method:?} gave {g}");
            assert!(g.y.abs() < 1e-12);
            let normals = generate(&ramp, &params, &CancelToken::new()).expect("normals");
            let n = normals.get(3, 3).expect("in bounds");
            assert!(n.x < 0.0 && n.z > 0.0);
            assert!((n.truncate().length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn strength_steepens_normals() {
        let ramp = IntensityMap::from_fn(size(4, 4), |x, _| x as f64 * 0.1);
        let soft = generate(&ramp, &NormalParams::default(), &CancelToken::new()).expect("normals");
        let steep = generate(
            &ramp,
            &NormalParams::default().with_strength(10.0),
            &CancelToken::new(),
        )
        .expect("normals");
        let a = soft.get(1, 1).expect("in bounds");
        let b = steep.get(1, 1).expect("in bounds");
        assert!(b.z < a.z);
    }

    #[test]
    fn single_cell_map_is_flat() {
        let one = IntensityMap::uniform(size(1, 1), 3.0);
        let normals = generate(&one, &NormalParams::default(), &CancelToken::new()).expect("normals");
        assert_eq!(normals.get(0, 0), Some(DVec4::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn non_positive_spacing_is_invalid() {
        let params = NormalParams {
            texel_spacing: 0.0,
            ..NormalParams::default()
        };
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn cancellation_is_observed() {
        let heights = IntensityMap::uniform(size(4, 4), 0.0);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            generate(&heights, &NormalParams::default(), &cancel),
            Err(Error::Cancelled)
        ));
    }
}

//! Separable blur with clamped edges.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ensure_finite;
use crate::error::{Error, Result};
use crate::maps::IntensityMap;

/// Largest accepted kernel half-width, in cells.
pub const MAX_RADIUS: usize = 4096;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SmoothKernel {
    /// Equal weights.
    #[default]
    Box,
    /// Gaussian weights with `sigma`.
    Gaussian,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothParams {
    /// Half-width of the kernel in cells. `0` leaves the map unchanged.
    pub radius: usize,
    pub kernel: SmoothKernel,
    /// Standard deviation for [`SmoothKernel::Gaussian`], in cells.
    pub sigma: f64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            radius: 1,
            kernel: SmoothKernel::Box,
            sigma: 1.0,
        }
    }
}

impl SmoothParams {
    pub fn new(radius: usize, kernel: SmoothKernel) -> Self {
        Self {
            radius,
            kernel,
            ..Self::default()
        }
    }

    /// Validates the parameters, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.radius > MAX_RADIUS {
            return Err(Error::InvalidConfig(format!(
                "radius must be <= {MAX_RADIUS}, got {}",
                self.radius
            )));
        }
        if self.kernel == SmoothKernel::Gaussian {
            ensure_finite("sigma", self.sigma)?;
            if self.sigma <= 0.0 {
                return Err(Error::InvalidConfig("sigma must be > 0".into()));
            }
        }
        Ok(())
    }

    /// Normalized 1-D weights of length `2 * radius + 1`.
    pub fn weights(&self) -> Vec<f64> {
        let r = self.radius as f64;
        let raw: Vec<f64> = (0..=2 * self.radius)
            .map(|i| match self.kernel {
                SmoothKernel::Box => 1.0,
                SmoothKernel::Gaussian => {
                    let d = i as f64 - r;
                    (-(d * d) / (2.0 * self.sigma * self.sigma)).exp()
                }
            })
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect()
    }
}

/// Blurs `map` horizontally then vertically.
pub fn smooth(map: &IntensityMap, params: &SmoothParams) -> Result<IntensityMap> {
    params.validate()?;
    if params.radius == 0 || map.is_uniform() {
        return Ok(map.clone());
    }
    let weights = params.weights();
    let r = params.radius as isize;
    let horizontal = IntensityMap::from_fn(map.size(), |x, y| {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| w * map.get_clamped(x as isize + i as isize - r, y as isize))
            .sum()
    });
    Ok(IntensityMap::from_fn(map.size(), |x, y| {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| w * horizontal.get_clamped(x as isize, y as isize + i as isize - r))
            .sum()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::MapSize;

    fn size(w: usize, h: usize) -> MapSize {
        MapSize::new(w, h).expect("valid size")
    }

    #[test]
    fn radius_zero_is_identity() {
        let map = IntensityMap::from_fn(size(4, 4), |x, y| (x * y) as f64);
        let out = smooth(&map, &SmoothParams::new(0, SmoothKernel::Gaussian)).expect("smooth");
        assert_eq!(out, map);
    }

    #[test]
    fn weights_are_normalized() {
        for kernel in [SmoothKernel::Box, SmoothKernel::Gaussian] {
            let w = SmoothParams::new(3, kernel).weights();
            assert_eq!(w.len(), 7);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn spike_is_spread_and_bounded() {
        let mut map = IntensityMap::uniform(size(5, 5), 0.0);
        map.set(2, 2, 9.0);
        let out = smooth(&map, &SmoothParams::new(1, SmoothKernel::Box)).expect("smooth");
        assert!((out.get(2, 2).expect("in bounds") - 1.0).abs() < 1e-12);
        assert!((out.get(1, 1).expect("in bounds") - 1.0).abs() < 1e-12);
        assert_eq!(out.get(4, 4), Some(0.0));
        assert!((out.sum() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_maps_stay_uniform() {
        let map = IntensityMap::uniform(size(3, 6), 0.25);
        let out = smooth(&map, &SmoothParams::new(4, SmoothKernel::Gaussian)).expect("smooth");
        assert_eq!(out, map);
    }

    #[test]
    fn oversized_radius_is_invalid() {
        let map = IntensityMap::uniform(size(2, 2), 0.0);
        let params = SmoothParams::new(usize::MAX, SmoothKernel::Box);
        assert!(matches!(smooth(&map, &params), Err(Error::InvalidConfig(_))));
        assert!(SmoothParams::new(MAX_RADIUS, SmoothKernel::Box).validate().is_ok());
    }

    #[test]
    fn gaussian_needs_positive_sigma() {
        let params = SmoothParams {
            sigma: 0.0,
            ..SmoothParams::new(2, SmoothKernel::Gaussian)
        };
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
    }
}

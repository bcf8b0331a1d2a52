//! Seeded fractal simplex noise.
//!
//! Sample coordinates are expressed in map-relative units (`x / width`), so the preview and
//! render resolutions show the same terrain at different detail.
use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ensure_finite, CancelToken};
use crate::error::{Error, Result};
use crate::maps::{IntensityMap, MapSize};

const GRADIENTS: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Most octaves a generator accepts.
pub const MAX_OCTAVES: u32 = 32;

/// Largest sample coordinate magnitude. Skewing sums three of them.
const MAX_COORDINATE: f64 = 1e300;

/// Skewing factor for 3D simplex: `1/3`
const F3: f64 = 1.0 / 3.0;
/// Unskewing factor for 3D simplex: `1/6`
const G3: f64 = 1.0 / 6.0;

/// Parameters of the fractal noise generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseParams {
    pub seed: u64,
    /// Base frequency across the whole map.
    pub frequency: f64,
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Offset added to every sample position.
    pub offset: DVec3,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: 5.0,
            octaves: 8,
            persistence: 0.5,
            lacunarity: 2.0,
            offset: DVec3::ZERO,
        }
    }
}

impl NoiseParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    pub fn with_persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_lacunarity(mut self, lacunarity: f64) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    pub fn with_offset(mut self, offset: DVec3) -> Self {
        self.offset = offset;
        self
    }

    /// Validates the parameters, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(Error::InvalidConfig(format!(
                "octaves must be in 1..={MAX_OCTAVES}, got {}",
                self.octaves
            )));
        }
        ensure_finite("frequency", self.frequency)?;
        ensure_finite("persistence", self.persistence)?;
        ensure_finite("lacunarity", self.lacunarity)?;
        if !self.offset.is_finite() {
            return Err(Error::InvalidConfig("offset must be finite".into()));
        }
        let top = (self.octaves - 1) as i32;
        if !(self.frequency * self.lacunarity.powi(top)).is_finite() {
            return Err(Error::InvalidConfig(
                "frequency of the highest octave overflows".into(),
            ));
        }
        if !self.persistence.powi(top).is_finite() {
            return Err(Error::InvalidConfig(
                "amplitude of the highest octave overflows".into(),
            ));
        }
        Ok(())
    }
}

/// 3-D simplex noise over a seeded permutation table.
#[derive(Clone, Debug)]
pub struct SimplexNoise {
    perm: [u8; 512],
}

impl SimplexNoise {
    pub fn new(seed: u64) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut rng = StdRng::seed_from_u64(seed);
        for i in (1..table.len()).rev() {
            let j = (rng.next_u32() as usize) % (i + 1);
            table.swap(i, j);
        }
        let perm = std::array::from_fn(|i| table[i & 0xFF]);
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    #[inline]
    fn corner(&self, gradient: usize, x: f64, y: f64, z: f64) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            return 0.0;
        }
        let g = GRADIENTS[gradient];
        let t = t * t;
        t * t * (g[0] * x + g[1] * y + g[2] * z)
    }

    /// Noise value in roughly `[-1, 1]`.
    #[allow(clippy::many_single_char_names)]
    pub fn sample(&self, xin: f64, yin: f64, zin: f64) -> f64 {
        let s = (xin + yin + zin) * F3;
        let i = (xin + s).floor();
        let j = (yin + s).floor();
        let k = (zin + s).floor();
        let t = (i + j + k) * G3;
        let x0 = xin - (i - t);
        let y0 = yin - (j - t);
        let z0 = zin - (k - t);

        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + G3;
        let y1 = y0 - j1 as f64 + G3;
        let z1 = z0 - k1 as f64 + G3;
        let x2 = x0 - i2 as f64 + 2.0 * G3;
        let y2 = y0 - j2 as f64 + 2.0 * G3;
        let z2 = z0 - k2 as f64 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i64 & 0xFF) as usize;
        let jj = (j as i64 & 0xFF) as usize;
        let kk = (k as i64 & 0xFF) as usize;
        let gi0 = self.p(ii + self.p(jj + self.p(kk))) % 12;
        let gi1 = self.p(ii + i1 + self.p(jj + j1 + self.p(kk + k1))) % 12;
        let gi2 = self.p(ii + i2 + self.p(jj + j2 + self.p(kk + k2))) % 12;
        let gi3 = self.p(ii + 1 + self.p(jj + 1 + self.p(kk + 1))) % 12;

        32.0 * (self.corner(gi0, x0, y0, z0)
            + self.corner(gi1, x1, y1, z1)
            + self.corner(gi2, x2, y2, z2)
            + self.corner(gi3, x3, y3, z3))
    }

    /// Sum of `octaves` layers normalized by the amplitude sum, roughly `[-1, 1]`.
    pub fn fractal(&self, params: &NoiseParams, p: DVec3) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut norm = 0.0;
        for _ in 0..params.octaves {
            let q = p * frequency;
            // Finer octaves would overflow the skew sums.
            if !q.is_finite() || q.abs().max_element() > MAX_COORDINATE {
                break;
            }
            total += self.sample(q.x, q.y, q.z) * amplitude;
            norm += amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }
        if norm == 0.0 {
            return 0.0;
        }
        total / norm
    }
}

/// Renders fractal noise into a map with values in `[0, 1]`.
pub fn generate(size: MapSize, params: &NoiseParams, cancel: &CancelToken) -> Result<IntensityMap> {
    params.validate()?;
    let noise = SimplexNoise::new(params.seed);
    let (width, height) = (size.width() as f64, size.height() as f64);
    let mut values = Vec::with_capacity(size.cells());
    for y in 0..size.height() {
        cancel.check()?;
        for x in 0..size.width() {
            let p = DVec3::new(
                x as f64 / width * params.frequency,
                y as f64 / height * params.frequency,
                0.0,
            ) + params.offset;
            let v = noise.fractal(params, p);
            values.push(((v + 1.0) * 0.5).clamp(0.0, 1.0));
        }
    }
    IntensityMap::from_values(size, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(side: usize) -> MapSize {
        MapSize::square(side).expect("valid size")
    }

    #[test]
    fn same_seed_same_map() {
        let params = NoiseParams::default().with_seed(7);
        let a = generate(size(32), &params, &CancelToken::new()).expect("noise");
        let b = generate(size(32), &params, &CancelToken::new()).expect("noise");
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate(size(16), &NoiseParams::default(), &CancelToken::new()).expect("noise");
        let b = generate(
            size(16),
            &NoiseParams::default().with_seed(99),
            &CancelToken::new(),
        )
        .expect("noise");
        assert_ne!(a, b);
    }

    #[test]
    fn values_stay_in_unit_range() {
        let params = NoiseParams::default().with_octaves(3).with_frequency(11.0);
        let map = generate(size(64), &params, &CancelToken::new()).expect("noise");
        let (lo, hi) = map.min_max();
        assert!(lo >= 0.0 && hi <= 1.0, "range was [{lo}, {hi}]");
        assert!(hi > lo);
    }

    #[test]
    fn raw_sample_is_bounded() {
        let noise = SimplexNoise::new(3);
        for i in 0..500 {
            let f = i as f64 * 0.137;
            let v = noise.sample(f, -f * 0.7, f * 1.3 - 20.0);
            assert!(v.abs() <= 1.1, "sample {v} out of range");
        }
    }

    #[test]
    fn zero_octaves_is_invalid() {
        let params = NoiseParams::default().with_octaves(0);
        let err = generate(size(4), &params, &CancelToken::new()).expect_err("invalid");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn octave_count_is_bounded() {
        let params = NoiseParams::default().with_octaves(1100);
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
        let params = NoiseParams::default().with_octaves(MAX_OCTAVES);
        let map = generate(size(16), &params, &CancelToken::new()).expect("noise");
        assert!(map.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn overflowing_octaves_are_invalid() {
        let params = NoiseParams::default()
            .with_octaves(MAX_OCTAVES)
            .with_lacunarity(1e12);
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
        let params = NoiseParams::default()
            .with_octaves(MAX_OCTAVES)
            .with_persistence(1e12);
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn huge_coordinates_stay_in_unit_range() {
        let params = NoiseParams::default()
            .with_octaves(MAX_OCTAVES)
            .with_lacunarity(1e9)
            .with_offset(DVec3::splat(1e30));
        params.validate().expect("finite per-octave frequency");
        let map = generate(size(8), &params, &CancelToken::new()).expect("noise");
        assert!(map.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn non_finite_frequency_is_invalid() {
        let params = NoiseParams::default().with_frequency(f64::NAN);
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn cancelled_token_yields_no_map() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = generate(size(8), &NoiseParams::default(), &cancel).expect_err("cancelled");
        assert!(matches!(err, Error::Cancelled));
    }
}

//! Droplet-based hydraulic erosion.
//!
//! Each droplet starts at a seeded random position, follows the bilinear downhill gradient
//! with some inertia and carries sediment proportional to its speed, water and the local
//! slope. Erosion and deposition are spread over the four cells around the droplet.
//!
//! Material is only moved, never created: sediment still carried when a droplet dies is lost,
//! so the total height mass never increases.
use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{ensure_finite, rand01};
use crate::error::{Error, Result};
use crate::maps::IntensityMap;

/// Which map an erosion node emits.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErosionOutput {
    /// Eroded heights.
    #[default]
    Height,
    /// Accumulated deposited sediment per cell.
    Deposition,
    /// Accumulated removed material per cell.
    Erosion,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ErosionParams {
    /// Number of passes.
    pub iterations: u32,
    /// Droplets simulated per pass.
    pub droplets: u32,
    /// Fraction of the free capacity picked up per step.
    pub erosion_rate: f64,
    /// Fraction of the surplus sediment dropped per step.
    pub deposition_rate: f64,
    /// Fraction of water lost per step.
    pub evaporation_rate: f64,
    /// Lower bound on the slope used for the carrying capacity.
    pub min_slope: f64,
    /// How much of the previous direction is kept, `0..=1`.
    pub inertia: f64,
    /// Sediment capacity multiplier.
    pub capacity: f64,
    pub gravity: f64,
    /// Maximum number of steps per droplet.
    pub max_lifetime: u32,
    pub seed: u64,
    pub output: ErosionOutput,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            iterations: 1,
            droplets: 5_000,
            erosion_rate: 0.3,
            deposition_rate: 0.3,
            evaporation_rate: 0.01,
            min_slope: 0.01,
            inertia: 0.05,
            capacity: 4.0,
            gravity: 4.0,
            max_lifetime: 30,
            seed: 0,
            output: ErosionOutput::Height,
        }
    }
}

impl ErosionParams {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_droplets(mut self, droplets: u32) -> Self {
        self.droplets = droplets;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_output(mut self, output: ErosionOutput) -> Self {
        self.output = output;
        self
    }

    /// Validates the parameters, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("erosion_rate", self.erosion_rate),
            ("deposition_rate", self.deposition_rate),
            ("evaporation_rate", self.evaporation_rate),
            ("inertia", self.inertia),
        ] {
            ensure_finite(name, value)?;
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1]")));
            }
        }
        for (name, value) in [
            ("min_slope", self.min_slope),
            ("capacity", self.capacity),
            ("gravity", self.gravity),
        ] {
            ensure_finite(name, value)?;
            if value < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be >= 0")));
            }
        }
        Ok(())
    }
}

/// Maps produced by one erosion run.
#[derive(Clone, Debug, PartialEq)]
pub struct Erosion {
    pub heights: IntensityMap,
    pub deposited: IntensityMap,
    pub eroded: IntensityMap,
}

impl Erosion {
    pub fn select(self, output: ErosionOutput) -> IntensityMap {
        match output {
            ErosionOutput::Height => self.heights,
            ErosionOutput::Deposition => self.deposited,
            ErosionOutput::Erosion => self.eroded,
        }
    }
}

/// Bilinear weights of the four cells around a fractional offset: nw, ne, sw, se.
#[inline]
fn corner_weights(offset: DVec2) -> [f64; 4] {
    let (u, v) = (offset.x, offset.y);
    [
        (1.0 - u) * (1.0 - v),
        u * (1.0 - v),
        (1.0 - u) * v,
        u * v,
    ]
}

struct Terrain<'a> {
    heights: &'a mut [f64],
    width: usize,
}

impl Terrain<'_> {
    #[inline]
    fn corners(&self, cell: usize) -> [usize; 4] {
        [cell, cell + 1, cell + self.width, cell + self.width + 1]
    }

    /// Interpolated height and gradient at `pos`, which must lie inside `[0, w-1) x [0, h-1)`.
    fn height_and_gradient(&self, pos: DVec2) -> (f64, DVec2) {
        let cx = pos.x.floor();
        let cy = pos.y.floor();
        let (u, v) = (pos.x - cx, pos.y - cy);
        let cell = cy as usize * self.width + cx as usize;
        let [nw, ne, sw, se] = self.corners(cell).map(|i| self.heights[i]);
        let gradient = DVec2::new(
            (ne - nw) * (1.0 - v) + (se - sw) * v,
            (sw - nw) * (1.0 - u) + (se - ne) * u,
        );
        let height = nw * (1.0 - u) * (1.0 - v) + ne * u * (1.0 - v) + sw * (1.0 - u) * v + se * u * v;
        (height, gradient)
    }

    fn deposit(&mut self, cell: usize, offset: DVec2, amount: f64, deposited: &mut [f64]) {
        for (i, w) in self.corners(cell).into_iter().zip(corner_weights(offset)) {
            let add = amount * w;
            self.heights[i] += add;
            deposited[i] += add;
        }
    }

    /// Removes up to `amount` spread over the corners without pushing any cell below zero.
    fn erode(&mut self, cell: usize, offset: DVec2, amount: f64, eroded: &mut [f64]) -> f64 {
        let mut removed = 0.0;
        for (i, w) in self.corners(cell).into_iter().zip(corner_weights(offset)) {
            let take = (amount * w).min(self.heights[i]).max(0.0);
            self.heights[i] -= take;
            eroded[i] += take;
            removed += take;
        }
        removed
    }
}

/// Runs the droplet simulation on a copy of `heights`.
///
/// When any droplet runs, the terrain is first clamped to `>= 0` (NaN becomes `0`), so every
/// output height is non-negative. With zero iterations the input is returned unchanged.
pub fn erode(heights: &IntensityMap, params: &ErosionParams) -> Result<Erosion> {
    params.validate()?;
    let size = heights.size();
    let mut out = heights.values().to_vec();
    let mut deposited = vec![0.0; size.cells()];
    let mut eroded = vec![0.0; size.cells()];
    let (width, height) = (size.width(), size.height());

    if params.iterations > 0 && width >= 2 && height >= 2 {
        for h in out.iter_mut() {
            *h = h.max(0.0);
        }
        let max = DVec2::new((width - 1) as f64, (height - 1) as f64);
        let mut terrain = Terrain {
            heights: &mut out,
            width,
        };
        let mut rng = StdRng::seed_from_u64(params.seed);
        for _ in 0..params.iterations {
            for _ in 0..params.droplets {
                let start = DVec2::new(rand01(&mut rng) * max.x, rand01(&mut rng) * max.y);
                simulate_droplet(&mut terrain, start, max, params, &mut deposited, &mut eroded);
            }
        }
    }

    Ok(Erosion {
        heights: IntensityMap::from_values(size, out)?,
        deposited: IntensityMap::from_values(size, deposited)?,
        eroded: IntensityMap::from_values(size, eroded)?,
    })
}

fn simulate_droplet(
    terrain: &mut Terrain<'_>,
    start: DVec2,
    max: DVec2,
    params: &ErosionParams,
    deposited: &mut [f64],
    eroded: &mut [f64],
) {
    let mut pos = start;
    let mut dir = DVec2::ZERO;
    let mut speed = 1.0;
    let mut water = 1.0;
    let mut sediment = 0.0;

    for _ in 0..params.max_lifetime {
        let base = pos.floor();
        let cell = base.y as usize * terrain.width + base.x as usize;
        let offset = pos - base;
        let (h, gradient) = terrain.height_and_gradient(pos);

        dir = dir * params.inertia - gradient * (1.0 - params.inertia);
        let len = dir.length();
        if !(len > f64::EPSILON) {
            break;
        }
        dir /= len;
        let next = pos + dir;
        if next.x < 0.0 || next.y < 0.0 || next.x >= max.x || next.y >= max.y {
            break;
        }

        let (next_h, _) = terrain.height_and_gradient(next);
        let dh = next_h - h;
        let capacity = (-dh).max(params.min_slope) * speed * water * params.capacity;

        if sediment > capacity || dh > 0.0 {
            let amount = if dh > 0.0 {
                dh.min(sediment)
            } else {
                (sediment - capacity) * params.deposition_rate
            };
            sediment -= amount;
            terrain.deposit(cell, offset, amount, deposited);
        } else {
            let wanted = ((capacity - sediment) * params.erosion_rate).min(-dh);
            sediment += terrain.erode(cell, offset, wanted, eroded);
        }

        speed = (speed * speed - dh * params.gravity).max(0.0).sqrt();
        water *= 1.0 - params.evaporation_rate;
        pos = next;
        if water <= f64::EPSILON {
            break;
        }
    }
}

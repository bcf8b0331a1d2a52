use super::{Grid, MapSize};

/// Dense grid of scalar intensities (heights, masks).
pub type IntensityMap = Grid<f64>;

impl Grid<f64> {
    /// Map filled with `value`.
    pub fn uniform(size: MapSize, value: f64) -> Self {
        Self::new(size, value)
    }

    /// Smallest and largest value.
    pub fn min_max(&self) -> (f64, f64) {
        self.values()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            })
    }

    pub fn sum(&self) -> f64 {
        self.values().iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.values().len() as f64
    }
}

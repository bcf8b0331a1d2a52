//! Cubic bezier curves and splines used as intensity transfer functions.
//!
//! Curves map an input intensity (x) to an output intensity (y). Lookup solves `x(t) = x`
//! for `t` by bisection, which requires the curve to be monotonic in x.
use glam::DVec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::maps::IntensityMap;

const SOLVE_ITERATIONS: usize = 48;
const SOLVE_TOLERANCE: f64 = 1e-12;
const CONTINUITY_TOLERANCE: f64 = 1e-9;

/// Cubic bezier curve through `p0` and `p3` with control points `p1` and `p2`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierCurve {
    pub p0: DVec2,
    pub p1: DVec2,
    pub p2: DVec2,
    pub p3: DVec2,
}

impl BezierCurve {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Straight segment with the control points on the thirds.
    pub fn linear(start: DVec2, end: DVec2) -> Self {
        Self::new(
            start,
            start.lerp(end, 1.0 / 3.0),
            start.lerp(end, 2.0 / 3.0),
            end,
        )
    }

    /// Point at `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f64) -> DVec2 {
        let t = t.clamp(0.0, 1.0);
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    /// Splits at `t` into two curves that together trace this one.
    pub fn split(&self, t: f64) -> (BezierCurve, BezierCurve) {
        let t = t.clamp(0.0, 1.0);
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);
        (
            BezierCurve::new(self.p0, p01, p012, mid),
            BezierCurve::new(mid, p123, p23, self.p3),
        )
    }

    /// `true` if x strictly advances from `p0` to `p3` and never turns back.
    pub fn is_monotonic_x(&self) -> bool {
        if !(self.p3.x > self.p0.x) {
            return false;
        }
        // x'(t) / 3 is the quadratic bezier over these control differences.
        let a = self.p1.x - self.p0.x;
        let b = self.p2.x - self.p1.x;
        let c = self.p3.x - self.p2.x;
        if a < 0.0 || c < 0.0 {
            return false;
        }
        b >= 0.0 || a * c >= b * b
    }

    fn check(&self) -> Result<()> {
        let finite = [self.p0, self.p1, self.p2, self.p3]
            .iter()
            .all(|p| p.is_finite());
        if !finite || !self.is_monotonic_x() {
            return Err(Error::Degenerate(format!(
                "curve from {} to {} is not monotonic in x",
                self.p0, self.p3
            )));
        }
        Ok(())
    }

    /// The y value where the curve crosses `x`, with `x` clamped to the curve's range.
    pub fn solve_y(&self, x: f64) -> Result<f64> {
        self.check()?;
        Ok(self.solve_unchecked(x))
    }

    fn solve_unchecked(&self, x: f64) -> f64 {
        if x <= self.p0.x {
            return self.p0.y;
        }
        if x >= self.p3.x {
            return self.p3.y;
        }
        let (mut lo, mut hi) = (0.0, 1.0);
        let mut t = 0.5;
        for _ in 0..SOLVE_ITERATIONS {
            t = 0.5 * (lo + hi);
            let px = self.evaluate(t).x;
            if (px - x).abs() <= SOLVE_TOLERANCE {
                break;
            }
            if px < x {
                lo = t;
            } else {
                hi = t;
            }
        }
        self.evaluate(t).y
    }
}

/// Chain of cubic segments where each segment starts at the previous one's end point.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BezierSpline {
    segments: Vec<BezierCurve>,
}

impl Default for BezierSpline {
    fn default() -> Self {
        Self::identity()
    }
}

impl BezierSpline {
    /// Builds a spline after checking continuity and monotonicity.
    pub fn new(segments: Vec<BezierCurve>) -> Result<Self> {
        let spline = Self { segments };
        spline.validate()?;
        Ok(spline)
    }

    /// Straight line from `(0, 0)` to `(1, 1)`.
    pub fn identity() -> Self {
        Self {
            segments: vec![BezierCurve::linear(DVec2::ZERO, DVec2::ONE)],
        }
    }

    /// Builds a spline from a start point followed by `(control, control, end)` triples.
    pub fn from_points(points: &[DVec2]) -> Result<Self> {
        if points.len() < 4 || (points.len() - 1) % 3 != 0 {
            return Err(Error::Degenerate(format!(
                "expected 1 + 3n points, got {}",
                points.len()
            )));
        }
        let segments = points
            .windows(4)
            .step_by(3)
            .map(|w| BezierCurve::new(w[0], w[1], w[2], w[3]))
            .collect();
        Self::new(segments)
    }

    /// Start point followed by `(control, control, end)` triples.
    pub fn to_points(&self) -> Vec<DVec2> {
        let mut points = Vec::with_capacity(1 + self.segments.len() * 3);
        if let Some(first) = self.segments.first() {
            points.push(first.p0);
        }
        for s in &self.segments {
            points.extend([s.p1, s.p2, s.p3]);
        }
        points
    }

    pub fn segments(&self) -> &[BezierCurve] {
        &self.segments
    }

    /// Splits the segment at `index` at `t`, keeping the shape unchanged.
    pub fn split_segment(&mut self, index: usize, t: f64) -> Result<()> {
        let segment = self
            .segments
            .get(index)
            .copied()
            .ok_or_else(|| Error::Other(format!("no segment {index}")))?;
        let (left, right) = segment.split(t);
        self.segments.splice(index..=index, [left, right]);
        Ok(())
    }

    /// Checks that the spline is non-empty, continuous and monotonic in x.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(Error::Degenerate("spline has no segments".into()));
        }
        for s in &self.segments {
            s.check()?;
        }
        for pair in self.segments.windows(2) {
            if pair[0].p3.distance(pair[1].p0) > CONTINUITY_TOLERANCE {
                return Err(Error::Degenerate(format!(
                    "segment ending at {} does not meet next start {}",
                    pair[0].p3, pair[1].p0
                )));
            }
        }
        Ok(())
    }

    /// Covered x range.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((self.segments.first()?.p0.x, self.segments.last()?.p3.x))
    }

    /// Curve value at `x`, with `x` clamped to the covered range.
    pub fn value_at(&self, x: f64) -> Result<f64> {
        self.validate()?;
        Ok(self.value_unchecked(x))
    }

    fn value_unchecked(&self, x: f64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.p3.x < x)
            .min(self.segments.len() - 1);
        self.segments[idx].solve_unchecked(x)
    }

    /// Applies the curve to every cell of `map`.
    pub fn remap(&self, map: &IntensityMap) -> Result<IntensityMap> {
        self.validate()?;
        if map.is_uniform() {
            let v = self.value_unchecked(map.values()[0]);
            return Ok(IntensityMap::uniform(map.size(), v));
        }
        Ok(map.map(|v| self.value_unchecked(v)))
    }
}

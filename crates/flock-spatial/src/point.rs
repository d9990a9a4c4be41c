//! Planar geometry primitives.

use serde::{Deserialize, Serialize};

use crate::error::{SpatialError, SpatialResult};

/// A position in the simulation plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both components are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Return the point unchanged if finite, otherwise `InvalidPosition`.
    pub fn validate(self) -> SpatialResult<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(SpatialError::InvalidPosition {
                x: self.x,
                y: self.y,
            })
        }
    }

    /// Squared distance, computed in `f64`.
    ///
    /// The wider type keeps the inclusive boundary check exact for the
    /// differences that occur between `f32` positions.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_squared(other).sqrt() as f32
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned bounding box, inclusive on every edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    /// Create a box from its corners.
    #[must_use]
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Square box centred on `center` with half side `half_extent`.
    #[must_use]
    pub fn around(center: Point, half_extent: f32) -> Self {
        Self {
            min: Point::new(center.x - half_extent, center.y - half_extent),
            max: Point::new(center.x + half_extent, center.y + half_extent),
        }
    }

    /// Midpoint. Halves before adding so boxes spanning the whole `f32`
    /// range do not overflow.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x.mul_add(0.5, self.max.x * 0.5),
            self.min.y.mul_add(0.5, self.max.y * 0.5),
        )
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Squared distance from `p` to the closest point of the box (0 inside).
    #[must_use]
    pub fn distance_squared_to(&self, p: Point) -> f64 {
        let px = f64::from(p.x);
        let py = f64::from(p.y);
        let cx = px.clamp(f64::from(self.min.x), f64::from(self.max.x));
        let cy = py.clamp(f64::from(self.min.y), f64::from(self.max.y));
        let dx = px - cx;
        let dy = py - cy;
        dx.mul_add(dx, dy * dy)
    }

    /// Split into four quadrants: south-west, south-east, north-west, north-east.
    #[must_use]
    pub fn quadrants(&self) -> [Self; 4] {
        let c = self.center();
        [
            Self::new(self.min, c),
            Self::new(Point::new(c.x, self.min.y), Point::new(self.max.x, c.y)),
            Self::new(Point::new(self.min.x, c.y), Point::new(c.x, self.max.y)),
            Self::new(c, self.max),
        ]
    }
}

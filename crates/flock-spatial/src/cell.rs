//! Grid cell coordinates.

use crate::Point;

/// Integer coordinate of a uniform grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
}

impl CellKey {
    /// Create a new cell key.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing `point` for the given cell size.
    ///
    /// Division happens in `f64` and the result saturates to the `i32` range.
    /// Saturation is monotone, so a point inside a query's bounds always maps
    /// inside the query's cell range.
    #[must_use]
    pub fn containing(point: Point, cell_size: f32) -> Self {
        Self {
            x: axis_cell(f64::from(point.x), f64::from(cell_size)),
            y: axis_cell(f64::from(point.y), f64::from(cell_size)),
        }
    }
}

fn axis_cell(coord: f64, cell_size: f64) -> i32 {
    // `as` saturates and maps infinities to the bounds.
    (coord / cell_size).floor() as i32
}

/// Inclusive rectangle of cell keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: CellKey,
    pub max: CellKey,
}

impl CellRange {
    /// Every cell that may hold a point within `radius` of `center`.
    #[must_use]
    pub fn around(center: Point, radius: f32, cell_size: f32) -> Self {
        let r = f64::from(radius);
        let size = f64::from(cell_size);
        let cx = f64::from(center.x);
        let cy = f64::from(center.y);
        Self {
            min: CellKey::new(axis_cell(cx - r, size), axis_cell(cy - r, size)),
            max: CellKey::new(axis_cell(cx + r, size), axis_cell(cy + r, size)),
        }
    }

    /// Number of cells covered, saturating at `u64::MAX`.
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        let w = (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64;
        let h = (i64::from(self.max.y) - i64::from(self.min.y) + 1) as u64;
        w.saturating_mul(h)
    }

    #[must_use]
    pub fn contains(&self, key: CellKey) -> bool {
        key.x >= self.min.x && key.x <= self.max.x && key.y >= self.min.y && key.y <= self.max.y
    }

    /// Iterate the covered keys row by row.
    pub fn iter(&self) -> impl Iterator<Item = CellKey> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| (min.x..=max.x).map(move |x| CellKey::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_at_position() {
        assert_eq!(CellKey::containing(Point::new(0.0, 0.0), 16.0), CellKey::new(0, 0));
        assert_eq!(CellKey::containing(Point::new(15.9, 0.0), 16.0), CellKey::new(0, 0));
        assert_eq!(CellKey::containing(Point::new(16.0, 0.0), 16.0), CellKey::new(1, 0));
        assert_eq!(CellKey::containing(Point::new(0.0, 16.0), 16.0), CellKey::new(0, 1));

        // Negative coordinates floor away from zero
        assert_eq!(CellKey::containing(Point::new(-0.1, -16.0), 16.0), CellKey::new(-1, -1));
        assert_eq!(CellKey::containing(Point::new(-16.1, 0.0), 16.0), CellKey::new(-2, 0));
    }

    #[test]
    fn test_huge_coordinates_saturate() {
        let key = CellKey::containing(Point::new(f32::MAX, -f32::MAX), 0.5);
        assert_eq!(key, CellKey::new(i32::MAX, i32::MIN));
    }

    #[test]
    fn test_range_around() {
        let range = CellRange::around(Point::new(0.0, 0.0), 10.0, 10.0);
        assert_eq!(range.min, CellKey::new(-1, -1));
        assert_eq!(range.max, CellKey::new(1, 1));
        assert_eq!(range.cell_count(), 9);
        assert_eq!(range.iter().count(), 9);
        assert!(range.contains(CellKey::new(1, -1)));
        assert!(!range.contains(CellKey::new(2, 0)));
    }

    #[test]
    fn test_range_zero_radius_is_single_cell() {
        let range = CellRange::around(Point::new(25.0, 5.0), 0.0, 10.0);
        assert_eq!(range.min, range.max);
        assert_eq!(range.min, CellKey::new(2, 0));
    }

    #[test]
    fn test_full_range_count_saturates() {
        let range = CellRange::around(Point::ZERO, f32::INFINITY, 1.0);
        assert_eq!(range.min, CellKey::new(i32::MIN, i32::MIN));
        assert_eq!(range.max, CellKey::new(i32::MAX, i32::MAX));
        assert_eq!(range.cell_count(), u64::MAX);
    }
}

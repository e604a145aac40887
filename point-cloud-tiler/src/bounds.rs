//! Point cloud coordinate bounds tracking
use crate::point::Point;

/// Axis-aligned min/max bounds over a set of points.
///
/// Used both for the run-wide extent of every observed point and for the
/// local extent of a single written tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCloudBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
        }
    }

    /// Widen the bounds to include a position
    pub fn update(&mut self, x: f32, y: f32, z: f32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// Widen the bounds to include a point's position.
    pub fn observe(&mut self, point: &Point) {
        self.update(point.x, point.y, point.z);
    }

    /// True until at least one position has been observed.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn center(&self) -> (f32, f32, f32) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    /// Min then max, in root index field order.
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min_x, self.min_y, self.min_z, self.max_x, self.max_y, self.max_z,
        ]
    }

    pub fn from_array(v: [f32; 6]) -> Self {
        Self {
            min_x: v[0],
            min_y: v[1],
            min_z: v[2],
            max_x: v[3],
            max_y: v[4],
            max_z: v[5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bounds_are_empty() {
        let bounds = PointCloudBounds::new();
        assert!(bounds.is_empty());
    }

    #[test]
    fn update_widens_monotonically() {
        let mut bounds = PointCloudBounds::new();
        bounds.update(1.0, -2.0, 3.0);
        bounds.update(-1.0, 5.0, 0.5);
        bounds.update(0.0, 0.0, 0.0);

        assert!(!bounds.is_empty());
        assert_eq!(bounds.to_array(), [-1.0, -2.0, 0.0, 1.0, 5.0, 3.0]);
        assert_eq!(bounds.center(), (0.0, 1.5, 1.5));
    }

    #[test]
    fn array_order_matches_root_fields() {
        let bounds = PointCloudBounds::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(bounds.min_y, 2.0);
        assert_eq!(bounds.max_x, 4.0);
        assert_eq!(bounds.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}

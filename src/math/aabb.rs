//! Axis-aligned bounding boxes.

use cgmath::{Point3, Vector3};

/// A three-dimensional AABB, aka a rectangular prism.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb3 {
    /// Minimum point of the AABB.
    pub min: Point3<f32>,
    /// Maximum point of the AABB.
    pub max: Point3<f32>,
}

impl Aabb3 {
    /// Construct a empty axis-aligned bounding box.
    #[inline]
    pub fn zero() -> Self {
        Aabb3 {
            min: Point3::new(0.0, 0.0, 0.0),
            max: Point3::new(0.0, 0.0, 0.0),
        }
    }

    /// Construct a new axis-aligned bounding box from two points.
    #[inline]
    pub fn new(p1: Point3<f32>, p2: Point3<f32>) -> Self {
        Aabb3 {
            min: Point3::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z)),
            max: Point3::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z)),
        }
    }

    /// Compute corners. The first four share the minimum z, the last four the
    /// maximum z, both walking the xy square counter-clockwise.
    #[inline]
    pub fn to_corners(&self) -> [Point3<f32>; 8] {
        let (l, h) = (self.min, self.max);
        [
            Point3::new(l.x, l.y, l.z),
            Point3::new(h.x, l.y, l.z),
            Point3::new(h.x, h.y, l.z),
            Point3::new(l.x, h.y, l.z),
            Point3::new(l.x, l.y, h.z),
            Point3::new(h.x, l.y, h.z),
            Point3::new(h.x, h.y, h.z),
            Point3::new(l.x, h.y, h.z),
        ]
    }

    #[inline]
    pub fn min(&self) -> Point3<f32> {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point3<f32> {
        self.max
    }

    /// Return the dimensions of this AABB.
    #[inline]
    pub fn dim(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Return the center point of this AABB.
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Returns a new AABB that is grown to include the given point.
    pub fn grow(&self, p: Point3<f32>) -> Self {
        Aabb3::new(
            Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn grow() {
        let aabb = Aabb3::zero().grow(Point3::new(1.0, -2.0, 3.0));
        assert_eq!(aabb.min, Point3::new(0.0, -2.0, 0.0));
        assert_eq!(aabb.max, Point3::new(1.0, 0.0, 3.0));
        assert_eq!(aabb.dim(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.to_corners()[6], aabb.max);
    }
}

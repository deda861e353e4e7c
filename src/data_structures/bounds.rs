//! Axis-aligned bounding boxes used to frame the loaded asset.

use cgmath::{Matrix4, Point3, Transform, Vector3, Zero};

/// An axis-aligned box. A freshly created box is empty (min > max).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        points.into_iter().fold(Self::empty(), |mut aabb, p| {
            aabb.expand_by_point(p);
            aabb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand_by_point(&mut self, p: Point3<f32>) {
        self.min = Point3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Point3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn union(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.expand_by_point(other.min);
        self.expand_by_point(other.max);
    }

    /// Center of the box; the origin for an empty box.
    pub fn center(&self) -> Point3<f32> {
        if self.is_empty() {
            return Point3::new(0.0, 0.0, 0.0);
        }
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Extent along each axis; zero for an empty box.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zero();
        }
        self.max - self.min
    }

    /// Bounds of this box after transforming all eight corners by `m`.
    pub fn transformed(&self, m: &Matrix4<f32>) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        Aabb::from_points(
            [
                Point3::new(lo.x, lo.y, lo.z),
                Point3::new(lo.x, lo.y, hi.z),
                Point3::new(lo.x, hi.y, lo.z),
                Point3::new(lo.x, hi.y, hi.z),
                Point3::new(hi.x, lo.y, lo.z),
                Point3::new(hi.x, lo.y, hi.z),
                Point3::new(hi.x, hi.y, lo.z),
                Point3::new(hi.x, hi.y, hi.z),
            ]
            .into_iter()
            .map(|corner| m.transform_point(corner)),
        )
    }
}

use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Stored as min/max corner points. The empty box has `min = +inf` and
/// `max = -inf`, so taking the union of the empty box with anything yields
/// that thing unchanged.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box (contains nothing, identity for union).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Grow this box to also cover `other`.
    pub fn include(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grow this box to also cover a point.
    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Componentwise intersection of two boxes. May be invalid when the
    /// inputs do not overlap; check with `is_valid`.
    pub fn intersection(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.max(box1.min),
            max: box0.max.min(box1.max),
        }
    }

    /// True when `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Total surface area of the box.
    pub fn area(&self) -> f32 {
        let e = self.extent();
        (e.x * e.y + e.x * e.z + e.y * e.z) * 2.0
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Test if a ray intersects this AABB.
    ///
    /// Uses the slab method with the ray's precomputed reciprocal direction.
    /// A grazing hit (`t_max == t_min`) counts as a hit, and hits anywhere in
    /// front of the origin count (`t_max >= 0`). Zero direction components
    /// take an explicit containment branch so no NaN can leak out of the
    /// `0 * inf` products.
    pub fn hit(&self, ray: &Ray) -> bool {
        let origin = ray.origin.to_array();
        let dir = ray.dir_n.to_array();
        let inv = ray.inv_dir_n.to_array();
        let min = self.min.to_array();
        let max = self.max.to_array();

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            if dir[axis] == 0.0 {
                // Parallel to the slab: hit only if the origin lies inside it.
                if origin[axis] < min[axis] || origin[axis] > max[axis] {
                    return false;
                }
            } else {
                let t1 = (min[axis] - origin[axis]) * inv[axis];
                let t2 = (max[axis] - origin[axis]) * inv[axis];
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
            }
        }

        t_max >= t_min && t_max >= 0.0
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

use crate::Vec3;

/// A ray in 3D space with a normalized direction and a shrinkable extent.
///
/// `inv_dir_n` caches the componentwise reciprocal of the direction for the
/// slab test; zero components map to infinities, which the AABB test handles
/// with an explicit branch. `max_t` bounds how far along the ray hits are
/// accepted; closest-hit traversal shrinks it as nearer hits are found.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir_n: Vec3,
    pub inv_dir_n: Vec3,
    pub max_t: f32,
}

impl Ray {
    /// Create an unbounded ray. `dir_n` must already be normalized.
    pub fn new(origin: Vec3, dir_n: Vec3) -> Self {
        Self::with_max_t(origin, dir_n, f32::INFINITY)
    }

    /// Create a ray that only accepts hits with `t <= max_t`.
    pub fn with_max_t(origin: Vec3, dir_n: Vec3, max_t: f32) -> Self {
        Self {
            origin,
            dir_n,
            inv_dir_n: dir_n.recip(),
            max_t,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * dir_n
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir_n * t
    }
}

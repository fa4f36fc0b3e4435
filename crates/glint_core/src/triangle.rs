//! Triangle geometry and ray-triangle intersection.

use glint_math::{Aabb, Ray, Vec2, Vec3};

/// Padding applied to triangle bounds so axis-aligned triangles do not
/// produce zero-thickness boxes.
const AABB_PADDING: f32 = 1e-4;

/// A mesh vertex: position, accumulated smooth normal, texture coordinates.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A triangle with a cached unit face normal.
///
/// `emissive_index` is the triangle's slot in the scene's emissive set, or
/// -1 for non-emissive triangles. The barycentric convention throughout is:
/// `u` weighs `v1`, `v` weighs `v2`, and `w = 1 - u - v` weighs `v0`.
#[derive(Debug, Copy, Clone)]
pub struct Triangle {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
    pub face_normal: Vec3,
    pub material_index: u32,
    pub emissive_index: i32,
}

/// Record of a ray-triangle intersection.
///
/// On a miss `hit` is false and `t` is infinite; the remaining fields are
/// unspecified. `triangle_index` is filled in by the BVH visitor, not by
/// `Triangle::intersect` itself.
#[derive(Debug, Copy, Clone)]
pub struct HitInfo {
    pub hit: bool,
    pub t: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub u: f32,
    pub v: f32,
    pub material_index: u32,
    pub triangle_index: u32,
}

impl Default for HitInfo {
    fn default() -> Self {
        Self {
            hit: false,
            t: f32::INFINITY,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            u: 0.0,
            v: 0.0,
            material_index: 0,
            triangle_index: 0,
        }
    }
}

impl Triangle {
    /// Create a new triangle from three vertices.
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, material_index: u32) -> Self {
        let face_normal = (v1.position - v0.position)
            .cross(v2.position - v0.position)
            .normalize();
        Self {
            v0,
            v1,
            v2,
            face_normal,
            material_index,
            emissive_index: -1,
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.v0.position + self.v1.position + self.v2.position) / 3.0
    }

    pub fn area(&self) -> f32 {
        (self.v1.position - self.v0.position)
            .cross(self.v2.position - self.v0.position)
            .length()
            * 0.5
    }

    /// Bounding box of the three vertices, padded against degenerate extents.
    pub fn aabb(&self) -> Aabb {
        let min = self
            .v0
            .position
            .min(self.v1.position)
            .min(self.v2.position);
        let max = self
            .v0
            .position
            .max(self.v1.position)
            .max(self.v2.position);
        Aabb::from_points(min - Vec3::splat(AABB_PADDING), max + Vec3::splat(AABB_PADDING))
    }

    /// Interpolated smooth-shading normal at the given barycentrics.
    pub fn normal_at(&self, u: f32, v: f32) -> Vec3 {
        let w = 1.0 - u - v;
        (self.v1.normal * u + self.v2.normal * v + self.v0.normal * w).normalize()
    }

    /// Interpolated texture coordinates at the given barycentrics.
    pub fn uv_at(&self, u: f32, v: f32) -> Vec2 {
        let w = 1.0 - u - v;
        self.v1.uv * u + self.v2.uv * v + self.v0.uv * w
    }

    /// Ray-triangle intersection.
    ///
    /// Plane hit through the cached face normal, then three edge half-plane
    /// tests; the barycentrics fall out of the cross products the edge tests
    /// already computed. The test is deliberately two-sided: back faces are
    /// reported and culling is left to the material logic in the integrator.
    pub fn intersect(&self, ray: &Ray) -> HitInfo {
        let mut info = HitInfo::default();

        let a = self.v0.position;
        let b = self.v1.position;
        let c = self.v2.position;

        let dir_dot_norm = ray.dir_n.dot(self.face_normal);
        if dir_dot_norm.abs() < 1e-8 {
            // Parallel to the plane
            return info;
        }

        let t = (a - ray.origin).dot(self.face_normal) / dir_dot_norm;
        if t < 0.0 || t > ray.max_t {
            return info;
        }

        let p = ray.at(t);

        let c0 = (b - a).cross(p - a);
        let c1 = (c - b).cross(p - b);
        let c2 = (a - c).cross(p - c);

        let w2 = self.face_normal.dot(c0);
        let w0 = self.face_normal.dot(c1);
        let w1 = self.face_normal.dot(c2);
        if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
            return info;
        }

        let tri_area2 = (b - a).cross(c - a).length();

        info.hit = true;
        info.t = t;
        info.point = p;
        info.normal = self.face_normal;
        info.u = w1 / tri_area2;
        info.v = w2 / tri_area2;
        info.material_index = self.material_index;

        info
    }
}

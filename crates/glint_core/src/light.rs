//! Point lights and the emissive-triangle sampler used for next-event
//! estimation.

use glint_math::{Vec2, Vec3};

use crate::triangle::Triangle;

/// A point light. The intensity has already been scaled by the loader.
#[derive(Debug, Copy, Clone)]
pub struct PointLight {
    pub intensity: f32,
    pub position: Vec3,
}

/// One light sample drawn from the emissive set.
#[derive(Debug, Copy, Clone)]
pub struct LightSample {
    /// Sampled point on the light surface, world space.
    pub position: Vec3,
    /// Emitted radiance of the sampled triangle.
    pub le: Vec3,
    /// Solid-angle pdf as seen from the shading point, including the
    /// triangle-selection probability. Non-positive when the sampled point
    /// faces away from the receiver; callers skip those samples.
    pub pdf: f32,
}

/// An emissive triangle: a copy of the geometry plus its radiance.
///
/// Copies are taken at load time, before the BVH reorders the scene's
/// triangle array, so sampler entries stay valid regardless of reordering.
#[derive(Debug, Copy, Clone)]
pub struct EmissiveTriangle {
    pub triangle: Triangle,
    pub emission: Vec3,
}

impl EmissiveTriangle {
    /// Sample a point on the triangle.
    ///
    /// Warps the unit square onto the triangle by reflecting samples that
    /// land outside the diagonal, then returns the area-to-solid-angle pdf
    /// for the direction from `pos_w` toward the sampled point.
    pub fn sample(&self, pos_w: Vec3, rnd: Vec2) -> LightSample {
        let mut u = rnd.x;
        let mut v = rnd.y;
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        let w = 1.0 - u - v;

        let position = self.triangle.v0.position * u
            + self.triangle.v1.position * v
            + self.triangle.v2.position * w;

        LightSample {
            position,
            le: self.emission,
            pdf: self.pdf(pos_w, position),
        }
    }

    /// Solid-angle pdf of having sampled `sampled` from `pos_w`.
    pub fn pdf(&self, pos_w: Vec3, sampled: Vec3) -> f32 {
        let to_light = sampled - pos_w;
        let dist_sqr = to_light.length_squared().max(f32::MIN_POSITIVE);
        let cos_theta = self
            .triangle
            .face_normal
            .dot(-to_light.normalize_or_zero());

        dist_sqr / (cos_theta * self.triangle.area())
    }
}

/// Uniform discrete distribution over the scene's emissive triangles.
#[derive(Default, Debug)]
pub struct EmissiveSampler {
    emissives: Vec<EmissiveTriangle>,
}

impl EmissiveSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an emissive triangle, returning its emissive index.
    pub fn push(&mut self, triangle: Triangle, emission: Vec3) -> usize {
        let index = self.emissives.len();
        self.emissives.push(EmissiveTriangle { triangle, emission });
        index
    }

    pub fn len(&self) -> usize {
        self.emissives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissives.is_empty()
    }

    pub fn get(&self, index: usize) -> &EmissiveTriangle {
        &self.emissives[index]
    }

    /// Draw one light sample.
    ///
    /// `rnd` are three uniforms in [0, 1): the first selects a triangle, the
    /// remaining two place a point on it. The selection pdf (1/N) is folded
    /// into the returned pdf. Returns `None` when the scene has no emissive
    /// triangles.
    pub fn sample(&self, pos_w: Vec3, rnd: (f32, f32, f32)) -> Option<LightSample> {
        if self.emissives.is_empty() {
            return None;
        }

        let n = self.emissives.len();
        let index = ((rnd.0 * n as f32) as usize).min(n - 1);

        let mut sample = self.emissives[index].sample(pos_w, Vec2::new(rnd.1, rnd.2));
        sample.pdf /= n as f32;
        Some(sample)
    }

    /// Pdf of having sampled `sampled` on emissive triangle `index` from
    /// `pos_w`, including the selection probability. Used to weight BRDF
    /// bounces that land on an emissive surface.
    pub fn pdf(&self, index: usize, pos_w: Vec3, sampled: Vec3) -> f32 {
        if self.emissives.is_empty() {
            return 0.0;
        }
        self.emissives[index].pdf(pos_w, sampled) / self.emissives.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::Vertex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ceiling_triangle(offset_x: f32) -> Triangle {
        // Faces -y, like a ceiling light above the origin.
        Triangle::new(
            Vertex::new(Vec3::new(offset_x, 2.0, 0.0), -Vec3::Y, Vec2::ZERO),
            Vertex::new(Vec3::new(offset_x + 1.0, 2.0, 0.0), -Vec3::Y, Vec2::ZERO),
            Vertex::new(Vec3::new(offset_x, 2.0, 1.0), -Vec3::Y, Vec2::ZERO),
            0,
        )
    }

    fn barycentric_inside(triangle: &Triangle, p: Vec3) -> bool {
        // Verify the sampled point lies on the triangle plane and within it.
        let n = triangle.face_normal;
        if (p - triangle.v0.position).dot(n).abs() > 1e-4 {
            return false;
        }
        let on_side = |a: Vec3, b: Vec3| (b - a).cross(p - a).dot(n) >= -1e-4;
        on_side(triangle.v0.position, triangle.v1.position)
            && on_side(triangle.v1.position, triangle.v2.position)
            && on_side(triangle.v2.position, triangle.v0.position)
    }

    #[test]
    fn test_turk_warp_stays_on_triangle() {
        let light = EmissiveTriangle {
            triangle: ceiling_triangle(0.0),
            emission: Vec3::ONE,
        };
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let sample = light.sample(Vec3::ZERO, Vec2::new(rng.gen(), rng.gen()));
            assert!(barycentric_inside(&light.triangle, sample.position));
        }
    }

    #[test]
    fn test_pdf_formula() {
        let light = EmissiveTriangle {
            triangle: ceiling_triangle(0.0),
            emission: Vec3::ONE,
        };

        // Straight below a point on the triangle: cos_theta = 1.
        let sampled = Vec3::new(0.25, 2.0, 0.25);
        let receiver = Vec3::new(0.25, 0.0, 0.25);
        let pdf = light.pdf(receiver, sampled);

        let dist_sqr = 4.0;
        let area = 0.5;
        assert!((pdf - dist_sqr / area).abs() < 1e-3);
    }

    #[test]
    fn test_pdf_nonpositive_behind_light() {
        let light = EmissiveTriangle {
            triangle: ceiling_triangle(0.0),
            emission: Vec3::ONE,
        };

        // Receiver above the ceiling sees the back of the light.
        let pdf = light.pdf(Vec3::new(0.25, 4.0, 0.25), Vec3::new(0.25, 2.0, 0.25));
        assert!(pdf <= 0.0);
    }

    #[test]
    fn test_sampler_empty() {
        let sampler = EmissiveSampler::new();
        assert!(sampler.sample(Vec3::ZERO, (0.5, 0.5, 0.5)).is_none());
        assert_eq!(sampler.pdf(0, Vec3::ZERO, Vec3::ONE), 0.0);
    }

    #[test]
    fn test_sampler_selection_is_uniform() {
        let mut sampler = EmissiveSampler::new();
        for i in 0..4 {
            sampler.push(ceiling_triangle(i as f32 * 10.0), Vec3::ONE);
        }

        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0u32; 4];
        let draws = 8000;
        for _ in 0..draws {
            let sample = sampler
                .sample(Vec3::ZERO, (rng.gen(), rng.gen(), rng.gen()))
                .unwrap();
            // Recover which triangle was chosen from the sample's x range.
            let bucket = (sample.position.x / 10.0) as usize;
            counts[bucket.min(3)] += 1;
        }

        // Each triangle should receive close to a quarter of the draws.
        let expected = draws as f32 / 4.0;
        for count in counts {
            assert!((count as f32 - expected).abs() < expected * 0.15);
        }
    }

    #[test]
    fn test_sampler_pdf_includes_selection() {
        let mut sampler = EmissiveSampler::new();
        sampler.push(ceiling_triangle(0.0), Vec3::ONE);
        sampler.push(ceiling_triangle(10.0), Vec3::ONE);

        let receiver = Vec3::new(0.25, 0.0, 0.25);
        let sampled = Vec3::new(0.25, 2.0, 0.25);

        let solo = sampler.get(0).pdf(receiver, sampled);
        assert!((sampler.pdf(0, receiver, sampled) - solo / 2.0).abs() < 1e-5);
    }
}

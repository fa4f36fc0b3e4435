//! Sampling helpers shared by the integrator.

use std::f32::consts::PI;

use glint_math::Vec3;

/// Exponent-2 power heuristic for combining two sampling strategies.
///
/// For two strategies with positive pdfs the weights partition unity:
/// `power_heuristic(f, g) + power_heuristic(g, f) == 1`.
#[inline]
pub fn power_heuristic(f_pdf: f32, g_pdf: f32) -> f32 {
    let f = f_pdf;
    let g = g_pdf;
    (f * f) / (f * f + g * g)
}

/// Two unit vectors spanning the plane perpendicular to `normal`.
///
/// Branch-free at the z poles: the sign carried by `normal.z` folds into
/// the frame instead of being special-cased.
fn orthonormal_frame(normal: Vec3) -> (Vec3, Vec3) {
    let s = 1.0f32.copysign(normal.z);
    let k = -1.0 / (s + normal.z);
    let xy = normal.x * normal.y * k;

    (
        Vec3::new(1.0 + s * normal.x * normal.x * k, s * xy, -s * normal.x),
        Vec3::new(xy, s + normal.y * normal.y * k, -normal.y),
    )
}

/// Generate a cosine-weighted direction in the hemisphere around a normal.
///
/// Uses Malley's method: sample uniformly on the unit disk, lift to the
/// hemisphere. PDF = cos(theta) / PI.
pub fn cosine_weighted_hemisphere(normal: Vec3, r1: f32, r2: f32) -> Vec3 {
    let radius = r1.sqrt();
    let phi = 2.0 * PI * r2;
    let disk_x = radius * phi.cos();
    let disk_y = radius * phi.sin();
    // Lifting the disk sample gives height sqrt(1 - r1).
    let height = (1.0 - r1).sqrt();

    let (tangent, bitangent) = orthonormal_frame(normal);

    tangent * disk_x + bitangent * disk_y + normal * height
}

/// PDF of `cosine_weighted_hemisphere` for a given direction.
#[inline]
pub fn cosine_hemisphere_pdf(normal: Vec3, dir: Vec3) -> f32 {
    normal.dot(dir).max(0.0) / PI
}

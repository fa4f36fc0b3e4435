//! Glint Render - CPU path tracing.
//!
//! A Monte Carlo path tracer over the `glint_core` scene model:
//! next-event estimation against the scene's emissive set, cosine-weighted
//! BRDF sampling, power-heuristic multiple importance sampling, and a
//! bucket-parallel tile driver.

mod bucket;
mod camera;
mod integrator;
mod ppm;
mod renderer;
mod sampling;

pub use bucket::{generate_buckets, Bucket};
pub use camera::Camera;
pub use integrator::trace_ray;
pub use ppm::write_ppm;
pub use renderer::{render, ImageBuffer, OrbitSettings, RenderOptions};
pub use sampling::{cosine_hemisphere_pdf, cosine_weighted_hemisphere, power_heuristic};

/// Re-export math types from glint_math
pub use glint_math::{Aabb, Mat4, Ray, Vec2, Vec3};

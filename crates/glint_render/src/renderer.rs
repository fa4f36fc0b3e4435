//! Bucket-parallel render driver.
//!
//! The image is partitioned into square buckets; each bucket is one work
//! item on the rayon pool with its own seeded RNG. The scene is shared
//! read-only, bucket results land in disjoint regions of the image, and the
//! buffer is assembled after all buckets complete, so no synchronization is
//! needed beyond the pool itself.

use glint_core::Scene;
use glint_math::{Ray, Vec3};
use indicatif::ParallelProgressIterator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::bucket::{generate_buckets, Bucket};
use crate::camera::Camera;
use crate::integrator::trace_ray;

/// Turntable rendering configuration.
#[derive(Debug, Clone, Copy)]
pub struct OrbitSettings {
    pub frames: u32,
    pub radius: f32,
    pub height: f32,
    pub center: Vec3,
}

/// Render configuration.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Samples per pixel
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Base RNG seed; per-bucket seeds derive from it. `None` seeds from
    /// entropy, a fixed value makes renders reproducible.
    pub base_seed: Option<u64>,
    /// When set, render this many turntable frames instead of one view.
    pub orbit: Option<OrbitSettings>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            samples_per_pixel: 256,
            max_depth: 6,
            base_seed: None,
            orbit: None,
        }
    }
}

/// 8-bit RGB output image.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0]; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.pixels[(y * self.width + x) as usize] = color;
    }
}

/// Result of rendering one bucket: pixel rows in bucket-local order.
struct BucketResult {
    bucket: Bucket,
    pixels: Vec<[u8; 3]>,
}

/// Render the scene through `camera` into an image buffer.
pub fn render(scene: &Scene, camera: &Camera, options: &RenderOptions) -> ImageBuffer {
    let width = scene.settings.image.width;
    let height = scene.settings.image.height;
    let buckets = generate_buckets(width, height, scene.settings.image.bucket_size);

    let base_seed = options
        .base_seed
        .unwrap_or_else(|| rand::thread_rng().gen());

    log::info!(
        "rendering {}x{} at {} spp, {} buckets",
        width,
        height,
        options.samples_per_pixel,
        buckets.len()
    );

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .progress_count(buckets.len() as u64)
        .map(|bucket| {
            let mut rng = StdRng::seed_from_u64(bucket_seed(base_seed, bucket.index as u64));
            render_bucket(scene, camera, bucket, options, &mut rng)
        })
        .collect();

    let mut image = ImageBuffer::new(width, height);
    for result in results {
        let bucket = result.bucket;
        for local_y in 0..bucket.height {
            for local_x in 0..bucket.width {
                let color = result.pixels[(local_y * bucket.width + local_x) as usize];
                image.set(bucket.x + local_x, bucket.y + local_y, color);
            }
        }
    }
    image
}

/// Distinct per-bucket seed derived from the base seed.
fn bucket_seed(base: u64, index: u64) -> u64 {
    base ^ (index.wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Render a single bucket to a vector of pixels in row-major order.
fn render_bucket(
    scene: &Scene,
    camera: &Camera,
    bucket: &Bucket,
    options: &RenderOptions,
    rng: &mut StdRng,
) -> BucketResult {
    let width = scene.settings.image.width;
    let height = scene.settings.image.height;
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let col = bucket.x + local_x;
            let row = bucket.y + local_y;

            let mut accumulated = Vec3::ZERO;
            for _ in 0..options.samples_per_pixel {
                let jx = rng.gen::<f32>() - 0.5;
                let jy = rng.gen::<f32>() - 0.5;
                let ray = primary_ray(camera, col, row, width, height, jx, jy);
                accumulated += trace_ray(scene, &ray, options.max_depth, rng);
            }

            let average = accumulated / options.samples_per_pixel as f32;
            pixels.push(color_to_rgb8(average));
        }
    }

    BucketResult {
        bucket: *bucket,
        pixels,
    }
}

/// Build the jittered primary ray through pixel (col, row).
fn primary_ray(
    camera: &Camera,
    col: u32,
    row: u32,
    width: u32,
    height: u32,
    jx: f32,
    jy: f32,
) -> Ray {
    // Pixel center to NDC to screen space.
    let mut y = (row as f32 + 0.5 + jy) / height as f32;
    y = 1.0 - 2.0 * y;
    let mut x = (col as f32 + 0.5 + jx) / width as f32;
    x = 2.0 * x - 1.0;
    x *= width as f32 / height as f32;

    let (forward, right, up) = camera.basis();
    let direction = (forward + right * x + up * y).normalize();

    Ray::new(camera.position(), direction)
}

/// Clamp to [0, 1] and quantize to 8-bit RGB. Output stays linear.
fn color_to_rgb8(color: Vec3) -> [u8; 3] {
    [
        (color.x.clamp(0.0, 1.0) * 255.0) as u8,
        (color.y.clamp(0.0, 1.0) * 255.0) as u8,
        (color.z.clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

//! Scene facade.
//!
//! A `Scene` aggregates everything the renderer consumes: the triangle array
//! (reordered once by the BVH build), material and texture tables, the light
//! set, the emissive sampler, the camera transform, and the image settings.
//! After `load` returns the scene is read-only and can be shared across
//! worker threads without synchronization.

use std::path::Path;

use glint_math::{Mat4, Ray, Vec3};

use crate::bvh::Bvh;
use crate::light::{EmissiveSampler, PointLight};
use crate::loader::{self, LoaderOptions, SceneError};
use crate::material::Material;
use crate::texture::TextureRegistry;
use crate::triangle::{HitInfo, Triangle};

/// Output image parameters.
#[derive(Debug, Clone, Copy)]
pub struct ImageSettings {
    pub width: u32,
    pub height: u32,
    /// Square tile side used by the bucket renderer.
    pub bucket_size: u32,
}

/// Per-scene settings from the scene file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub scene_name: String,
    pub background_color: Vec3,
    pub image: ImageSettings,
}

#[derive(Debug)]
pub struct Scene {
    pub triangles: Vec<Triangle>,
    pub materials: Vec<Material>,
    pub textures: TextureRegistry,
    pub lights: Vec<PointLight>,
    pub emissive: EmissiveSampler,
    pub bvh: Bvh,
    /// Camera world transform (rotation + translation).
    pub camera: Mat4,
    pub settings: Settings,
}

impl Scene {
    /// Load a scene from a JSON file and build its BVH.
    pub fn load<P: AsRef<Path>>(path: P, options: &LoaderOptions) -> Result<Scene, SceneError> {
        loader::load_scene(path.as_ref(), options)
    }

    /// Nearest triangle intersection along the ray.
    pub fn closest_hit(&self, ray: &Ray) -> HitInfo {
        self.bvh.closest_hit(&self.triangles, ray)
    }

    /// Shadow query: true when something opaque blocks the ray within its
    /// extent.
    pub fn any_hit(&self, ray: &Ray) -> bool {
        self.bvh.any_hit(&self.triangles, &self.materials, ray)
    }
}

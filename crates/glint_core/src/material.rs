//! Surface materials.

use glint_math::{Vec2, Vec3};

use crate::texture::TextureRegistry;

/// How a surface scatters light.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MaterialKind {
    /// Albedo only, no indirect bounce weighting differences from Diffuse
    /// at shading time; kept distinct for scene fidelity.
    Constant,
    /// Lambertian surface.
    Diffuse,
    /// Perfect mirror.
    Reflective,
    /// Dielectric with an index of refraction.
    Refractive,
    /// Light source; terminal for paths.
    Emissive,
}

/// Surface color: either a flat color or a registered texture.
#[derive(Debug, Copy, Clone)]
pub enum Albedo {
    Color(Vec3),
    Texture(usize),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub kind: MaterialKind,
    pub albedo: Albedo,
    /// Index of refraction; meaningful for `Refractive` only.
    pub ior: f32,
    /// Emitted radiance; meaningful for `Emissive` only.
    pub emission: Vec3,
    pub smooth_shading: bool,
}

impl Material {
    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            albedo: Albedo::Color(albedo),
            ior: 1.0,
            emission: Vec3::ZERO,
            smooth_shading: false,
        }
    }

    pub fn reflective(albedo: Vec3) -> Self {
        Self {
            kind: MaterialKind::Reflective,
            ..Self::diffuse(albedo)
        }
    }

    pub fn refractive(ior: f32) -> Self {
        Self {
            kind: MaterialKind::Refractive,
            ior,
            ..Self::diffuse(Vec3::ONE)
        }
    }

    pub fn emissive(emission: Vec3) -> Self {
        Self {
            kind: MaterialKind::Emissive,
            emission,
            ..Self::diffuse(Vec3::ONE)
        }
    }

    /// Refractive surfaces need two-sided hits; everything else culls
    /// back faces at the integrator.
    pub fn cull_back_face(&self) -> bool {
        self.kind != MaterialKind::Refractive
    }

    /// Resolve the surface color at a hit point.
    pub fn albedo_at(&self, textures: &TextureRegistry, bary: Vec2, uv: Vec2) -> Vec3 {
        match self.albedo {
            Albedo::Color(color) => color,
            Albedo::Texture(index) => textures.get(index).sample(bary, uv),
        }
    }
}

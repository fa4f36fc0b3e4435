//! Glint Core - scene domain for the CPU path tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Vertex`, `Triangle`, `HitInfo`
//! - **Shading data**: `Material`, `Texture`, `TextureRegistry`
//! - **Lights**: `PointLight`, `EmissiveTriangle`, `EmissiveSampler`
//! - **Acceleration**: flat-array `Bvh` with closest-hit and any-hit queries
//! - **Scene facade**: `Scene` aggregating all of the above, loaded from a
//!   JSON scene description
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{LoaderOptions, Scene};
//!
//! let scene = Scene::load("scene0.json", &LoaderOptions::default())?;
//! println!("{} triangles, {} lights",
//!     scene.triangles.len(),
//!     scene.lights.len());
//! ```

pub mod bvh;
pub mod light;
pub mod loader;
pub mod material;
pub mod scene;
pub mod texture;
pub mod triangle;

// Re-export commonly used types
pub use bvh::Bvh;
pub use light::{EmissiveSampler, EmissiveTriangle, LightSample, PointLight};
pub use loader::{LoaderOptions, SceneError};
pub use material::{Albedo, Material, MaterialKind};
pub use scene::{ImageSettings, Scene, Settings};
pub use texture::{Texture, TextureError, TextureRegistry};
pub use triangle::{HitInfo, Triangle, Vertex};

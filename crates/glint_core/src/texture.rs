//! Procedural and bitmap textures.
//!
//! Textures are a tagged variant rather than trait objects so that albedo
//! evaluation inside the shading loop is a single branch on the tag. The
//! registry owns every texture in the scene; materials reference entries by
//! index and the whole structure is immutable after loading.

use std::collections::HashMap;
use std::path::Path;

use glint_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("failed to read texture file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Result type for texture loading.
pub type TextureResult<T> = Result<T, TextureError>;

/// A texture evaluated from barycentrics and UV coordinates.
#[derive(Clone, Debug)]
pub enum Texture {
    /// Flat color, ignores the sample position.
    Albedo { color: Vec3 },
    /// Colors a band near the triangle edges.
    Edges {
        edge_color: Vec3,
        inner_color: Vec3,
        edge_width: f32,
    },
    /// UV-space checkerboard with squares of side `square_size`.
    Checker {
        color_a: Vec3,
        color_b: Vec3,
        square_size: f32,
    },
    /// Image-backed texture, nearest sampling.
    Bitmap {
        width: u32,
        height: u32,
        pixels: Vec<[f32; 3]>,
    },
}

impl Texture {
    /// Load a bitmap texture from an image file.
    pub fn bitmap_from_file<P: AsRef<Path>>(path: P) -> TextureResult<Texture> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let img = image::open(path).map_err(|err| match err {
            image::ImageError::IoError(source) => TextureError::Io {
                path: display.clone(),
                source,
            },
            source => TextureError::Decode {
                path: display.clone(),
                source,
            },
        })?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                ]
            })
            .collect();

        log::debug!("loaded bitmap texture {} ({}x{})", display, width, height);

        Ok(Texture::Bitmap {
            width,
            height,
            pixels,
        })
    }

    /// Evaluate the texture.
    ///
    /// `bary` are the hit barycentrics (weights on v1 and v2), `uv` the
    /// interpolated texture coordinates.
    pub fn sample(&self, bary: Vec2, uv: Vec2) -> Vec3 {
        match self {
            Texture::Albedo { color } => *color,

            Texture::Edges {
                edge_color,
                inner_color,
                edge_width,
            } => {
                if bary.x < *edge_width || bary.y < *edge_width {
                    return *edge_color;
                }
                if 1.0 - bary.x - bary.y < *edge_width {
                    return *edge_color;
                }
                *inner_color
            }

            Texture::Checker {
                color_a,
                color_b,
                square_size,
            } => {
                let num_squares = 1.0 / square_size;
                let u_index = (uv.x * num_squares) as i32;
                let v_index = (uv.y * num_squares) as i32;
                if u_index % 2 == v_index % 2 {
                    *color_a
                } else {
                    *color_b
                }
            }

            Texture::Bitmap {
                width,
                height,
                pixels,
            } => {
                // V is flipped into image row order.
                let x = (uv.x * *width as f32) as i64;
                let y = ((1.0 - uv.y) * *height as f32) as i64;
                let x = x.clamp(0, *width as i64 - 1) as u32;
                let y = y.clamp(0, *height as i64 - 1) as u32;
                let p = pixels[(y * width + x) as usize];
                Vec3::new(p[0], p[1], p[2])
            }
        }
    }
}

/// Name-keyed registry of every texture in a scene.
///
/// Built once by the loader, then read-only; materials hold indices into it.
#[derive(Default, Debug)]
pub struct TextureRegistry {
    textures: Vec<Texture>,
    by_name: HashMap<String, usize>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture under a name, returning its index.
    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) -> usize {
        let index = self.textures.len();
        self.textures.push(texture);
        self.by_name.insert(name.into(), index);
        index
    }

    /// Look up a texture index by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> &Texture {
        &self.textures[index]
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

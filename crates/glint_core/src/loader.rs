//! JSON scene loading.
//!
//! The scene file is a single JSON document:
//!
//! - `settings.background_color` — `[r, g, b]` linear floats
//! - `settings.image_settings.width` / `.height` / `.bucket_size` (optional)
//! - `camera.matrix` — 9 floats, row-major 3x3 rotation
//! - `camera.position` — `[x, y, z]`
//! - `lights[]` — `{ intensity, position }`
//! - `materials[]` — `{ type, albedo | ior, emission?, smooth_shading }`
//!   where `albedo` is either `[r, g, b]` or the name of a texture
//! - `textures[]` — `{ name, type, ... }` for albedo / edges / checker /
//!   bitmap variants
//! - `objects[]` — `{ vertices, uvs?, triangles, material_index }` with flat
//!   coordinate and index arrays
//!
//! Vertex normals are never read from the file: each object accumulates its
//! face normals onto the shared vertices and normalizes the sums.

use std::path::Path;

use glint_math::{Mat3, Mat4, Vec2, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::bvh::Bvh;
use crate::light::{EmissiveSampler, PointLight};
use crate::material::{Albedo, Material, MaterialKind};
use crate::scene::{ImageSettings, Scene, Settings};
use crate::texture::{Texture, TextureError, TextureRegistry};
use crate::triangle::{Triangle, Vertex};

/// Errors that can occur while loading a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid scene field {field}: {message}")]
    Schema { field: String, message: String },

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error("material references unknown texture {0:?}")]
    UnknownTexture(String),

    #[error("unknown material type {0:?}")]
    UnknownMaterialType(String),

    #[error("unknown texture type {0:?}")]
    UnknownTextureType(String),
}

/// Knobs applied while loading.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Point-light intensities in existing scene files are authored against
    /// a scale that is one order of magnitude too hot; this factor is
    /// applied on load.
    pub light_intensity_scale: f32,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            light_intensity_scale: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw file schema
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SceneFile {
    settings: SettingsEntry,
    camera: CameraEntry,
    #[serde(default)]
    lights: Vec<LightEntry>,
    #[serde(default)]
    materials: Vec<MaterialEntry>,
    #[serde(default)]
    textures: Vec<TextureEntry>,
    #[serde(default)]
    objects: Vec<ObjectEntry>,
}

#[derive(Deserialize)]
struct SettingsEntry {
    background_color: [f32; 3],
    image_settings: ImageSettingsEntry,
}

fn default_bucket_size() -> u32 {
    24
}

#[derive(Deserialize)]
struct ImageSettingsEntry {
    width: u32,
    height: u32,
    #[serde(default = "default_bucket_size")]
    bucket_size: u32,
}

#[derive(Deserialize)]
struct CameraEntry {
    matrix: [f32; 9],
    position: [f32; 3],
}

#[derive(Deserialize)]
struct LightEntry {
    intensity: f32,
    position: [f32; 3],
}

#[derive(Deserialize)]
struct ObjectEntry {
    vertices: Vec<f32>,
    #[serde(default)]
    uvs: Vec<f32>,
    triangles: Vec<u32>,
    material_index: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlbedoEntry {
    Color([f32; 3]),
    Texture(String),
}

#[derive(Deserialize)]
struct MaterialEntry {
    #[serde(rename = "type")]
    kind: String,
    albedo: Option<AlbedoEntry>,
    ior: Option<f32>,
    emission: Option<[f32; 3]>,
    #[serde(default)]
    smooth_shading: bool,
}

#[derive(Deserialize)]
struct TextureEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    albedo: Option<[f32; 3]>,
    edge_color: Option<[f32; 3]>,
    inner_color: Option<[f32; 3]>,
    edge_width: Option<f32>,
    color_a: Option<[f32; 3]>,
    color_b: Option<[f32; 3]>,
    square_size: Option<f32>,
    file_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion into domain types
// ---------------------------------------------------------------------------

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::from_array(v)
}

pub(crate) fn load_scene(path: &Path, options: &LoaderOptions) -> Result<Scene, SceneError> {
    let display = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: display.clone(),
        source,
    })?;

    let file: SceneFile =
        serde_json::from_str(&content).map_err(|source| SceneError::Json {
            path: display.clone(),
            source,
        })?;

    let scene_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scene")
        .to_string();

    build_scene(file, scene_name, path, options)
}

fn build_scene(
    file: SceneFile,
    scene_name: String,
    path: &Path,
    options: &LoaderOptions,
) -> Result<Scene, SceneError> {
    let textures = build_textures(&file.textures, path)?;
    let materials = build_materials(&file.materials, &textures)?;

    let mut triangles = Vec::new();
    let mut emissive = EmissiveSampler::new();
    for (object_index, object) in file.objects.iter().enumerate() {
        build_object(
            object,
            object_index,
            &materials,
            &mut triangles,
            &mut emissive,
        )?;
    }

    let lights = file
        .lights
        .iter()
        .map(|light| PointLight {
            intensity: light.intensity * options.light_intensity_scale,
            position: vec3(light.position),
        })
        .collect();

    let camera = camera_transform(&file.camera);

    log::info!(
        "loaded scene {:?}: {} triangles, {} materials, {} point lights, {} emissive",
        scene_name,
        triangles.len(),
        materials.len(),
        file.lights.len(),
        emissive.len()
    );

    let bvh = Bvh::build(&mut triangles);

    Ok(Scene {
        triangles,
        materials,
        textures,
        lights,
        emissive,
        bvh,
        camera,
        settings: Settings {
            scene_name,
            background_color: vec3(file.settings.background_color),
            image: ImageSettings {
                width: file.settings.image_settings.width,
                height: file.settings.image_settings.height,
                bucket_size: file.settings.image_settings.bucket_size,
            },
        },
    })
}

fn build_textures(
    entries: &[TextureEntry],
    scene_path: &Path,
) -> Result<TextureRegistry, SceneError> {
    let mut registry = TextureRegistry::new();
    for entry in entries {
        let missing = |field: &str| SceneError::Schema {
            field: format!("textures[{:?}].{}", entry.name, field),
            message: "missing field".to_string(),
        };

        let texture = match entry.kind.as_str() {
            "albedo" => Texture::Albedo {
                color: vec3(entry.albedo.ok_or_else(|| missing("albedo"))?),
            },
            "edges" => Texture::Edges {
                edge_color: vec3(entry.edge_color.ok_or_else(|| missing("edge_color"))?),
                inner_color: vec3(entry.inner_color.ok_or_else(|| missing("inner_color"))?),
                edge_width: entry.edge_width.ok_or_else(|| missing("edge_width"))?,
            },
            "checker" => Texture::Checker {
                color_a: vec3(entry.color_a.ok_or_else(|| missing("color_a"))?),
                color_b: vec3(entry.color_b.ok_or_else(|| missing("color_b"))?),
                square_size: entry.square_size.ok_or_else(|| missing("square_size"))?,
            },
            "bitmap" => {
                let file_path = entry.file_path.as_ref().ok_or_else(|| missing("file_path"))?;
                // Bitmap paths are relative to the scene file.
                let base = scene_path.parent().unwrap_or_else(|| Path::new("."));
                Texture::bitmap_from_file(base.join(file_path))?
            }
            other => return Err(SceneError::UnknownTextureType(other.to_string())),
        };
        registry.insert(entry.name.clone(), texture);
    }
    Ok(registry)
}

fn build_materials(
    entries: &[MaterialEntry],
    textures: &TextureRegistry,
) -> Result<Vec<Material>, SceneError> {
    let mut materials = Vec::with_capacity(entries.len());
    for entry in entries {
        let kind = match entry.kind.as_str() {
            "constant" => MaterialKind::Constant,
            "diffuse" => MaterialKind::Diffuse,
            "reflective" => MaterialKind::Reflective,
            "refractive" => MaterialKind::Refractive,
            "emissive" => MaterialKind::Emissive,
            other => return Err(SceneError::UnknownMaterialType(other.to_string())),
        };

        let albedo = match &entry.albedo {
            None => Albedo::Color(Vec3::ONE),
            Some(AlbedoEntry::Color(color)) => Albedo::Color(vec3(*color)),
            Some(AlbedoEntry::Texture(name)) => Albedo::Texture(
                textures
                    .index_of(name)
                    .ok_or_else(|| SceneError::UnknownTexture(name.clone()))?,
            ),
        };

        // Emissive radiance: an explicit field, falling back to a flat
        // albedo color when the file uses that spelling.
        let emission = match (entry.emission, &entry.albedo) {
            (Some(emission), _) => vec3(emission),
            (None, Some(AlbedoEntry::Color(color))) if kind == MaterialKind::Emissive => {
                vec3(*color)
            }
            _ => Vec3::ZERO,
        };

        materials.push(Material {
            kind,
            albedo,
            ior: entry.ior.unwrap_or(1.0),
            emission,
            smooth_shading: entry.smooth_shading,
        });
    }
    Ok(materials)
}

fn build_object(
    object: &ObjectEntry,
    object_index: usize,
    materials: &[Material],
    triangles: &mut Vec<Triangle>,
    emissive: &mut EmissiveSampler,
) -> Result<(), SceneError> {
    let field = |name: &str| format!("objects[{}].{}", object_index, name);

    if object.vertices.len() % 3 != 0 {
        return Err(SceneError::Schema {
            field: field("vertices"),
            message: "length is not a multiple of 3".to_string(),
        });
    }
    if object.triangles.len() % 3 != 0 {
        return Err(SceneError::Schema {
            field: field("triangles"),
            message: "length is not a multiple of 3".to_string(),
        });
    }
    let material = materials
        .get(object.material_index as usize)
        .ok_or_else(|| SceneError::Schema {
            field: field("material_index"),
            message: format!(
                "index {} out of range for {} materials",
                object.material_index,
                materials.len()
            ),
        })?;

    let positions: Vec<Vec3> = object
        .vertices
        .chunks_exact(3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
        .collect();

    // UVs arrive as flat [u, v, _] triples; the third component is ignored.
    let uvs: Vec<Vec2> = object
        .uvs
        .chunks_exact(3)
        .map(|v| Vec2::new(v[0], v[1]))
        .collect();

    for index in &object.triangles {
        if *index as usize >= positions.len() {
            return Err(SceneError::Schema {
                field: field("triangles"),
                message: format!(
                    "vertex index {} out of range for {} vertices",
                    index,
                    positions.len()
                ),
            });
        }
    }

    // Smooth normals: accumulate face normals onto shared vertices, then
    // normalize the sums.
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in object.triangles.chunks_exact(3) {
        let (i0, i1, i2) = (face[0] as usize, face[1] as usize, face[2] as usize);
        let face_normal = (positions[i1] - positions[i0])
            .cross(positions[i2] - positions[i0])
            .normalize_or_zero();
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }
    for normal in &mut normals {
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }

    let vertex = |index: usize| {
        Vertex::new(
            positions[index],
            normals[index],
            uvs.get(index).copied().unwrap_or(Vec2::ZERO),
        )
    };

    for face in object.triangles.chunks_exact(3) {
        let (i0, i1, i2) = (face[0] as usize, face[1] as usize, face[2] as usize);

        // Degenerate triangles would yield a NaN face normal; drop them here
        // so neither the BVH nor the emissive set ever sees one.
        let cross = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        if cross.length_squared() < 1e-12 {
            log::debug!("dropping degenerate triangle in object {}", object_index);
            continue;
        }

        let mut triangle = Triangle::new(
            vertex(i0),
            vertex(i1),
            vertex(i2),
            object.material_index,
        );
        if material.kind == MaterialKind::Emissive {
            triangle.emissive_index = emissive.push(triangle, material.emission) as i32;
        }
        triangles.push(triangle);
    }

    Ok(())
}

/// Build the camera world transform from the file's row-major 3x3 rotation
/// and position.
fn camera_transform(camera: &CameraEntry) -> Mat4 {
    // Mat3::from_cols_array reads column-major, so transpose the row-major
    // input.
    let rotation = Mat3::from_cols_array(&camera.matrix).transpose();
    let mut transform = Mat4::from_mat3(rotation);
    transform.w_axis = vec3(camera.position).extend(1.0);
    transform
}

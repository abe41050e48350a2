use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::extents::Extents;
use crate::mtl::{self, Material};
use crate::obj::{self, Geometry, GeometryData};
use crate::tangent;
use crate::texture::TextureRef;

/// Asynchronous source of text assets.
///
/// This is the fetch boundary of a networked viewer; the bundled
/// [`FileSource`] reads from disk instead. The core performs no I/O of its
/// own.
#[allow(async_fn_in_trait)]
pub trait TextSource {
    async fn fetch_text(&self, path: &str) -> Result<String>;
}

/// Disk-backed [`TextSource`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextSource for FileSource {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full = self.root.join(path);
        std::fs::read_to_string(&full)
            .with_context(|| format!("unable to read {}", full.display()))
    }
}

/// Material with every field resolved against the viewer defaults, ready for
/// uniform upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderMaterial {
    pub name: String,
    pub shininess: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,
    pub optical_density: f32,
    pub opacity: f32,
    pub illum: i32,
    pub diffuse_map: TextureRef,
    pub specular_map: TextureRef,
    pub normal_map: TextureRef,
}

impl Default for RenderMaterial {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            shininess: 400.0,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            emissive: Vec3::ZERO,
            optical_density: 1.0,
            opacity: 1.0,
            illum: 2,
            diffuse_map: TextureRef::DefaultWhite,
            specular_map: TextureRef::DefaultWhite,
            normal_map: TextureRef::DefaultNormal,
        }
    }
}

impl RenderMaterial {
    /// Overlays the fields a library set onto the defaults, resolving map
    /// file names against the OBJ location.
    fn merged(name: &str, material: Option<&Material>, obj_path: &str) -> Self {
        let mut merged = Self {
            name: name.to_string(),
            ..Self::default()
        };
        let Some(material) = material else {
            return merged;
        };
        if let Some(shininess) = material.shininess {
            merged.shininess = shininess;
        }
        if let Some(ambient) = material.ambient {
            merged.ambient = ambient;
        }
        if let Some(diffuse) = material.diffuse {
            merged.diffuse = diffuse;
        }
        if let Some(specular) = material.specular {
            merged.specular = specular;
        }
        if let Some(emissive) = material.emissive {
            merged.emissive = emissive;
        }
        if let Some(optical_density) = material.optical_density {
            merged.optical_density = optical_density;
        }
        if let Some(opacity) = material.opacity {
            merged.opacity = opacity;
        }
        if let Some(illum) = material.illum {
            merged.illum = illum;
        }
        if let Some(map) = &material.diffuse_map {
            merged.diffuse_map = TextureRef::File(resolve_relative(obj_path, map));
        }
        if let Some(map) = &material.specular_map {
            merged.specular_map = TextureRef::File(resolve_relative(obj_path, map));
        }
        if let Some(map) = &material.normal_map {
            merged.normal_map = TextureRef::File(resolve_relative(obj_path, map));
        }
        merged
    }
}

/// Dense per-vertex arrays for one part, every attribute fully populated.
///
/// Attributes the source never provided are filled with constants: texcoord
/// `[0, 0]`, normal `[0, 0, 1]`, color white, tangent `[1, 0, 0]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VertexStreams {
    pub position: Vec<f32>,
    pub texcoord: Vec<f32>,
    pub normal: Vec<f32>,
    pub color: Vec<f32>,
    pub tangent: Vec<f32>,
}

impl VertexStreams {
    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    /// Attribute views in upload order, named after the shader inputs.
    pub fn attributes(&self) -> [AttributeSlice<'_>; 5] {
        [
            AttributeSlice {
                name: "a_position",
                components: 3,
                data: &self.position,
            },
            AttributeSlice {
                name: "a_texcoord",
                components: 2,
                data: &self.texcoord,
            },
            AttributeSlice {
                name: "a_normal",
                components: 3,
                data: &self.normal,
            },
            AttributeSlice {
                name: "a_color",
                components: 3,
                data: &self.color,
            },
            AttributeSlice {
                name: "a_tangent",
                components: 3,
                data: &self.tangent,
            },
        ]
    }
}

/// One named attribute array, viewable as raw bytes for buffer upload.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSlice<'a> {
    pub name: &'static str,
    pub components: usize,
    pub data: &'a [f32],
}

impl AttributeSlice<'_> {
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.data)
    }
}

/// One renderable slice of a model: a geometry with its merged material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPart {
    pub object: String,
    pub groups: Vec<String>,
    pub material: RenderMaterial,
    pub streams: VertexStreams,
}

/// Assembled model: renderable parts plus the translation that centers the
/// model on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedModel {
    pub parts: Vec<ModelPart>,
    pub offset: Vec3,
}

/// Fetches and assembles an OBJ model together with its material libraries.
///
/// Libraries named by `mtllib` are fetched relative to `obj_path` and parsed
/// as one concatenated text. Geometries naming a material no library defines
/// fall back to the defaults.
pub async fn load_model<S: TextSource>(source: &S, obj_path: &str) -> Result<LoadedModel> {
    let obj_text = source
        .fetch_text(obj_path)
        .await
        .with_context(|| format!("unable to fetch {obj_path}"))?;
    let document =
        obj::parse_obj(&obj_text).with_context(|| format!("failed to parse {obj_path}"))?;

    let mut library_text = String::new();
    for library in &document.material_libs {
        let library_path = resolve_relative(obj_path, library);
        let text = source
            .fetch_text(&library_path)
            .await
            .with_context(|| format!("unable to fetch material library {library_path}"))?;
        library_text.push_str(&text);
        library_text.push('\n');
    }
    let materials = mtl::parse_mtl(&library_text)
        .with_context(|| format!("failed to parse material libraries of {obj_path}"))?;
    debug!(
        "{obj_path}: {} geometries, {} materials",
        document.geometries.len(),
        materials.len()
    );

    let extents = Extents::of_geometries(&document.geometries);
    let offset = if extents.is_valid() {
        extents.centering_offset()
    } else {
        Vec3::ZERO
    };

    let parts = document
        .geometries
        .into_iter()
        .map(|geometry| build_part(geometry, &materials, obj_path))
        .collect();

    Ok(LoadedModel { parts, offset })
}

fn build_part(
    geometry: Geometry,
    materials: &HashMap<String, Material>,
    obj_path: &str,
) -> ModelPart {
    let record = materials.get(&geometry.material);
    if record.is_none() && geometry.material != "default" {
        warn!(
            "material '{}' is not in any referenced library, using defaults",
            geometry.material
        );
    }
    let material = RenderMaterial::merged(&geometry.material, record, obj_path);
    ModelPart {
        object: geometry.object,
        groups: geometry.groups,
        material,
        streams: build_streams(geometry.data),
    }
}

fn build_streams(data: GeometryData) -> VertexStreams {
    let vertex_count = data.position.len() / 3;
    // the tangent gate looks at what the source provided, not at defaults
    let tangent = match (&data.texcoord, &data.normal) {
        (Some(texcoord), Some(_)) => tangent::generate_tangents(&data.position, texcoord),
        _ => constant_stream(&[1.0, 0.0, 0.0], vertex_count),
    };
    VertexStreams {
        tangent,
        texcoord: data
            .texcoord
            .unwrap_or_else(|| constant_stream(&[0.0, 0.0], vertex_count)),
        normal: data
            .normal
            .unwrap_or_else(|| constant_stream(&[0.0, 0.0, 1.0], vertex_count)),
        color: data
            .color
            .unwrap_or_else(|| constant_stream(&[1.0, 1.0, 1.0], vertex_count)),
        position: data.position,
    }
}

fn constant_stream(value: &[f32], vertex_count: usize) -> Vec<f32> {
    value.repeat(vertex_count)
}

/// Resolves a referenced file name against the path of the file that named
/// it, keeping URL-style forward slashes.
fn resolve_relative(base: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        return relative.to_string();
    }
    match base.rsplit_once('/') {
        Some((directory, _)) => format!("{directory}/{relative}"),
        None => relative.to_string(),
    }
}

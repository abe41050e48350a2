//! Model loading core for the SceneView viewer, rewritten in Rust.
//!
//! The crate turns OBJ/MTL text into render-ready parts: parsing, fan
//! triangulation, tangent generation, extent calculation and material
//! merging.  Rendering, cameras and windowing are intentionally kept
//! outside of the crate so that the code remains testable and easy to
//! embed in headless tools.

pub mod error;
pub mod extents;
pub mod model;
pub mod mtl;
pub mod obj;
pub mod tangent;
pub mod texture;

pub use error::ParseError;
pub use extents::{Extents, GroundBounds};
pub use model::{
    load_model, AttributeSlice, FileSource, LoadedModel, ModelPart, RenderMaterial, TextSource,
    VertexStreams,
};
pub use mtl::{parse_mtl, Material};
pub use obj::{parse_obj, Geometry, GeometryData, ObjDocument};
pub use tangent::{generate_tangents, generate_tangents_indexed};
pub use texture::{TextureCache, TextureRef, NEUTRAL_NORMAL_PIXEL, WHITE_PIXEL};

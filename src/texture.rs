use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// RGBA payload of the 1x1 fallback used for missing diffuse/specular maps.
pub const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// RGBA payload of the 1x1 fallback normal map, encoding a +z tangent-space
/// normal.
pub const NEUTRAL_NORMAL_PIXEL: [u8; 4] = [127, 127, 255, 0];

/// Texture slot of a merged material: either an image file to load or one of
/// the built-in 1x1 fallbacks.
///
/// Decoding images is the renderer's business; the core only hands out
/// references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureRef {
    File(String),
    DefaultWhite,
    DefaultNormal,
}

impl TextureRef {
    /// Path of the referenced image, if any.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::File(name) => Some(name),
            _ => None,
        }
    }

    /// Pixel payload for the fallback variants.
    pub fn fallback_pixel(&self) -> Option<[u8; 4]> {
        match self {
            Self::File(_) => None,
            Self::DefaultWhite => Some(WHITE_PIXEL),
            Self::DefaultNormal => Some(NEUTRAL_NORMAL_PIXEL),
        }
    }
}

/// Name-keyed store of loaded texture handles, shared between model loads so
/// images referenced by several materials decode once.
///
/// Clones share the same storage; the handle type is whatever the renderer
/// uses for an uploaded texture.
#[derive(Debug)]
pub struct TextureCache<T> {
    handles: Arc<RwLock<HashMap<String, T>>>,
}

impl<T> Clone for TextureCache<T> {
    fn clone(&self) -> Self {
        Self {
            handles: Arc::clone(&self.handles),
        }
    }
}

impl<T> Default for TextureCache<T> {
    fn default() -> Self {
        Self {
            handles: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone> TextureCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the cached handle, if present.
    pub fn get(&self, name: &str) -> Option<T> {
        self.handles.read().get(name).cloned()
    }

    /// Stores a handle under the given name, replacing any previous one.
    pub fn insert(&self, name: impl Into<String>, handle: T) {
        self.handles.write().insert(name.into(), handle);
    }

    /// Returns the cached handle or creates, stores and returns a new one.
    pub fn get_or_insert_with(&self, name: &str, create: impl FnOnce() -> T) -> T {
        if let Some(handle) = self.handles.read().get(name) {
            return handle.clone();
        }
        let mut handles = self.handles.write();
        handles
            .entry(name.to_string())
            .or_insert_with(create)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }
}

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::obj::Geometry;

/// Axis-aligned bounds of a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents {
    /// Empty bounds, the identity of [`Extents::union`].
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Folds min/max over xyz triples.
    pub fn of_positions(positions: &[f32]) -> Self {
        positions
            .chunks_exact(3)
            .fold(Self::EMPTY, |extents, chunk| {
                let point = Vec3::from_slice(chunk);
                Self {
                    min: extents.min.min(point),
                    max: extents.max.max(point),
                }
            })
    }

    /// Combined bounds of every geometry's position stream.
    pub fn of_geometries(geometries: &[Geometry]) -> Self {
        geometries.iter().fold(Self::EMPTY, |extents, geometry| {
            extents.union(Self::of_positions(&geometry.data.position))
        })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Translation that moves the center of the box to the origin.
    pub fn centering_offset(self) -> Vec3 {
        -(self.min + (self.max - self.min) * 0.5)
    }

    /// False until at least one point has been folded in.
    pub fn is_valid(self) -> bool {
        self.min.cmple(self.max).all()
    }
}

/// Walkable rectangle in the xz plane, scanned from raw OBJ text.
///
/// This is a lenient pre-pass over `v` lines, not a full parse: fields that
/// fail to read are skipped and the scan never fails. Viewers use it to
/// clamp camera movement to a ground mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl GroundBounds {
    pub fn from_obj_text(text: &str) -> Self {
        let mut bounds = Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_z: f32::INFINITY,
            max_z: f32::NEG_INFINITY,
        };
        for line in text.lines() {
            let Some(rest) = line.trim().strip_prefix("v ") else {
                continue;
            };
            let mut fields = rest.split_whitespace();
            let x = fields.next().and_then(|token| token.parse::<f32>().ok());
            let _y = fields.next();
            let z = fields.next().and_then(|token| token.parse::<f32>().ok());
            if let (Some(x), Some(z)) = (x, z) {
                bounds.min_x = bounds.min_x.min(x);
                bounds.max_x = bounds.max_x.max(x);
                bounds.min_z = bounds.min_z.min(z);
                bounds.max_z = bounds.max_z.max(z);
            }
        }
        bounds
    }

    /// True when the xz point lies inside the rectangle, edges included.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Rectangle inset by `margin` on the x axis, for edge clearance.
    pub fn shrink_x(self, margin: f32) -> Self {
        Self {
            min_x: self.min_x + margin,
            max_x: self.max_x - margin,
            ..self
        }
    }
}

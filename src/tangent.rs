use glam::{Vec2, Vec3};

/// Computes one flat tangent per triangle of an unindexed mesh.
///
/// `positions` holds xyz triples and `texcoords` uv pairs for the same
/// vertices in the same order. Every corner of a triangle receives the same
/// tangent, so the output has exactly one xyz triple per input vertex and
/// shading stays faceted in tangent space. Vertices left over after the
/// last full triangle are skipped, and triangles with no stored uv data (a
/// texcoord stream shorter than the positions) fall back to `[1, 0, 0]`.
pub fn generate_tangents(positions: &[f32], texcoords: &[f32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut tangents = Vec::with_capacity(vertex_count * 3);
    for face in 0..vertex_count / 3 {
        let base = face * 3;
        let tangent = face_tangent(positions, texcoords, [base, base + 1, base + 2]);
        push_face_tangent(&mut tangents, tangent);
    }
    tangents
}

/// Indexed variant of [`generate_tangents`]: faces come from `indices` and
/// the output follows the index stream's vertex order, three entries per
/// triangle. Indices pointing past either stream fall back to `[1, 0, 0]`.
pub fn generate_tangents_indexed(
    positions: &[f32],
    texcoords: &[f32],
    indices: &[u32],
) -> Vec<f32> {
    let mut tangents = Vec::with_capacity(indices.len() * 3);
    for triangle in indices.chunks_exact(3) {
        let corners = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let tangent = face_tangent(positions, texcoords, corners);
        push_face_tangent(&mut tangents, tangent);
    }
    tangents
}

/// Tangent of one triangle from its position and uv deltas. Falls back to
/// `[1, 0, 0]` when the uv basis is degenerate (collapsed or zero-area in
/// texture space) or a corner reaches past either stream, so bump shading
/// still has a usable frame.
fn face_tangent(positions: &[f32], texcoords: &[f32], corners: [usize; 3]) -> Vec3 {
    let [c1, c2, c3] = corners;
    let (Some(p1), Some(p2), Some(p3)) = (
        read_vec3(positions, c1),
        read_vec3(positions, c2),
        read_vec3(positions, c3),
    ) else {
        return Vec3::X;
    };
    let (Some(uv1), Some(uv2), Some(uv3)) = (
        read_vec2(texcoords, c1),
        read_vec2(texcoords, c2),
        read_vec2(texcoords, c3),
    ) else {
        return Vec3::X;
    };

    let dp12 = p2 - p1;
    let dp13 = p3 - p1;
    let duv12 = uv2 - uv1;
    let duv13 = uv3 - uv1;

    let f = 1.0 / (duv12.x * duv13.y - duv13.x * duv12.y);
    if f.is_finite() {
        ((dp12 * duv13.y - dp13 * duv12.y) * f)
            .try_normalize()
            .unwrap_or(Vec3::X)
    } else {
        Vec3::X
    }
}

fn read_vec3(values: &[f32], index: usize) -> Option<Vec3> {
    values.get(index * 3..index * 3 + 3).map(Vec3::from_slice)
}

fn read_vec2(values: &[f32], index: usize) -> Option<Vec2> {
    values.get(index * 2..index * 2 + 2).map(Vec2::from_slice)
}

fn push_face_tangent(tangents: &mut Vec<f32>, tangent: Vec3) {
    for _ in 0..3 {
        tangents.extend_from_slice(&tangent.to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // unit right triangle in the xy plane with uvs matching xy
    const POSITIONS: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    const TEXCOORDS: [f32; 6] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

    #[test]
    fn tangent_follows_the_u_axis() {
        let tangents = generate_tangents(&POSITIONS, &TEXCOORDS);
        assert_eq!(tangents, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn rotated_uv_basis_rotates_the_tangent() {
        // u now grows along world y
        let positions = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let tangents = generate_tangents(&positions, &TEXCOORDS);
        assert_eq!(&tangents[0..3], &[0.0, 1.0, 0.0][..]);
    }

    #[test]
    fn tangents_are_normalized() {
        let positions = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, 0.0];
        let tangents = generate_tangents(&positions, &TEXCOORDS);
        for tangent in tangents.chunks_exact(3) {
            let length = Vec3::from_slice(tangent).length();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn all_three_corners_share_one_tangent() {
        let positions = [0.2, 0.1, 0.0, 1.3, 0.4, 0.2, 0.1, 1.8, 0.3];
        let texcoords = [0.0, 0.0, 0.7, 0.1, 0.2, 0.9];
        let tangents = generate_tangents(&positions, &texcoords);
        assert_eq!(tangents.len(), 9);
        assert_eq!(tangents[0..3], tangents[3..6]);
        assert_eq!(tangents[0..3], tangents[6..9]);
    }

    #[test]
    fn collapsed_uvs_fall_back_to_unit_x() {
        let texcoords = [0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        let tangents = generate_tangents(&POSITIONS, &texcoords);
        assert_eq!(tangents, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn zero_area_triangle_falls_back_to_unit_x() {
        let positions = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let tangents = generate_tangents(&positions, &TEXCOORDS);
        assert_eq!(&tangents[0..3], &[1.0, 0.0, 0.0][..]);
    }

    #[test]
    fn leftover_vertices_are_skipped() {
        let positions = [0.0; 12];
        let texcoords = [0.0; 8];
        let tangents = generate_tangents(&positions, &texcoords);
        assert_eq!(tangents.len(), 9);
    }

    #[test]
    fn texcoords_shorter_than_positions_fall_back_to_unit_x() {
        // uv data covers only the first of the two triangles
        let positions = [
            0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
        ];
        let tangents = generate_tangents(&positions, &TEXCOORDS);
        assert_eq!(tangents.len(), 18);
        assert_eq!(&tangents[0..3], &[0.0, 1.0, 0.0][..]);
        assert_eq!(&tangents[9..12], &[1.0, 0.0, 0.0][..]);
    }

    #[test]
    fn out_of_range_indices_fall_back_to_unit_x() {
        // u grows along world y, so the in-range triangle's tangent is not x
        let positions = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let indices = [0u32, 1, 2, 0, 2, 7];
        let tangents = generate_tangents_indexed(&positions, &TEXCOORDS, &indices);
        assert_eq!(tangents.len(), 18);
        assert_eq!(&tangents[0..3], &[0.0, 1.0, 0.0][..]);
        assert_eq!(&tangents[9..12], &[1.0, 0.0, 0.0][..]);
    }

    #[test]
    fn indexed_faces_match_expanded_faces() {
        // quad as four shared vertices, two triangles
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let texcoords = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let indices = [0u32, 1, 2, 0, 2, 3];
        let indexed = generate_tangents_indexed(&positions, &texcoords, &indices);
        assert_eq!(indexed.len(), 18);

        let mut expanded_positions = Vec::new();
        let mut expanded_texcoords = Vec::new();
        for &index in &indices {
            let index = index as usize;
            expanded_positions.extend_from_slice(&positions[index * 3..index * 3 + 3]);
            expanded_texcoords.extend_from_slice(&texcoords[index * 2..index * 2 + 2]);
        }
        let expanded = generate_tangents(&expanded_positions, &expanded_texcoords);
        assert_eq!(indexed, expanded);
    }
}

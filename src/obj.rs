use glam::{Vec2, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Parse result for one OBJ file: flattened geometries plus the material
/// libraries referenced by `mtllib` lines, in order of appearance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjDocument {
    pub geometries: Vec<Geometry>,
    pub material_libs: Vec<String>,
}

/// A contiguous run of faces sharing an object name, group list and material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub object: String,
    pub groups: Vec<String>,
    pub material: String,
    pub data: GeometryData,
}

/// Flattened per-vertex attribute streams for one geometry.
///
/// `position` holds xyz triples, `texcoord` uv pairs, `normal` and `color`
/// xyz/rgb triples, all in face order with no index buffer. Streams the
/// source never filled are `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryData {
    pub position: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texcoord: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<f32>>,
}

/// Parses OBJ text into per-material geometries.
///
/// Attribute lines feed shared pools and `f` lines copy the referenced pool
/// entries into the current geometry, so output streams are flat and
/// unindexed. Polygons are fan-triangulated. `usemtl`, `g` and `o` end the
/// current geometry; unknown keywords are skipped.
pub fn parse_obj(text: &str) -> Result<ObjDocument, ParseError> {
    let mut parser = ObjParser::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = line_no + 1;
        let (keyword, rest) = split_keyword(line);
        match keyword {
            "v" => parser.vertex(rest, line_no)?,
            "vt" => parser.texcoord(rest, line_no)?,
            "vn" => parser.normal(rest, line_no)?,
            "f" => parser.face(rest, line_no)?,
            // smoothing groups do not affect flattened output
            "s" => {}
            "mtllib" => parser.material_libs.push(rest.to_string()),
            "usemtl" => parser.use_material(rest),
            "g" => parser.set_groups(rest),
            "o" => parser.set_object(rest),
            other => {
                debug!("line {line_no}: skipping unknown keyword '{other}'");
            }
        }
    }

    Ok(parser.into_document())
}

/// Shared attribute pools, each seeded with a sentinel entry so OBJ's
/// 1-based indices address the pools directly.
struct AttributePools {
    positions: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    normals: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl AttributePools {
    fn seeded() -> Self {
        Self {
            positions: vec![Vec3::ZERO],
            texcoords: vec![Vec2::ZERO],
            normals: vec![Vec3::ZERO],
            colors: vec![Vec3::ZERO],
        }
    }
}

struct ObjParser {
    pools: AttributePools,
    object: String,
    groups: Vec<String>,
    material: String,
    material_libs: Vec<String>,
    geometries: Vec<Geometry>,
    current: Option<GeometryBuilder>,
}

impl ObjParser {
    fn new() -> Self {
        Self {
            pools: AttributePools::seeded(),
            object: "default".to_string(),
            groups: vec!["default".to_string()],
            material: "default".to_string(),
            material_libs: Vec::new(),
            geometries: Vec::new(),
            current: None,
        }
    }

    fn vertex(&mut self, rest: &str, line: usize) -> Result<(), ParseError> {
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let mut parts = fields.iter().copied();
        self.pools
            .positions
            .push(parse_vec3(&mut parts, line, "position coordinate")?);
        // six or more fields mean the vertex-color extension; fewer extras
        // (a w coordinate) are ignored rather than misread as color
        if fields.len() >= 6 {
            self.pools
                .colors
                .push(parse_vec3(&mut parts, line, "vertex color")?);
        } else if fields.len() > 3 {
            debug!("line {line}: ignoring {} extra vertex field(s)", fields.len() - 3);
        }
        Ok(())
    }

    fn texcoord(&mut self, rest: &str, line: usize) -> Result<(), ParseError> {
        let mut parts = rest.split_whitespace();
        self.pools
            .texcoords
            .push(parse_vec2(&mut parts, line, "texture coordinate")?);
        Ok(())
    }

    fn normal(&mut self, rest: &str, line: usize) -> Result<(), ParseError> {
        let mut parts = rest.split_whitespace();
        self.pools
            .normals
            .push(parse_vec3(&mut parts, line, "normal coordinate")?);
        Ok(())
    }

    fn face(&mut self, rest: &str, line: usize) -> Result<(), ParseError> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let builder = self.current.get_or_insert_with(|| {
            GeometryBuilder::new(&self.object, &self.groups, &self.material)
        });
        // fan triangulation: an n-gon becomes n-2 triangles sharing token 0
        let triangle_count = tokens.len().saturating_sub(2);
        for triangle in 0..triangle_count {
            add_vertex(&self.pools, builder, tokens[0], line)?;
            add_vertex(&self.pools, builder, tokens[triangle + 1], line)?;
            add_vertex(&self.pools, builder, tokens[triangle + 2], line)?;
        }
        Ok(())
    }

    fn use_material(&mut self, rest: &str) {
        self.material = rest.to_string();
        self.split_geometry();
    }

    fn set_groups(&mut self, rest: &str) {
        self.groups = rest.split_whitespace().map(str::to_string).collect();
        self.split_geometry();
    }

    fn set_object(&mut self, rest: &str) {
        self.object = rest.to_string();
        self.split_geometry();
    }

    /// Ends the current run of faces so the next `f` starts a fresh geometry.
    fn split_geometry(&mut self) {
        // an in-progress geometry that never received a vertex is reused,
        // labels and all, instead of emitting one record per boundary keyword
        if self.current.as_ref().is_some_and(|builder| !builder.is_empty()) {
            if let Some(builder) = self.current.take() {
                self.geometries.push(builder.finish());
            }
        }
    }

    fn into_document(mut self) -> ObjDocument {
        if let Some(builder) = self.current.take() {
            self.geometries.push(builder.finish());
        }
        ObjDocument {
            geometries: self.geometries,
            material_libs: self.material_libs,
        }
    }
}

struct GeometryBuilder {
    object: String,
    groups: Vec<String>,
    material: String,
    position: Vec<f32>,
    texcoord: Vec<f32>,
    normal: Vec<f32>,
    color: Vec<f32>,
}

impl GeometryBuilder {
    fn new(object: &str, groups: &[String], material: &str) -> Self {
        Self {
            object: object.to_string(),
            groups: groups.to_vec(),
            material: material.to_string(),
            position: Vec::new(),
            texcoord: Vec::new(),
            normal: Vec::new(),
            color: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.position.is_empty()
    }

    fn finish(self) -> Geometry {
        Geometry {
            object: self.object,
            groups: self.groups,
            material: self.material,
            data: GeometryData {
                position: self.position,
                texcoord: non_empty(self.texcoord),
                normal: non_empty(self.normal),
                color: non_empty(self.color),
            },
        }
    }
}

/// Resolves one `p[/t[/n]]` face token against the pools and appends the
/// referenced tuples to the builder. Empty slots are skipped; anything after
/// the third slot is ignored.
fn add_vertex(
    pools: &AttributePools,
    builder: &mut GeometryBuilder,
    token: &str,
    line: usize,
) -> Result<(), ParseError> {
    for (slot, part) in token.split('/').enumerate().take(3) {
        if part.is_empty() {
            continue;
        }
        let raw: i32 = part.parse().map_err(|_| ParseError::InvalidNumber {
            line,
            what: "face index",
            token: part.to_string(),
        })?;
        match slot {
            0 => {
                let index = resolve_index(raw, pools.positions.len(), "position", line)?;
                builder
                    .position
                    .extend_from_slice(&pools.positions[index].to_array());
                // colors ride along with position references once any vertex
                // line carried them
                if pools.colors.len() > 1 {
                    let color = pools.colors.get(index).ok_or(
                        ParseError::InvalidVertexReference {
                            line,
                            kind: "vertex color",
                            index: index as i32,
                            count: pools.colors.len() - 1,
                        },
                    )?;
                    builder.color.extend_from_slice(&color.to_array());
                }
            }
            1 => {
                let index = resolve_index(raw, pools.texcoords.len(), "texcoord", line)?;
                builder
                    .texcoord
                    .extend_from_slice(&pools.texcoords[index].to_array());
            }
            _ => {
                let index = resolve_index(raw, pools.normals.len(), "normal", line)?;
                builder
                    .normal
                    .extend_from_slice(&pools.normals[index].to_array());
            }
        }
    }
    Ok(())
}

/// Maps a written OBJ index to a pool slot. Index 0 holds the sentinel, so
/// positive indices address the pool directly and negative ones count back
/// from its end; both 0 and anything past the end are faults.
fn resolve_index(
    raw: i32,
    pool_len: usize,
    kind: &'static str,
    line: usize,
) -> Result<usize, ParseError> {
    let resolved = if raw >= 0 {
        i64::from(raw)
    } else {
        pool_len as i64 + i64::from(raw)
    };
    if resolved < 1 || resolved >= pool_len as i64 {
        return Err(ParseError::InvalidVertexReference {
            line,
            kind,
            index: raw,
            count: pool_len - 1,
        });
    }
    Ok(resolved as usize)
}

fn non_empty(values: Vec<f32>) -> Option<Vec<f32>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (line, ""),
    }
}

fn parse_f32(token: Option<&str>, line: usize, what: &'static str) -> Result<f32, ParseError> {
    let token = token.ok_or(ParseError::MissingValue { line, what })?;
    token.parse::<f32>().map_err(|_| ParseError::InvalidNumber {
        line,
        what,
        token: token.to_string(),
    })
}

fn parse_vec2<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &'static str,
) -> Result<Vec2, ParseError> {
    let x = parse_f32(parts.next(), line, what)?;
    let y = parse_f32(parts.next(), line, what)?;
    Ok(Vec2::new(x, y))
}

fn parse_vec3<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
    what: &'static str,
) -> Result<Vec3, ParseError> {
    let x = parse_f32(parts.next(), line, what)?;
    let y = parse_f32(parts.next(), line, what)?;
    let z = parse_f32(parts.next(), line, what)?;
    Ok(Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    #[test]
    fn parses_single_triangle() {
        let document = parse_obj(TRIANGLE).unwrap();
        assert!(document.material_libs.is_empty());
        assert_eq!(document.geometries.len(), 1);
        let geometry = &document.geometries[0];
        assert_eq!(geometry.object, "default");
        assert_eq!(geometry.groups, vec!["default".to_string()]);
        assert_eq!(geometry.material, "default");
        assert_eq!(
            geometry.data.position,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(geometry.data.texcoord, None);
        assert_eq!(geometry.data.normal, None);
        assert_eq!(geometry.data.color, None);
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse_obj(TRIANGLE).unwrap(), parse_obj(TRIANGLE).unwrap());
    }

    #[test]
    fn fan_triangulates_polygons() {
        let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        // the quad becomes triangles (1,2,3) and (1,3,4)
        assert_eq!(
            geometry.data.position,
            vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0,
            ]
        );
    }

    #[test]
    fn negative_indices_resolve_against_current_pool() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1 -2 -3\nv 5 5 5\nf -1 -1 -1\n";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        assert_eq!(
            geometry.data.position,
            vec![
                0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
                5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0,
            ]
        );
    }

    #[test]
    fn face_tokens_combine_separate_index_spaces() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 1
vn 0 0 1
f 1/1/1 2/2/1 3/1/1
";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        assert_eq!(geometry.data.position.len(), 9);
        assert_eq!(
            geometry.data.texcoord,
            Some(vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0])
        );
        assert_eq!(
            geometry.data.normal,
            Some(vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn empty_token_slots_leave_streams_absent() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        assert_eq!(geometry.data.texcoord, None);
        assert_eq!(geometry.data.normal.as_ref().map(Vec::len), Some(9));
    }

    #[test]
    fn vertex_colors_follow_position_references() {
        let obj = "\
v 0 0 0 1 0 0
v 1 0 0 0 1 0
v 0 1 0 0 0 1
f 1 2 3
";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        assert_eq!(
            geometry.data.color,
            Some(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn four_and_five_field_vertices_are_position_only() {
        let obj = "v 0 0 0 1\nv 1 0 0 1 0.5\nv 0 1 0\nf 1 2 3\n";
        let geometry = &parse_obj(obj).unwrap().geometries[0];
        assert_eq!(geometry.data.position.len(), 9);
        assert_eq!(geometry.data.color, None);
    }

    #[test]
    fn face_past_partial_color_pool_is_an_error() {
        let obj = "v 0 0 0\nv 1 0 0 0.5 0.5 0.5\nv 0 1 0 1 1 1\nf 1 2 3\n";
        let err = parse_obj(obj).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidVertexReference {
                kind: "vertex color",
                ..
            }
        ));
    }

    #[test]
    fn boundary_keywords_split_nonempty_geometries() {
        let obj = "\
mtllib scene.mtl
v 0 0 0
v 1 0 0
v 0 1 0
o car
g body paint
usemtl Body Paint
f 1 2 3
usemtl Glass
f 3 2 1
";
        let document = parse_obj(obj).unwrap();
        assert_eq!(document.material_libs, vec!["scene.mtl".to_string()]);
        assert_eq!(document.geometries.len(), 2);

        let first = &document.geometries[0];
        assert_eq!(first.object, "car");
        assert_eq!(first.groups, vec!["body".to_string(), "paint".to_string()]);
        assert_eq!(first.material, "Body Paint");
        assert_eq!(first.data.position.len(), 9);

        let second = &document.geometries[1];
        assert_eq!(second.object, "car");
        assert_eq!(second.material, "Glass");
        assert_eq!(second.data.position[0..3], [0.0, 1.0, 0.0][..]);
    }

    #[test]
    fn consecutive_boundaries_produce_no_empty_geometries() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
o first
g a
g b
usemtl paint
o second
f 1 2 3
";
        let document = parse_obj(obj).unwrap();
        assert_eq!(document.geometries.len(), 1);
        let geometry = &document.geometries[0];
        assert_eq!(geometry.object, "second");
        assert_eq!(geometry.groups, vec!["b".to_string()]);
        assert_eq!(geometry.material, "paint");
    }

    #[test]
    fn degenerate_face_line_keeps_an_empty_geometry() {
        let document = parse_obj("v 0 0 0\nf 1\n").unwrap();
        assert_eq!(document.geometries.len(), 1);
        assert!(document.geometries[0].data.position.is_empty());
    }

    #[test]
    fn sentinel_and_out_of_range_references_error() {
        let base = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        for face in ["f 0 1 2", "f 1 2 4", "f -4 1 2"] {
            let err = parse_obj(&format!("{base}{face}\n")).unwrap_err();
            assert!(
                matches!(
                    err,
                    ParseError::InvalidVertexReference {
                        kind: "position",
                        count: 3,
                        ..
                    }
                ),
                "face {face:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn malformed_face_index_is_invalid_number() {
        let err = parse_obj("v 0 0 0\nf one two three\n").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                line: 2,
                what: "face index",
                token: "one".to_string(),
            }
        );
    }

    #[test]
    fn truncated_vertex_is_missing_value() {
        let err = parse_obj("v 1 2\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingValue { line: 1, .. }));
    }

    #[test]
    fn unknown_keywords_and_comments_are_skipped() {
        let obj = "\
# exported by hand
vp 0 1
s 1
curv 0.5
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";
        let document = parse_obj(obj).unwrap();
        assert_eq!(document.geometries.len(), 1);
        assert_eq!(document.geometries[0].data.position.len(), 9);
    }

    #[test]
    fn names_after_keywords_keep_spaces() {
        let obj = "\
mtllib my materials.mtl
o Gas Station
v 0 0 0
v 1 0 0
v 0 1 0
usemtl Rusted Metal
f 1 2 3
";
        let document = parse_obj(obj).unwrap();
        assert_eq!(document.material_libs, vec!["my materials.mtl".to_string()]);
        assert_eq!(document.geometries[0].object, "Gas Station");
        assert_eq!(document.geometries[0].material, "Rusted Metal");
    }
}

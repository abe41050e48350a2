use std::collections::HashMap;

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Single material record from an MTL library.
///
/// Every field is optional; a field stays `None` when the library never set
/// it, so the assembler can merge the record over the viewer defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shininess: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffuse_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specular_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optical_density: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illum: Option<i32>,
}

/// Parses MTL text into materials keyed by name.
///
/// Material names and map file names are taken as the raw remainder of the
/// line, so both may contain spaces. Unknown keywords are skipped; a known
/// property keyword before any `newmtl` is an error.
pub fn parse_mtl(text: &str) -> Result<HashMap<String, Material>, ParseError> {
    let mut materials = HashMap::new();
    let mut current: Option<(String, Material)> = None;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = line_no + 1;
        let (keyword, rest) = split_keyword(line);
        let mut parts = rest.split_whitespace();
        match keyword {
            "newmtl" => {
                if let Some((name, material)) = current.take() {
                    materials.insert(name, material);
                }
                current = Some((rest.to_string(), Material::default()));
            }
            "Ns" => {
                require_material(&mut current, line_no, keyword)?.shininess =
                    Some(parse_f32(parts.next(), line_no, "shininess")?);
            }
            "Ka" => {
                require_material(&mut current, line_no, keyword)?.ambient =
                    Some(parse_vec3(&mut parts, line_no, "ambient color")?);
            }
            "Kd" => {
                require_material(&mut current, line_no, keyword)?.diffuse =
                    Some(parse_vec3(&mut parts, line_no, "diffuse color")?);
            }
            "Ks" => {
                require_material(&mut current, line_no, keyword)?.specular =
                    Some(parse_vec3(&mut parts, line_no, "specular color")?);
            }
            "Ke" => {
                require_material(&mut current, line_no, keyword)?.emissive =
                    Some(parse_vec3(&mut parts, line_no, "emissive color")?);
            }
            "map_Kd" => {
                require_material(&mut current, line_no, keyword)?.diffuse_map =
                    Some(rest.to_string());
            }
            "map_Ns" => {
                require_material(&mut current, line_no, keyword)?.specular_map =
                    Some(rest.to_string());
            }
            "map_Bump" => {
                require_material(&mut current, line_no, keyword)?.normal_map =
                    Some(rest.to_string());
            }
            "Ni" => {
                require_material(&mut current, line_no, keyword)?.optical_density =
                    Some(parse_f32(parts.next(), line_no, "optical density")?);
            }
            "d" => {
                require_material(&mut current, line_no, keyword)?.opacity =
                    Some(parse_f32(parts.next(), line_no, "opacity")?);
            }
            "illum" => {
                require_material(&mut current, line_no, keyword)?.illum =
                    Some(parse_i32(parts.next(), line_no, "illumination model")?);
            }
            other => {
                debug!("line {line_no}: skipping unknown material keyword '{other}'");
            }
        }
    }

    if let Some((name, material)) = current {
        materials.insert(name, material);
    }
    Ok(materials)
}

fn require_material<'a>(
    current: &'a mut Option<(String, Material)>,
    line: usize,
    keyword: &str,
) -> Result<&'a mut Material, ParseError> {
    match current {
        Some((_, material)) => Ok(material),
        None => Err(ParseError::MissingMaterialContext {
            line,
            keyword: keyword.to_string(),
        }),
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

fn parse_i32(token: Option<&str>, line: usize, what: &'static str) -> Result<i32, ParseError> {
    let token = token.ok_or(ParseError::MissingValue { line, what })?;
    token.parse::<i32>().map_err(|_| ParseError::InvalidNumber {
        line,
        what,
        token: token.to_string(),
    })
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

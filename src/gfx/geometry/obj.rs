//! Wavefront OBJ input
//!
//! [`parse_obj`] is the strict line parser used for hand-authored, already
//! triangulated assets: it keeps every array exactly as written in the file.
//! [`load_obj`] goes through `tobj` for arbitrary exported files (polygons,
//! multiple objects, per-corner attributes) and flattens them into one model.

use std::io::BufRead;
use std::path::Path;
use std::str::SplitWhitespace;

use thiserror::Error;

use super::{calculate_face_normals, Model, ModelData, ModelError};

/// Errors reported while reading OBJ text. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjError {
    #[error("line {line}: '{kind}' record needs {expected} values")]
    MissingField {
        line: usize,
        kind: &'static str,
        expected: usize,
    },

    #[error("line {line}: '{text}' is not a number")]
    InvalidNumber { line: usize, text: String },

    #[error("line {line}: '{text}' is not a valid 1-based vertex index")]
    InvalidIndex { line: usize, text: String },

    #[error("line {line}: face has {vertices} vertices, only triangles are supported")]
    UnsupportedFace { line: usize, vertices: usize },

    #[error("failed to load OBJ: {0}")]
    Load(String),
}

/// Parses triangulated OBJ text into raw model arrays
///
/// Recognized records are `v` (position), `vn` (normal), `vt` (texture
/// coordinate) and `f` (face). A face must list exactly three vertices; only
/// the position index (the first `/`-separated field) of each vertex is used,
/// converted from 1-based to 0-based. Every other record kind is ignored.
/// Counts are not cross-checked here; [`Model::new`] does that.
pub fn parse_obj(text: &str) -> Result<ModelData, ObjError> {
    let mut data = ModelData::default();

    for (number, line) in text.lines().enumerate() {
        let line_number = number + 1;
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("v") => {
                let xyz = parse_floats::<3>(&mut parts, line_number, "v")?;
                data.vertices.extend_from_slice(&xyz);
            }
            Some("vn") => {
                let xyz = parse_floats::<3>(&mut parts, line_number, "vn")?;
                data.normals.extend_from_slice(&xyz);
            }
            Some("vt") => {
                let uv = parse_floats::<2>(&mut parts, line_number, "vt")?;
                data.texture_coords.extend_from_slice(&uv);
            }
            Some("f") => {
                let groups: Vec<&str> = parts.collect();
                if groups.len() != 3 {
                    return Err(ObjError::UnsupportedFace {
                        line: line_number,
                        vertices: groups.len(),
                    });
                }
                for group in groups {
                    data.indices.push(parse_index(group, line_number)?);
                }
            }
            _ => {}
        }
    }

    Ok(data)
}

fn parse_floats<const N: usize>(
    parts: &mut SplitWhitespace<'_>,
    line: usize,
    kind: &'static str,
) -> Result<[f32; N], ObjError> {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let text = parts.next().ok_or(ObjError::MissingField {
            line,
            kind,
            expected: N,
        })?;
        let invalid = || ObjError::InvalidNumber {
            line,
            text: text.to_string(),
        };
        let parsed: f32 = text.parse().map_err(|_| invalid())?;
        // `parse` accepts "nan" and "inf"
        if !parsed.is_finite() {
            return Err(invalid());
        }
        *value = parsed;
    }
    Ok(values)
}

fn parse_index(group: &str, line: usize) -> Result<u32, ObjError> {
    let invalid = || ObjError::InvalidIndex {
        line,
        text: group.to_string(),
    };
    let position = group.split('/').next().unwrap_or_default();
    let index: u32 = position.parse().map_err(|_| invalid())?;
    index.checked_sub(1).ok_or_else(invalid)
}

/// Loads an OBJ file from disk through `tobj`
///
/// Polygons are triangulated and per-corner attributes are unified into a
/// single index stream. All objects in the file are merged into one model;
/// objects without normals get computed smooth normals.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Model, ModelError> {
    let path = path.as_ref();
    log::debug!("loading OBJ from {}", path.display());
    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|e| ObjError::Load(e.to_string()))?;
    merge_models(&models)
}

/// Like [`load_obj`], reading from any buffered reader; `mtllib` references
/// are ignored
pub fn load_obj_reader(reader: &mut impl BufRead) -> Result<Model, ModelError> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| ObjError::Load(e.to_string()))?;
    merge_models(&models)
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Texture coordinates are kept when any object has them; objects without
/// them get (0, 0) per vertex so the arrays stay aligned.
fn merge_models(models: &[tobj::Model]) -> Result<Model, ModelError> {
    let mut data = ModelData::default();
    let textured = models
        .iter()
        .any(|m| !m.mesh.texcoords.is_empty() && m.mesh.texcoords.len() == m.mesh.positions.len() / 3 * 2);

    for model in models {
        let mesh = &model.mesh;
        let base = (data.vertices.len() / 3) as u32;
        let vertex_count = mesh.positions.len() / 3;

        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            log::debug!("OBJ object '{}' has no usable normals", model.name);
            calculate_face_normals(&mesh.positions, &mesh.indices)
        };

        data.vertices.extend_from_slice(&mesh.positions);
        data.normals.extend_from_slice(&normals);
        if textured {
            if mesh.texcoords.len() == vertex_count * 2 {
                data.texture_coords.extend_from_slice(&mesh.texcoords);
            } else {
                data.texture_coords.resize(data.texture_coords.len() + vertex_count * 2, 0.0);
            }
        }
        data.indices.extend(mesh.indices.iter().map(|i| i + base));
    }

    Model::new(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn test_single_triangle() {
        let data = parse_obj(TRIANGLE).unwrap();
        assert_eq!(data.vertices, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(data.indices, vec![0, 1, 2]);
        assert!(data.normals.is_empty());
        assert!(data.texture_coords.is_empty());
    }

    #[test]
    fn test_all_record_kinds() {
        let text = "# exported\n\
                    o Box\n\
                    v 0 0 0\nv 1 0 0\nv 0 1 0\n\
                    vn 0 0 1\nvn 0 0 1\nvn 0 0 1\n\
                    vt 0 0\nvt 1 0\nvt 0 1\n\
                    s off\n\
                    f 1/1/1 2/2/2 3/3/3\n";
        let data = parse_obj(text).unwrap();
        assert_eq!(data.normals.len(), 9);
        assert_eq!(data.texture_coords, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(data.indices, vec![0, 1, 2]);

        let model = Model::from_obj(text).unwrap();
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn test_quad_face_is_rejected() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        assert_eq!(
            parse_obj(text),
            Err(ObjError::UnsupportedFace {
                line: 5,
                vertices: 4
            })
        );
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = parse_obj("v 0 0 0\nv 1 zero 0\n").unwrap_err();
        assert_eq!(
            err,
            ObjError::InvalidNumber {
                line: 2,
                text: "zero".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        assert_eq!(
            parse_obj("v nan 0 0\nv 1 0 0\n"),
            Err(ObjError::InvalidNumber {
                line: 1,
                text: "nan".to_string()
            })
        );
        assert_eq!(
            parse_obj("v 0 0 0\nvn inf 0 0\n"),
            Err(ObjError::InvalidNumber {
                line: 2,
                text: "inf".to_string()
            })
        );
        assert!(matches!(
            Model::from_obj("v NaN 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n"),
            Err(ModelError::Obj(ObjError::InvalidNumber { line: 1, .. }))
        ));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        assert!(matches!(
            parse_obj("vn 0 1\n"),
            Err(ObjError::MissingField { line: 1, kind: "vn", expected: 3 })
        ));
    }

    #[test]
    fn test_zero_index_is_rejected() {
        assert!(matches!(
            parse_obj("v 0 0 0\nf 0 1 1\n"),
            Err(ObjError::InvalidIndex { line: 2, .. })
        ));
    }

    #[test]
    fn test_index_past_end_fails_validation() {
        let err = Model::from_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        assert!(matches!(err, ModelError::IndexOutOfRange { index: 3, .. }));
    }

    #[test]
    fn test_tobj_reader_triangulates_quads() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let model = load_obj_reader(&mut text.as_bytes()).unwrap();
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.vertex_count(), 4);
        assert_eq!(model.normals().len(), 12);
    }

    #[test]
    fn test_tobj_reader_merges_objects() {
        let text = "o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n\
                    o b\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n";
        let model = load_obj_reader(&mut text.as_bytes()).unwrap();
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_tobj_reader_pads_missing_texture_coords() {
        let text = "o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.5 0.5\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n\
                    o b\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n";
        let model = load_obj_reader(&mut text.as_bytes()).unwrap();
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.texture_coords().len(), 12);
        assert_eq!(&model.texture_coords()[6..], &[0.0; 6]);
    }
}

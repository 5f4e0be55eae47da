//! # Geometry
//!
//! Raw model data, the validated immutable [`Model`] built from it, the
//! built-in cube and Wavefront OBJ loading.
//!
//! ## Usage
//!
//! ```no_run
//! use pallet3d::gfx::geometry::{cube_model_data, Model};
//!
//! let cube = Model::new(cube_model_data()).unwrap();
//! assert_eq!(cube.vertex_buffer_data().len(), 24 * 6);
//! ```

pub mod obj;
pub mod primitives;

pub use obj::{load_obj, load_obj_reader, parse_obj, ObjError};
pub use primitives::cube_model_data;

use thiserror::Error;

use crate::gfx::scene::vertex::Vertex3D;

/// Problems found while validating [`ModelData`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("{array} has {len} floats, which is not a multiple of {group}")]
    RaggedArray {
        array: &'static str,
        len: usize,
        group: usize,
    },

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    #[error("model has {vertices} vertices but {normals} normals")]
    NormalCountMismatch { vertices: usize, normals: usize },

    #[error(transparent)]
    Obj(#[from] ObjError),
}

/// Flat model arrays as authored or parsed
///
/// - `vertices`: positions in groups of three
/// - `normals`: one normal per vertex, groups of three
/// - `texture_coords`: (u, v) pairs
/// - `indices`: triangles, three 0-based vertex indices each
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub texture_coords: Vec<f32>,
    pub indices: Vec<u32>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Validated, immutable geometry
///
/// Geometry changes are made by building a new `Model`, never by editing one
/// in place. The interleaved upload buffer is built once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    data: ModelData,
    interleaved: Vec<Vertex3D>,
}

impl Model {
    /// Validates `data` and builds the interleaved buffer
    ///
    /// An empty normal array is filled with smooth normals averaged from the
    /// faces; a non-empty one must have exactly one normal per vertex.
    pub fn new(mut data: ModelData) -> Result<Self, ModelError> {
        check_groups("vertices", data.vertices.len(), 3)?;
        check_groups("normals", data.normals.len(), 3)?;
        check_groups("texture_coords", data.texture_coords.len(), 2)?;
        if data.indices.len() % 3 != 0 {
            return Err(ModelError::RaggedArray {
                array: "indices",
                len: data.indices.len(),
                group: 3,
            });
        }

        let vertex_count = data.vertex_count();
        if let Some((position, &index)) = data
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(ModelError::IndexOutOfRange {
                index,
                position,
                vertex_count,
            });
        }

        if data.normals.is_empty() && vertex_count > 0 {
            log::debug!("model has no normals, computing {vertex_count} from faces");
            data.normals = calculate_face_normals(&data.vertices, &data.indices);
        } else if data.normals.len() != data.vertices.len() {
            return Err(ModelError::NormalCountMismatch {
                vertices: vertex_count,
                normals: data.normals.len() / 3,
            });
        }

        let interleaved = data
            .vertices
            .chunks_exact(3)
            .zip(data.normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Ok(Self { data, interleaved })
    }

    /// Parses OBJ text and validates the result
    pub fn from_obj(text: &str) -> Result<Self, ModelError> {
        Self::new(parse_obj(text)?)
    }

    /// Interleaved `[x, y, z, nx, ny, nz]` per vertex, in vertex order
    pub fn vertex_buffer_data(&self) -> &[f32] {
        bytemuck::cast_slice(&self.interleaved)
    }

    pub fn interleaved(&self) -> &[Vertex3D] {
        &self.interleaved
    }

    pub fn vertices(&self) -> &[f32] {
        &self.data.vertices
    }

    pub fn normals(&self) -> &[f32] {
        &self.data.normals
    }

    pub fn texture_coords(&self) -> &[f32] {
        &self.data.texture_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.data.indices
    }

    pub fn data(&self) -> &ModelData {
        &self.data
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.data.triangle_count()
    }
}

fn check_groups(array: &'static str, len: usize, group: usize) -> Result<(), ModelError> {
    if len % group == 0 {
        Ok(())
    } else {
        Err(ModelError::RaggedArray { array, len, group })
    }
}

/// Smooth per-vertex normals: each vertex gets the normalized average of the
/// face normals of every triangle that uses it.
pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let vertex_count = positions.len() / 3;
    let mut normals = vec![0.0f32; positions.len()];
    let mut counts = vec![0u32; vertex_count];

    let corner = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

    for triangle in indices.chunks_exact(3) {
        let (i0, i1, i2) = (
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        );
        let (v0, v1, v2) = (corner(i0), corner(i1), corner(i2));

        let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let face_normal = [
            edge1[1] * edge2[2] - edge1[2] * edge2[1],
            edge1[2] * edge2[0] - edge1[0] * edge2[2],
            edge1[0] * edge2[1] - edge1[1] * edge2[0],
        ];

        for &vertex in &[i0, i1, i2] {
            for axis in 0..3 {
                normals[vertex * 3 + axis] += face_normal[axis];
            }
            counts[vertex] += 1;
        }
    }

    for (normal, &count) in normals.chunks_exact_mut(3).zip(counts.iter()) {
        if count == 0 {
            continue;
        }
        let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
        if length > 0.0 {
            normal.iter_mut().for_each(|c| *c /= length);
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> ModelData {
        ModelData {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            texture_coords: vec![],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_vertex_buffer_data_interleaves_in_order() {
        let model = Model::new(triangle()).unwrap();
        assert_eq!(
            model.vertex_buffer_data(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
                1.0, 0.0, 0.0, 0.0, 0.0, 1.0, //
                0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
            ]
        );
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let mut data = triangle();
        data.normals.clear();
        let model = Model::new(data).unwrap();
        assert_eq!(model.normals().len(), 9);
        for normal in model.normals().chunks(3) {
            assert_eq!(normal, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_mismatched_normals_are_rejected() {
        let mut data = triangle();
        data.normals.truncate(6);
        assert_eq!(
            Model::new(data),
            Err(ModelError::NormalCountMismatch {
                vertices: 3,
                normals: 2
            })
        );
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut data = triangle();
        data.indices = vec![0, 1, 3];
        assert!(matches!(
            Model::new(data),
            Err(ModelError::IndexOutOfRange { index: 3, position: 2, .. })
        ));
    }

    #[test]
    fn test_ragged_arrays_are_rejected() {
        let mut data = triangle();
        data.vertices.push(1.0);
        assert!(matches!(
            Model::new(data),
            Err(ModelError::RaggedArray { array: "vertices", .. })
        ));

        let mut data = triangle();
        data.indices.push(0);
        assert!(matches!(
            Model::new(data),
            Err(ModelError::RaggedArray { array: "indices", .. })
        ));
    }

    #[test]
    fn test_empty_model_is_valid() {
        let model = Model::new(ModelData::default()).unwrap();
        assert_eq!(model.vertex_count(), 0);
        assert!(model.vertex_buffer_data().is_empty());
    }
}

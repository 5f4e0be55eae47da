//! # Built-in Shapes
//!
//! The unit cube every pallet part is drawn from.

use super::ModelData;

/// Unit cube centered at the origin, spanning -0.5..0.5 on every axis
///
/// Each face has its own four vertices so normals and texture coordinates can
/// differ per face: 24 vertices, 24 normals, 24 texture coordinates and 12
/// triangles. Normals have length 0.5; shaders normalize them.
#[rustfmt::skip]
pub fn cube_model_data() -> ModelData {
    ModelData {
        vertices: vec![
            // Front face
            -0.5, -0.5,  0.5,   0.5, -0.5,  0.5,   0.5,  0.5,  0.5,  -0.5,  0.5,  0.5,
            // Back face
            -0.5, -0.5, -0.5,   0.5, -0.5, -0.5,   0.5,  0.5, -0.5,  -0.5,  0.5, -0.5,
            // Left face
            -0.5, -0.5, -0.5,  -0.5, -0.5,  0.5,  -0.5,  0.5,  0.5,  -0.5,  0.5, -0.5,
            // Right face
             0.5, -0.5, -0.5,   0.5, -0.5,  0.5,   0.5,  0.5,  0.5,   0.5,  0.5, -0.5,
            // Top face
            -0.5,  0.5, -0.5,   0.5,  0.5, -0.5,   0.5,  0.5,  0.5,  -0.5,  0.5,  0.5,
            // Bottom face
            -0.5, -0.5, -0.5,   0.5, -0.5, -0.5,   0.5, -0.5,  0.5,  -0.5, -0.5,  0.5,
        ],
        normals: vec![
             0.0,  0.0,  0.5,   0.0,  0.0,  0.5,   0.0,  0.0,  0.5,   0.0,  0.0,  0.5,
             0.0,  0.0, -0.5,   0.0,  0.0, -0.5,   0.0,  0.0, -0.5,   0.0,  0.0, -0.5,
            -0.5,  0.0,  0.0,  -0.5,  0.0,  0.0,  -0.5,  0.0,  0.0,  -0.5,  0.0,  0.0,
             0.5,  0.0,  0.0,   0.5,  0.0,  0.0,   0.5,  0.0,  0.0,   0.5,  0.0,  0.0,
             0.0,  0.5,  0.0,   0.0,  0.5,  0.0,   0.0,  0.5,  0.0,   0.0,  0.5,  0.0,
             0.0, -0.5,  0.0,   0.0, -0.5,  0.0,   0.0, -0.5,  0.0,   0.0, -0.5,  0.0,
        ],
        texture_coords: vec![
            0.0, 0.0,  0.5, 0.0,  0.5, 0.5,  0.0, 0.5,
            0.5, 0.0,  0.0, 0.0,  0.0, 0.5,  0.5, 0.5,
            0.0, 0.0,  0.5, 0.0,  0.5, 0.5,  0.0, 0.5,
            0.0, 0.0,  0.5, 0.0,  0.5, 0.5,  0.0, 0.5,
            0.0, 0.0,  0.5, 0.0,  0.5, 0.5,  0.0, 0.5,
            0.0, 0.0,  0.5, 0.0,  0.5, 0.5,  0.0, 0.5,
        ],
        indices: vec![
             0,  1,  2,   0,  2,  3, // Front
             4,  5,  6,   4,  6,  7, // Back
             8,  9, 10,   8, 10, 11, // Left
            12, 13, 14,  12, 14, 15, // Right
            16, 17, 18,  16, 18, 19, // Top
            20, 21, 22,  20, 22, 23, // Bottom
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::Model;

    #[test]
    fn test_cube_generation() {
        let cube = cube_model_data();
        assert_eq!(cube.vertices.len() / 3, 24);
        assert_eq!(cube.normals.len() / 3, 24);
        assert_eq!(cube.texture_coords.len() / 2, 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(cube.triangle_count(), 12);
        assert!(cube.indices.iter().all(|&i| i < 24));
    }

    #[test]
    fn test_cube_normals_point_away_from_center() {
        let cube = Model::new(cube_model_data()).unwrap();
        for vertex in cube.interleaved() {
            let dot: f32 = vertex
                .position
                .iter()
                .zip(vertex.normal.iter())
                .map(|(p, n)| p * n)
                .sum();
            assert!(dot > 0.0);
        }
    }
}

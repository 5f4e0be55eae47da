//! # Vertex Data Structures
//!
//! GPU-compatible interleaved vertex format and the attribute layout that
//! renderers bind for it.

use crate::gfx::device::{ComponentType, VertexAttribute};

/// A 3D vertex with position and normal data.
///
/// `#[repr(C)]` keeps the field order and packing identical to the interleaved
/// `[x, y, z, nx, ny, nz]` buffer the shaders read.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
}

/// Size of one interleaved vertex in bytes
pub const VERTEX_STRIDE: u64 = std::mem::size_of::<Vertex3D>() as u64;

impl Vertex3D {
    /// Layout of the `aPosition` attribute inside the interleaved buffer
    pub const POSITION: VertexAttribute = VertexAttribute {
        size: 3,
        component: ComponentType::Float32,
        normalize: false,
        stride: VERTEX_STRIDE,
        offset: 0,
    };

    /// Layout of the `aNormal` attribute inside the interleaved buffer
    pub const NORMAL: VertexAttribute = VertexAttribute {
        size: 3,
        component: ComponentType::Float32,
        normalize: false,
        stride: VERTEX_STRIDE,
        offset: std::mem::size_of::<[f32; 3]>() as u64,
    };

    /// Returns the attribute layout for the named shader input, if the
    /// interleaved format carries it
    pub fn attribute(name: &str) -> Option<VertexAttribute> {
        match name {
            "aPosition" => Some(Self::POSITION),
            "aNormal" => Some(Self::NORMAL),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_layout() {
        assert_eq!(VERTEX_STRIDE, 24);
        assert_eq!(Vertex3D::NORMAL.offset, 12);
        assert_eq!(std::mem::size_of::<Vertex3D>(), VERTEX_STRIDE as usize);
        assert!(Vertex3D::attribute("aTexCoord").is_none());
    }
}

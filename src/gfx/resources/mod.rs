// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Materials with their shader programs, and the depth buffer texture.

pub mod material;
pub mod texture_resource;

// Re-export main types
pub use material::{lambert_intensity, shade, ActiveProgram, LitMaterial, Material, UnlitMaterial};
pub use texture_resource::TextureResource;

// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Small wrappers around wgpu types used by the render engine.

pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_types::*;
pub use uniform_buffer::{align_to, DynamicUniformBuffer, UniformSlots};

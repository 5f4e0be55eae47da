//! Camera: transform-placed perspective projection

pub mod camera;

// Re-export main types
pub use camera::{Camera, Projection};

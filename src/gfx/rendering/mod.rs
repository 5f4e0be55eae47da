//! Rendering: per-object renderers and the wgpu device they draw through

pub mod pipeline_manager;
pub mod render_engine;
pub mod renderer;

pub use render_engine::RenderEngine;
pub use renderer::{RenderProperties, Renderer};

//! Error types for the graphics layer
//!
//! Setup failures (shader build, adapter/device acquisition) and per-draw
//! contract violations (unknown uniform or attribute names) are all reported
//! through [`RenderError`]. Geometry and scene-construction problems have their
//! own enums and convert into it.

use thiserror::Error;

use super::geometry::ModelError;
use super::scene::SceneError;

/// Centralized error type for all device, material and render operations
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("shader '{label}' failed to compile: {log}")]
    Compile { label: String, log: String },

    #[error("shader program '{label}' failed to link: {log}")]
    Link { label: String, log: String },

    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },

    #[error("uniform '{name}' in program '{program}' is a {expected}, got a {actual}")]
    UniformKindMismatch {
        program: String,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("program '{program}' has no vertex attribute named '{name}'")]
    UnknownAttribute { program: String, name: String },

    #[error("program '{program}' drew without a binding for vertex attribute '{name}'")]
    UnboundAttribute { program: String, name: String },

    #[error("unsupported vertex format: {size} x {component:?} (normalize: {normalize})")]
    UnsupportedVertexFormat {
        size: u32,
        component: super::device::ComponentType,
        normalize: bool,
    },

    #[error("draw issued with no active program")]
    NoActiveProgram,

    #[error("write of {len} bytes at offset {offset} overflows buffer #{buffer} of {size} bytes")]
    BufferOverflow {
        buffer: u64,
        offset: u64,
        len: u64,
        size: u64,
    },

    #[error("write of {len} bytes at offset {offset} into buffer #{buffer} is not 4-byte aligned")]
    UnalignedBufferWrite { buffer: u64, offset: u64, len: u64 },

    #[error("unknown device resource #{0}")]
    UnknownResource(u64),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),

    #[error("failed to create graphics device: {0}")]
    Device(String),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl RenderError {
    pub fn surface<T: ToString>(msg: T) -> Self {
        RenderError::Surface(msg.to_string())
    }
}

/// Result type alias for graphics operations
pub type RenderResult<T> = Result<T, RenderError>;

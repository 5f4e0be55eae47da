//! # Graphics Device
//!
//! The GPU capability materials and renderers draw through. A
//! [`GraphicsDevice`] compiles shader programs, owns vertex/index buffers,
//! stages uniform values per program and records indexed draws.
//!
//! Two backends implement it:
//!
//! - [`RenderEngine`](crate::gfx::rendering::RenderEngine) presents to a
//!   window surface through wgpu
//! - [`RecordingDevice`] captures every frame as plain data, for tests and
//!   headless runs
//!
//! ## Resource lifetime
//!
//! [`ProgramHandle`] and [`BufferHandle`] own their device resource. They are
//! not `Clone`; dropping one pushes its id onto the device's [`ReleaseQueue`]
//! and the device frees it at the start of the next frame or when it is
//! itself dropped.

pub mod recording;
pub mod uniform_layout;

pub use recording::{DrawCall, Frame, RecordingDevice};
pub use uniform_layout::{UniformEntry, UniformLayout};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use cgmath::{Matrix4, Vector3, Vector4};

use super::error::{RenderError, RenderResult};

/// Largest uniform block a program may declare, in bytes
pub const MAX_UNIFORM_BLOCK_SIZE: u64 = 256;

pub type ResourceId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Program,
    Buffer,
}

/// Shared list of resources whose handles have been dropped
///
/// Cloned into every handle a device creates.
#[derive(Debug, Clone, Default)]
pub struct ReleaseQueue(Rc<RefCell<Vec<(ResourceKind, ResourceId)>>>);

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: ResourceKind, id: ResourceId) {
        self.0.borrow_mut().push((kind, id));
    }

    /// Takes every pending release
    pub fn drain(&self) -> Vec<(ResourceKind, ResourceId)> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// Owning handle to a linked shader program
#[derive(Debug)]
pub struct ProgramHandle {
    id: ResourceId,
    label: String,
    queue: ReleaseQueue,
}

impl ProgramHandle {
    pub fn new(id: ResourceId, label: impl Into<String>, queue: ReleaseQueue) -> Self {
        Self {
            id,
            label: label.into(),
            queue,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for ProgramHandle {
    fn drop(&mut self) {
        self.queue.push(ResourceKind::Program, self.id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Owning handle to a vertex or index buffer
#[derive(Debug)]
pub struct BufferHandle {
    id: ResourceId,
    kind: BufferKind,
    size: u64,
    queue: ReleaseQueue,
}

impl BufferHandle {
    pub fn new(id: ResourceId, kind: BufferKind, size: u64, queue: ReleaseQueue) -> Self {
        Self {
            id,
            kind,
            size,
            queue,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Size in bytes at creation
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Checks that writing `len` bytes at `offset` stays inside the buffer
    /// and that both are multiples of [`wgpu::COPY_BUFFER_ALIGNMENT`]
    pub fn check_write(&self, offset: u64, len: u64) -> RenderResult<()> {
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(RenderError::UnalignedBufferWrite {
                buffer: self.id,
                offset,
                len,
            });
        }
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(RenderError::BufferOverflow {
                buffer: self.id,
                offset,
                len,
                size: self.size,
            }),
        }
    }
}

impl Drop for BufferHandle {
    fn drop(&mut self) {
        self.queue.push(ResourceKind::Buffer, self.id);
    }
}

/// Shape of a uniform in a program's uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Size in bytes
    pub fn size(self) -> u64 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    /// WGSL alignment in bytes
    pub fn align(self) -> u64 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat4 => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UniformKind::Float => "f32",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }
}

/// A value for one uniform. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        UniformValue::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        UniformValue::Vec4(value.into())
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(value: [f32; 4]) -> Self {
        UniformValue::Vec4(value)
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        UniformValue::Mat4(value.into())
    }
}

/// Scalar type of one vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Uint8,
    Sint8,
    Uint16,
    Sint16,
    Uint32,
    Sint32,
}

/// Where a named attribute lives inside a vertex buffer
///
/// `size` is the component count (1 to 4), `stride` and `offset` are bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub size: u32,
    pub component: ComponentType,
    pub normalize: bool,
    pub stride: u64,
    pub offset: u64,
}

impl VertexAttribute {
    /// The wgpu vertex format for this attribute, if one exists
    pub fn format(&self) -> RenderResult<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        use ComponentType as C;

        let format = match (self.component, self.size, self.normalize) {
            (C::Float32, 1, false) => Some(F::Float32),
            (C::Float32, 2, false) => Some(F::Float32x2),
            (C::Float32, 3, false) => Some(F::Float32x3),
            (C::Float32, 4, false) => Some(F::Float32x4),
            (C::Uint8, 2, false) => Some(F::Uint8x2),
            (C::Uint8, 4, false) => Some(F::Uint8x4),
            (C::Uint8, 2, true) => Some(F::Unorm8x2),
            (C::Uint8, 4, true) => Some(F::Unorm8x4),
            (C::Sint8, 2, false) => Some(F::Sint8x2),
            (C::Sint8, 4, false) => Some(F::Sint8x4),
            (C::Sint8, 2, true) => Some(F::Snorm8x2),
            (C::Sint8, 4, true) => Some(F::Snorm8x4),
            (C::Uint16, 2, false) => Some(F::Uint16x2),
            (C::Uint16, 4, false) => Some(F::Uint16x4),
            (C::Uint16, 2, true) => Some(F::Unorm16x2),
            (C::Uint16, 4, true) => Some(F::Unorm16x4),
            (C::Sint16, 2, false) => Some(F::Sint16x2),
            (C::Sint16, 4, false) => Some(F::Sint16x4),
            (C::Sint16, 2, true) => Some(F::Snorm16x2),
            (C::Sint16, 4, true) => Some(F::Snorm16x4),
            (C::Uint32, 1, false) => Some(F::Uint32),
            (C::Uint32, 2, false) => Some(F::Uint32x2),
            (C::Uint32, 3, false) => Some(F::Uint32x3),
            (C::Uint32, 4, false) => Some(F::Uint32x4),
            (C::Sint32, 1, false) => Some(F::Sint32),
            (C::Sint32, 2, false) => Some(F::Sint32x2),
            (C::Sint32, 3, false) => Some(F::Sint32x3),
            (C::Sint32, 4, false) => Some(F::Sint32x4),
            _ => None,
        };

        format.ok_or(RenderError::UnsupportedVertexFormat {
            size: self.size,
            component: self.component,
            normalize: self.normalize,
        })
    }
}

/// Names a program exposes: its uniform block members in declaration order
/// and its vertex inputs with their `@location`s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderInterface {
    pub uniforms: Vec<(String, UniformKind)>,
    pub attributes: Vec<(String, u32)>,
}

impl ShaderInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniform(mut self, name: &str, kind: UniformKind) -> Self {
        self.uniforms.push((name.to_string(), kind));
        self
    }

    pub fn attribute(mut self, name: &str, location: u32) -> Self {
        self.attributes.push((name.to_string(), location));
        self
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, location)| location)
    }

    pub fn layout(&self) -> UniformLayout {
        UniformLayout::new(self.uniforms.iter().map(|(n, k)| (n.as_str(), *k)))
    }
}

/// WGSL sources for one program
///
/// The vertex stage must define `vs_main` and the fragment stage `fs_main`.
/// Uniforms are members of a single struct bound at `@group(0) @binding(0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
    pub interface: ShaderInterface,
}

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

impl ShaderSource {
    /// Checks that both stages and the declared interface agree
    ///
    /// Every backend runs this before handing the sources to its compiler, so
    /// a name declared by a material but missing from its shaders fails the
    /// same way everywhere.
    pub fn validate(&self) -> RenderResult<()> {
        if !defines_fn(&self.vertex, VERTEX_ENTRY) {
            return Err(RenderError::Compile {
                label: format!("{} (vertex)", self.label),
                log: format!("entry point `{VERTEX_ENTRY}` not found"),
            });
        }
        if !defines_fn(&self.fragment, FRAGMENT_ENTRY) {
            return Err(RenderError::Compile {
                label: format!("{} (fragment)", self.label),
                log: format!("entry point `{FRAGMENT_ENTRY}` not found"),
            });
        }

        let link_error = |log: String| RenderError::Link {
            label: self.label.clone(),
            log,
        };

        for (name, _) in &self.interface.uniforms {
            if !self.vertex.contains(name.as_str()) && !self.fragment.contains(name.as_str()) {
                return Err(link_error(format!(
                    "uniform `{name}` is not used by either stage"
                )));
            }
        }

        for (i, (name, location)) in self.interface.attributes.iter().enumerate() {
            if !self.vertex.contains(name.as_str()) {
                return Err(link_error(format!(
                    "vertex input `{name}` is not declared by the vertex stage"
                )));
            }
            if self.interface.attributes[..i]
                .iter()
                .any(|(_, other)| other == location)
            {
                return Err(link_error(format!(
                    "vertex input `{name}` reuses location {location}"
                )));
            }
        }

        let size = self.interface.layout().size();
        if size > MAX_UNIFORM_BLOCK_SIZE {
            return Err(link_error(format!(
                "uniform block is {size} bytes, the limit is {MAX_UNIFORM_BLOCK_SIZE}"
            )));
        }

        Ok(())
    }
}

fn defines_fn(source: &str, name: &str) -> bool {
    source
        .match_indices("fn ")
        .any(|(at, _)| source[at + 3..].trim_start().starts_with(name))
}

/// Per-program state every backend keeps: staged uniform bytes and the
/// attribute bindings made since the program was created
#[derive(Debug, Clone)]
pub struct ProgramState {
    pub label: String,
    pub interface: ShaderInterface,
    pub layout: UniformLayout,
    pub staging: Vec<u8>,
    pub attributes: BTreeMap<u32, (String, VertexAttribute)>,
}

impl ProgramState {
    pub fn new(source: &ShaderSource) -> Self {
        let layout = source.interface.layout();
        Self {
            label: source.label.clone(),
            interface: source.interface.clone(),
            staging: vec![0; layout.size() as usize],
            layout,
            attributes: BTreeMap::new(),
        }
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let entry = self
            .layout
            .entry(name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.label.clone(),
                name: name.to_string(),
            })?;

        if entry.kind != value.kind() {
            return Err(RenderError::UniformKindMismatch {
                program: self.label.clone(),
                name: name.to_string(),
                expected: entry.kind.name(),
                actual: value.kind().name(),
            });
        }

        let start = entry.offset as usize;
        let bytes = value.as_bytes();
        self.staging[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_attribute(&mut self, name: &str, attribute: VertexAttribute) -> RenderResult<()> {
        let location = self.interface.attribute_location(name).ok_or_else(|| {
            RenderError::UnknownAttribute {
                program: self.label.clone(),
                name: name.to_string(),
            }
        })?;
        attribute.format()?;
        self.attributes
            .insert(location, (name.to_string(), attribute));
        Ok(())
    }

    /// Fails if any declared vertex input has never been bound
    pub fn check_bound(&self) -> RenderResult<()> {
        match self
            .interface
            .attributes
            .iter()
            .find(|(_, location)| !self.attributes.contains_key(location))
        {
            Some((name, _)) => Err(RenderError::UnboundAttribute {
                program: self.label.clone(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// The GPU capability the rendering layer consumes
///
/// All calls happen on one thread, once per frame in this order: `clear`,
/// any number of program/uniform/attribute/draw calls, `present`.
pub trait GraphicsDevice {
    /// Compiles and links a vertex + fragment program
    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramHandle>;

    /// Creates a buffer initialized with `contents`
    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle;

    /// Overwrites part of a buffer
    ///
    /// Writes never grow the buffer; see [`BufferHandle::check_write`].
    fn write_buffer(
        &mut self,
        buffer: &BufferHandle,
        offset: u64,
        contents: &[u8],
    ) -> RenderResult<()>;

    /// Makes `program` current for subsequent draws; `None` deactivates
    fn use_program(&mut self, program: Option<&ProgramHandle>);

    fn set_uniform(
        &mut self,
        program: &ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> RenderResult<()>;

    fn set_vertex_attribute(
        &mut self,
        program: &ProgramHandle,
        name: &str,
        attribute: VertexAttribute,
    ) -> RenderResult<()>;

    /// Draws `index_count` indices as triangles with the current program,
    /// its staged uniforms and its attribute bindings
    fn draw_indexed(
        &mut self,
        vertices: &BufferHandle,
        indices: &BufferHandle,
        index_count: u32,
    ) -> RenderResult<()>;

    /// Starts a frame, clearing color to `color` and depth to the far plane
    fn clear(&mut self, color: [f32; 4]);

    fn set_viewport(&mut self, width: u32, height: u32);

    fn enable_depth_test(&mut self, enabled: bool);

    /// Finishes the frame
    fn present(&mut self) -> RenderResult<()>;

    /// Frees every resource whose handle has been dropped, returning how many
    fn collect_released(&mut self) -> usize;
}

//! Headless [`GraphicsDevice`] that records each frame as data
//!
//! Programs and buffers are validated and tracked exactly as the wgpu backend
//! tracks them, but nothing is rasterized. A presented frame keeps the clear
//! color, viewport and, per draw, the program's staged uniform block and
//! attribute bindings.

use std::collections::HashMap;

use super::{
    BufferHandle, BufferKind, GraphicsDevice, ProgramHandle, ProgramState, ReleaseQueue,
    ResourceId, ResourceKind, ShaderSource, UniformLayout, UniformValue, VertexAttribute,
};
use crate::gfx::error::{RenderError, RenderResult};

/// One recorded draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: String,
    pub program_id: ResourceId,
    pub uniforms: Vec<u8>,
    pub layout: UniformLayout,
    pub attributes: Vec<(String, VertexAttribute)>,
    pub vertex_buffer: ResourceId,
    pub index_buffer: ResourceId,
    pub index_count: u32,
    pub depth_test: bool,
}

impl DrawCall {
    /// The value a uniform had when the draw was issued
    pub fn uniform(&self, name: &str) -> Option<&[f32]> {
        self.layout.read(&self.uniforms, name)
    }

    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attribute)| attribute)
    }
}

/// Everything issued between `clear` and `present`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub clear_color: Option<[f32; 4]>,
    pub viewport: Option<(u32, u32)>,
    pub draws: Vec<DrawCall>,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    queue: ReleaseQueue,
    next_id: ResourceId,
    programs: HashMap<ResourceId, ProgramState>,
    buffers: HashMap<ResourceId, (BufferKind, Vec<u8>)>,
    current_program: Option<ResourceId>,
    viewport: Option<(u32, u32)>,
    depth_test: bool,
    frame: Option<Frame>,
    frames: Vec<Frame>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        let mut device = Self::default();
        device.next_id = 1;
        device.depth_test = true;
        device
    }

    fn allocate_id(&mut self) -> ResourceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Presented frames, oldest first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of dropped handles not yet collected
    pub fn pending_releases(&self) -> usize {
        self.queue.len()
    }

    pub fn buffer_contents(&self, id: ResourceId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|(_, bytes)| bytes.as_slice())
    }

    pub fn current_program(&self) -> Option<ResourceId> {
        self.current_program
    }

    fn program_mut(&mut self, program: &ProgramHandle) -> RenderResult<&mut ProgramState> {
        self.programs
            .get_mut(&program.id())
            .ok_or(RenderError::UnknownResource(program.id()))
    }

    fn check_buffer(&self, handle: &BufferHandle, kind: BufferKind) -> RenderResult<()> {
        match self.buffers.get(&handle.id()) {
            Some((k, _)) if *k == kind => Ok(()),
            _ => Err(RenderError::UnknownResource(handle.id())),
        }
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramHandle> {
        source.validate()?;
        let id = self.allocate_id();
        self.programs.insert(id, ProgramState::new(source));
        log::debug!("created program '{}' (#{id})", source.label);
        Ok(ProgramHandle::new(id, &source.label, self.queue.clone()))
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let id = self.allocate_id();
        self.buffers.insert(id, (kind, contents.to_vec()));
        log::debug!("created {kind:?} buffer #{id} ({} bytes)", contents.len());
        BufferHandle::new(id, kind, contents.len() as u64, self.queue.clone())
    }

    fn write_buffer(
        &mut self,
        buffer: &BufferHandle,
        offset: u64,
        contents: &[u8],
    ) -> RenderResult<()> {
        let (_, bytes) = self
            .buffers
            .get_mut(&buffer.id())
            .ok_or(RenderError::UnknownResource(buffer.id()))?;
        buffer.check_write(offset, contents.len() as u64)?;
        let start = offset as usize;
        bytes[start..start + contents.len()].copy_from_slice(contents);
        Ok(())
    }

    fn use_program(&mut self, program: Option<&ProgramHandle>) {
        self.current_program = program.map(ProgramHandle::id);
    }

    fn set_uniform(
        &mut self,
        program: &ProgramHandle,
        name: &str,
        value: UniformValue,
    ) -> RenderResult<()> {
        self.program_mut(program)?.set_uniform(name, value)
    }

    fn set_vertex_attribute(
        &mut self,
        program: &ProgramHandle,
        name: &str,
        attribute: VertexAttribute,
    ) -> RenderResult<()> {
        self.program_mut(program)?.set_attribute(name, attribute)
    }

    fn draw_indexed(
        &mut self,
        vertices: &BufferHandle,
        indices: &BufferHandle,
        index_count: u32,
    ) -> RenderResult<()> {
        let program_id = self.current_program.ok_or(RenderError::NoActiveProgram)?;
        self.check_buffer(vertices, BufferKind::Vertex)?;
        self.check_buffer(indices, BufferKind::Index)?;

        let program = self
            .programs
            .get(&program_id)
            .ok_or(RenderError::UnknownResource(program_id))?;
        program.check_bound()?;

        let draw = DrawCall {
            program: program.label.clone(),
            program_id,
            uniforms: program.staging.clone(),
            layout: program.layout.clone(),
            attributes: program.attributes.values().cloned().collect(),
            vertex_buffer: vertices.id(),
            index_buffer: indices.id(),
            index_count,
            depth_test: self.depth_test,
        };

        let viewport = self.viewport;
        self.frame
            .get_or_insert_with(|| Frame {
                viewport,
                ..Default::default()
            })
            .draws
            .push(draw);
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.collect_released();
        if self.frame.is_some() {
            log::warn!("clear called before the previous frame was presented, discarding it");
        }
        self.frame = Some(Frame {
            clear_color: Some(color),
            viewport: self.viewport,
            draws: Vec::new(),
        });
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
        if let Some(frame) = self.frame.as_mut() {
            frame.viewport = self.viewport;
        }
    }

    fn enable_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn present(&mut self) -> RenderResult<()> {
        let frame = self.frame.take().unwrap_or_else(|| Frame {
            viewport: self.viewport,
            ..Default::default()
        });
        self.frames.push(frame);
        Ok(())
    }

    fn collect_released(&mut self) -> usize {
        let released = self.queue.drain();
        for &(kind, id) in &released {
            match kind {
                ResourceKind::Program => {
                    self.programs.remove(&id);
                    if self.current_program == Some(id) {
                        self.current_program = None;
                    }
                }
                ResourceKind::Buffer => {
                    self.buffers.remove(&id);
                }
            }
            log::debug!("released {kind:?} #{id}");
        }
        released.len()
    }
}

impl Drop for RecordingDevice {
    fn drop(&mut self) {
        self.collect_released();
        if !self.programs.is_empty() || !self.buffers.is_empty() {
            log::debug!(
                "recording device dropped with {} programs and {} buffers still referenced",
                self.programs.len(),
                self.buffers.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::{ShaderInterface, UniformKind};
    use crate::gfx::scene::vertex::Vertex3D;

    fn flat_source() -> ShaderSource {
        ShaderSource {
            label: "flat".to_string(),
            vertex: "@vertex fn vs_main(@location(0) aPosition: vec3<f32>) {}".to_string(),
            fragment: "@fragment fn fs_main() { u.uColor; }".to_string(),
            interface: ShaderInterface::new()
                .uniform("uColor", UniformKind::Vec4)
                .attribute("aPosition", 0),
        }
    }

    #[test]
    fn test_records_draw_with_staged_uniforms() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&flat_source()).unwrap();
        let vertices = device.create_buffer(BufferKind::Vertex, &[0; 72]);
        let indices = device.create_buffer(BufferKind::Index, bytemuck::cast_slice(&[0u32, 1, 2]));

        device.set_viewport(640, 480);
        device.clear([0.0, 0.0, 0.0, 1.0]);
        device.use_program(Some(&program));
        device
            .set_uniform(&program, "uColor", UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        device
            .set_vertex_attribute(&program, "aPosition", Vertex3D::POSITION)
            .unwrap();
        device.draw_indexed(&vertices, &indices, 3).unwrap();
        device.present().unwrap();

        let frame = device.last_frame().unwrap();
        assert_eq!(frame.clear_color, Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(frame.viewport, Some((640, 480)));
        assert_eq!(frame.draws.len(), 1);
        assert_eq!(frame.draws[0].uniform("uColor"), Some(&[1.0, 0.0, 0.0, 1.0][..]));
        assert_eq!(frame.draws[0].attribute("aPosition"), Some(&Vertex3D::POSITION));
    }

    #[test]
    fn test_draw_without_program_fails() {
        let mut device = RecordingDevice::new();
        let vertices = device.create_buffer(BufferKind::Vertex, &[0; 72]);
        let indices = device.create_buffer(BufferKind::Index, &[0; 12]);
        assert!(matches!(
            device.draw_indexed(&vertices, &indices, 3),
            Err(RenderError::NoActiveProgram)
        ));
    }

    #[test]
    fn test_unknown_attribute_is_reported() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&flat_source()).unwrap();
        let err = device
            .set_vertex_attribute(&program, "aNormal", Vertex3D::NORMAL)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownAttribute { ref name, .. } if name == "aNormal"));
    }

    #[test]
    fn test_write_buffer_stays_inside_buffer() {
        let mut device = RecordingDevice::new();
        let buffer = device.create_buffer(BufferKind::Vertex, &[0; 12]);

        device.write_buffer(&buffer, 4, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        assert_eq!(
            device.buffer_contents(buffer.id()),
            Some(&[0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8][..])
        );

        assert!(matches!(
            device.write_buffer(&buffer, 8, &[0; 16]),
            Err(RenderError::BufferOverflow { offset: 8, len: 16, size: 12, .. })
        ));
        assert!(matches!(
            device.write_buffer(&buffer, 2, &[0; 4]),
            Err(RenderError::UnalignedBufferWrite { offset: 2, .. })
        ));
        assert!(matches!(
            device.write_buffer(&buffer, 0, &[0; 3]),
            Err(RenderError::UnalignedBufferWrite { len: 3, .. })
        ));
        assert!(matches!(
            device.write_buffer(&buffer, u64::MAX - 3, &[0; 4]),
            Err(RenderError::BufferOverflow { .. })
        ));
        assert_eq!(device.buffer_contents(buffer.id()).map(<[u8]>::len), Some(12));
    }

    #[test]
    fn test_dropped_handles_are_collected() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&flat_source()).unwrap();
        let buffer = device.create_buffer(BufferKind::Vertex, &[0; 24]);
        assert_eq!((device.live_programs(), device.live_buffers()), (1, 1));

        drop(program);
        drop(buffer);
        assert_eq!(device.pending_releases(), 2);

        device.clear([0.0; 4]);
        assert_eq!((device.live_programs(), device.live_buffers()), (0, 0));
        assert_eq!(device.pending_releases(), 0);
    }
}

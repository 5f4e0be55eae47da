//! WGPU-based rendering engine
//!
//! [`RenderEngine`] is the windowed [`GraphicsDevice`]. Draw calls issued
//! during a frame are recorded together with a copy of the program's staged
//! uniforms; `present` writes all uniform blocks in one upload and replays
//! the draws in a single render pass that clears color and depth.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::config::RenderConfig;
use crate::gfx::device::{
    BufferHandle, BufferKind, GraphicsDevice, ProgramHandle, ProgramState, ReleaseQueue,
    ResourceId, ResourceKind, ShaderSource, UniformValue, VertexAttribute, MAX_UNIFORM_BLOCK_SIZE,
};
use crate::gfx::error::{RenderError, RenderResult};
use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{align_to, binding_types, DynamicUniformBuffer};

use super::pipeline_manager::{PipelineConfig, PipelineKey, PipelineManager};

struct DrawCommand {
    pipeline: PipelineKey,
    uniform_offset: u32,
    /// `(buffer, byte offset)` per vertex buffer slot
    vertex_slices: Vec<(ResourceId, u64)>,
    index_buffer: ResourceId,
    index_count: u32,
}

struct FrameState {
    clear_color: wgpu::Color,
    draws: Vec<DrawCommand>,
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles:
/// - Surface and device management
/// - Program compilation and lazy pipeline creation
/// - Vertex/index buffer ownership
/// - Per-draw uniform upload through one dynamic-offset buffer
/// - Depth buffer handling
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,

    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: DynamicUniformBuffer,
    uniform_bind_group: wgpu::BindGroup,

    release_queue: ReleaseQueue,
    next_id: ResourceId,
    programs: HashMap<ResourceId, ProgramState>,
    buffers: HashMap<ResourceId, (BufferKind, wgpu::Buffer)>,

    current_program: Option<ResourceId>,
    viewport: Option<(u32, u32)>,
    depth_test: bool,
    default_clear: [f32; 4],
    frame: Option<FrameState>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `render_config` - Clear color, depth test and vsync settings
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        render_config: &RenderConfig,
    ) -> RenderResult<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).map_err(RenderError::surface)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Adapter(e.to_string()))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::surface("surface reports no supported formats"))?;

        let requested_mode = render_config.present_mode();
        let present_mode = if surface_capabilities.present_modes.contains(&requested_mode) {
            requested_mode
        } else {
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let slot_size = align_to(
            MAX_UNIFORM_BLOCK_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniform_layout = binding_types::single_entry_layout(
            &device,
            binding_types::dynamic_uniform(slot_size),
            "Uniform Block Layout",
        );
        let uniform_buffer = DynamicUniformBuffer::new(&device, slot_size);
        let uniform_bind_group = Self::create_uniform_bind_group(&device, &uniform_layout, &uniform_buffer);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let pipeline_manager = PipelineManager::new(
            device_handle.clone(),
            PipelineConfig::default().with_color_format(format),
            &uniform_layout,
        );

        log::info!("render engine ready: {width}x{height}, {format:?}, {present_mode:?}");

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            pipeline_manager,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            release_queue: ReleaseQueue::new(),
            next_id: 1,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            current_program: None,
            viewport: None,
            depth_test: render_config.depth_test,
            default_clear: render_config.clear_color,
            frame: None,
        })
    }

    fn create_uniform_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &DynamicUniformBuffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Block Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.binding_resource(),
            }],
        })
    }

    fn allocate_id(&mut self) -> ResourceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero-sized requests (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    fn acquire_frame(&mut self) -> RenderResult<Option<wgpu::SurfaceTexture>> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring the next surface texture, skipping frame");
                Ok(None)
            }
            Err(e) => Err(RenderError::surface(e)),
        }
    }

    fn begin_frame(&mut self, color: [f32; 4]) {
        self.uniform_buffer.slots_mut().clear();
        self.frame = Some(FrameState {
            clear_color: wgpu::Color {
                r: color[0] as f64,
                g: color[1] as f64,
                b: color[2] as f64,
                a: color[3] as f64,
            },
            draws: Vec::new(),
        });
    }

    fn buffer(&self, handle: &BufferHandle, kind: BufferKind) -> RenderResult<&wgpu::Buffer> {
        match self.buffers.get(&handle.id()) {
            Some((k, buffer)) if *k == kind => Ok(buffer),
            _ => Err(RenderError::UnknownResource(handle.id())),
        }
    }

    fn program_mut(&mut self, program: &ProgramHandle) -> RenderResult<&mut ProgramState> {
        self.programs
            .get_mut(&program.id())
            .ok_or(RenderError::UnknownResource(program.id()))
    }
}

impl GraphicsDevice for RenderEngine {
    fn create_program(&mut self, source: &ShaderSource) -> RenderResult<ProgramHandle> {
        source.validate()?;
        let id = self.allocate_id();
        self.pipeline_manager
            .load_program(id, &source.label, &source.vertex, &source.fragment)?;
        self.programs.insert(id, ProgramState::new(source));
        log::debug!("created program '{}' (#{id})", source.label);
        Ok(ProgramHandle::new(id, &source.label, self.release_queue.clone()))
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> BufferHandle {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;

        let id = self.allocate_id();
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{kind:?} Buffer #{id}")),
                contents,
                usage,
            });
        self.buffers.insert(id, (kind, buffer));
        log::debug!("created {kind:?} buffer #{id} ({} bytes)", contents.len());
        BufferHandle::new(id, kind, contents.len() as u64, self.release_queue.clone())
    }

    fn write_buffer(
        &mut self,
        buffer: &BufferHandle,
        offset: u64,
        contents: &[u8],
    ) -> RenderResult<()> {
        buffer.check_write(offset, contents.len() as u64)?;
        let target = self.buffer(buffer, buffer.kind())?;
        self.queue.write_buffer(target, offset, contents);
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
        self.buffer(vertices, BufferKind::Vertex)?;
        self.buffer(indices, BufferKind::Index)?;

        let program = self
            .programs
            .get(&program_id)
            .ok_or(RenderError::UnknownResource(program_id))?;
        program.check_bound()?;

        let key = PipelineKey::for_program(program_id, program, self.depth_test)?;
        let vertex_slices = program
            .attributes
            .values()
            .map(|(_, attribute)| (vertices.id(), attribute.offset))
            .collect();
        let staging = program.staging.clone();

        self.pipeline_manager.ensure_pipeline(&key)?;

        if self.frame.is_none() {
            self.begin_frame(self.default_clear);
        }
        let uniform_offset = self.uniform_buffer.slots_mut().push(&staging);
        if let Some(frame) = self.frame.as_mut() {
            frame.draws.push(DrawCommand {
                pipeline: key,
                uniform_offset,
                vertex_slices,
                index_buffer: indices.id(),
                index_count,
            });
        }
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.collect_released();
        if self.frame.is_some() {
            log::warn!("clear called before the previous frame was presented, discarding it");
        }
        self.begin_frame(color);
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    fn enable_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn present(&mut self) -> RenderResult<()> {
        let frame = match self.frame.take() {
            Some(frame) => frame,
            None => {
                self.begin_frame(self.default_clear);
                self.frame.take().ok_or(RenderError::surface("no frame to present"))?
            }
        };

        let Some(surface_texture) = self.acquire_frame()? else {
            return Ok(());
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if self.uniform_buffer.upload(&self.device, &self.queue) {
            self.uniform_bind_group = Self::create_uniform_bind_group(
                &self.device,
                &self.uniform_layout,
                &self.uniform_buffer,
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some((width, height)) = self.viewport {
                let width = width.min(self.config.width) as f32;
                let height = height.min(self.config.height) as f32;
                render_pass.set_viewport(0.0, 0.0, width, height, 0.0, 1.0);
            }

            for draw in &frame.draws {
                let Some(pipeline) = self.pipeline_manager.get_pipeline(&draw.pipeline) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);

                for (slot, &(buffer, offset)) in draw.vertex_slices.iter().enumerate() {
                    if let Some((_, vertex_buffer)) = self.buffers.get(&buffer) {
                        render_pass.set_vertex_buffer(slot as u32, vertex_buffer.slice(offset..));
                    }
                }
                if let Some((_, index_buffer)) = self.buffers.get(&draw.index_buffer) {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..draw.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn collect_released(&mut self) -> usize {
        let released = self.release_queue.drain();
        for &(kind, id) in &released {
            match kind {
                ResourceKind::Program => {
                    self.programs.remove(&id);
                    self.pipeline_manager.remove_program(id);
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

impl Drop for RenderEngine {
    fn drop(&mut self) {
        self.collect_released();
        if !self.programs.is_empty() || !self.buffers.is_empty() {
            log::warn!(
                "render engine dropped while {} programs and {} buffers are still referenced",
                self.programs.len(),
                self.buffers.len()
            );
        }
    }
}

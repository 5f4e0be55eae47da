//! Render pipeline management system for wgpu
//!
//! Compiles each program's shader modules once and builds render pipelines
//! lazily, one per combination of program, vertex attribute layout and depth
//! state actually drawn with.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::gfx::device::{ProgramState, ResourceId, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::gfx::error::{RenderError, RenderResult};
use crate::gfx::resources::texture_resource::TextureResource;

/// Fixed render state shared by every pipeline the manager builds
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub color_format: TextureFormat,
    pub blend: Option<BlendState>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Scene Pipeline".to_string(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            color_format: TextureFormat::Bgra8Unorm,
            blend: Some(BlendState::REPLACE),
        }
    }
}

impl PipelineConfig {
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }
}

/// Identifies one pipeline variant
///
/// Each bound attribute is its own vertex buffer slot, in location order:
/// `(shader location, format, stride)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ResourceId,
    pub attributes: Vec<(u32, VertexFormat, u64)>,
    pub depth_test: bool,
}

impl PipelineKey {
    pub fn for_program(id: ResourceId, program: &ProgramState, depth_test: bool) -> RenderResult<Self> {
        let attributes = program
            .attributes
            .iter()
            .map(|(&location, (_, attribute))| Ok((location, attribute.format()?, attribute.stride)))
            .collect::<RenderResult<Vec<_>>>()?;

        Ok(Self {
            program: id,
            attributes,
            depth_test,
        })
    }
}

struct ProgramModules {
    label: String,
    vertex: ShaderModule,
    fragment: ShaderModule,
}

/// Caches shader modules per program and pipelines per [`PipelineKey`]
pub struct PipelineManager {
    device: Arc<Device>,
    config: PipelineConfig,
    layout: PipelineLayout,
    modules: HashMap<ResourceId, ProgramModules>,
    pipelines: HashMap<PipelineKey, RenderPipeline>,
}

impl PipelineManager {
    /// Creates a new pipeline manager
    ///
    /// # Arguments
    /// * `device` - Shared wgpu device for creating resources
    /// * `config` - Render state for every pipeline
    /// * `uniform_layout` - Layout of the per-draw uniform group (group 0)
    pub fn new(device: Arc<Device>, config: PipelineConfig, uniform_layout: &BindGroupLayout) -> Self {
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", config.label)),
            bind_group_layouts: &[uniform_layout],
            push_constant_ranges: &[],
        });

        Self {
            device,
            config,
            layout,
            modules: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Compiles both stages of a program
    ///
    /// Validation errors raised by wgpu are captured with an error scope and
    /// returned as [`RenderError::Compile`] instead of reaching the device's
    /// uncaptured error handler.
    pub fn load_program(&mut self, id: ResourceId, label: &str, vertex: &str, fragment: &str) -> RenderResult<()> {
        let vertex = self.compile(&format!("{label} (vertex)"), vertex)?;
        let fragment = self.compile(&format!("{label} (fragment)"), fragment)?;
        self.modules.insert(
            id,
            ProgramModules {
                label: label.to_string(),
                vertex,
                fragment,
            },
        );
        Ok(())
    }

    fn compile(&self, label: &str, source: &str) -> RenderResult<ShaderModule> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(RenderError::Compile {
                label: label.to_string(),
                log: error.to_string(),
            }),
            None => Ok(module),
        }
    }

    /// Drops a program's modules and every pipeline built from them
    pub fn remove_program(&mut self, id: ResourceId) {
        self.modules.remove(&id);
        self.pipelines.retain(|key, _| key.program != id);
    }

    /// Builds the pipeline for `key` unless it already exists
    pub fn ensure_pipeline(&mut self, key: &PipelineKey) -> RenderResult<()> {
        if self.pipelines.contains_key(key) {
            return Ok(());
        }

        let pipeline = self.create_pipeline(key)?;
        log::debug!(
            "created pipeline for program #{} ({} attributes, depth test {})",
            key.program,
            key.attributes.len(),
            key.depth_test
        );
        self.pipelines.insert(key.clone(), pipeline);
        Ok(())
    }

    pub fn get_pipeline(&self, key: &PipelineKey) -> Option<&RenderPipeline> {
        self.pipelines.get(key)
    }

    fn create_pipeline(&self, key: &PipelineKey) -> RenderResult<RenderPipeline> {
        let modules = self
            .modules
            .get(&key.program)
            .ok_or(RenderError::UnknownResource(key.program))?;

        let attributes: Vec<[VertexAttribute; 1]> = key
            .attributes
            .iter()
            .map(|&(location, format, _)| {
                [VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: location,
                }]
            })
            .collect();
        let vertex_buffers: Vec<VertexBufferLayout> = key
            .attributes
            .iter()
            .zip(attributes.iter())
            .map(|(&(_, _, stride), attribute)| VertexBufferLayout {
                array_stride: stride,
                step_mode: VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let depth_stencil = DepthStencilState {
            format: TextureResource::DEPTH_FORMAT,
            depth_write_enabled: key.depth_test,
            depth_compare: if key.depth_test {
                CompareFunction::Less
            } else {
                CompareFunction::Always
            },
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        };

        let color_targets = [Some(ColorTargetState {
            format: self.config.color_format,
            blend: self.config.blend,
            write_mask: ColorWrites::ALL,
        })];

        self.device.push_error_scope(ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&format!("{} ({})", self.config.label, modules.label)),
            layout: Some(&self.layout),
            vertex: VertexState {
                module: &modules.vertex,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &vertex_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &modules.fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: self.config.primitive_topology,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: self.config.cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_stencil),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(RenderError::Link {
                label: modules.label.clone(),
                log: error.to_string(),
            }),
            None => Ok(pipeline),
        }
    }
}

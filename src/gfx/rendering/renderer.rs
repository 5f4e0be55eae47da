//! One model drawn with one material

use std::rc::Rc;

use cgmath::Matrix4;

use crate::gfx::device::{BufferHandle, BufferKind, GraphicsDevice};
use crate::gfx::error::{RenderError, RenderResult};
use crate::gfx::geometry::Model;
use crate::gfx::light::Light;
use crate::gfx::resources::Material;
use crate::gfx::scene::vertex::Vertex3D;

/// Everything a material needs to set its uniforms for one draw
#[derive(Debug, Clone, Copy)]
pub struct RenderProperties<'a> {
    pub model_matrix: Matrix4<f32>,
    pub view_matrix: Matrix4<f32>,
    pub projection_matrix: Matrix4<f32>,
    pub light: &'a Light,
}

struct GeometryBuffers {
    vertices: BufferHandle,
    indices: BufferHandle,
    index_count: u32,
}

/// Binds a model's geometry to a material and issues its draw call
///
/// Vertex and index buffers are uploaded on the first render and reused
/// until the model is replaced.
pub struct Renderer {
    model: Rc<Model>,
    material: Rc<dyn Material>,
    buffers: Option<GeometryBuffers>,
}

impl Renderer {
    pub fn new(model: Rc<Model>, material: Rc<dyn Material>) -> Self {
        Self {
            model,
            material,
            buffers: None,
        }
    }

    pub fn model(&self) -> &Rc<Model> {
        &self.model
    }

    /// Replaces the geometry; buffers are re-uploaded on the next render
    pub fn set_model(&mut self, model: Rc<Model>) {
        self.model = model;
        self.buffers = None;
    }

    pub fn material(&self) -> &Rc<dyn Material> {
        &self.material
    }

    pub fn set_material(&mut self, material: Rc<dyn Material>) {
        self.material = material;
    }

    /// Whether geometry buffers currently exist on the device
    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Draws the model: activate the material, push its uniforms, bind its
    /// attributes, draw every index, deactivate
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        properties: &RenderProperties,
    ) -> RenderResult<()> {
        if self.model.indices().is_empty() {
            return Ok(());
        }

        let material = Rc::clone(&self.material);
        let mut active = material.activate(device);
        material.apply_uniforms(&mut *active, properties)?;

        let buffers = match self.buffers.take() {
            Some(buffers) => buffers,
            None => upload(&mut *active, &self.model),
        };
        let buffers = &*self.buffers.insert(buffers);

        for &name in material.vertex_attributes() {
            let attribute = Vertex3D::attribute(name).ok_or_else(|| RenderError::UnknownAttribute {
                program: material.name().to_string(),
                name: name.to_string(),
            })?;
            material.set_vertex_attribute(&mut *active, name, attribute)?;
        }

        active.draw_indexed(&buffers.vertices, &buffers.indices, buffers.index_count)
    }
}

fn upload(device: &mut dyn GraphicsDevice, model: &Model) -> GeometryBuffers {
    let vertices = device.create_buffer(
        BufferKind::Vertex,
        bytemuck::cast_slice(model.vertex_buffer_data()),
    );
    let indices = device.create_buffer(BufferKind::Index, bytemuck::cast_slice(model.indices()));
    GeometryBuffers {
        vertices,
        indices,
        index_count: model.indices().len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::RecordingDevice;
    use crate::gfx::geometry::{cube_model_data, ModelData};
    use crate::gfx::resources::{LitMaterial, UnlitMaterial};
    use cgmath::SquareMatrix;

    fn properties(light: &Light) -> RenderProperties<'_> {
        RenderProperties {
            model_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
            light,
        }
    }

    #[test]
    fn test_render_issues_one_draw_and_deactivates() {
        let mut device = RecordingDevice::new();
        let material: Rc<dyn Material> =
            Rc::new(LitMaterial::new(&mut device, [1.0, 1.0, 1.0, 1.0]).unwrap());
        let model = Rc::new(Model::new(cube_model_data()).unwrap());
        let mut renderer = Renderer::new(model, material);
        let light = Light::default();

        device.clear([0.0; 4]);
        renderer.render(&mut device, &properties(&light)).unwrap();
        device.present().unwrap();

        let draws = &device.last_frame().unwrap().draws;
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].index_count, 36);
        assert_eq!(draws[0].attribute("aNormal"), Some(&Vertex3D::NORMAL));
        assert_eq!(device.current_program(), None);
    }

    #[test]
    fn test_buffers_are_reused_until_model_changes() {
        let mut device = RecordingDevice::new();
        let material: Rc<dyn Material> =
            Rc::new(UnlitMaterial::new(&mut device, [1.0, 0.0, 0.0, 1.0]).unwrap());
        let mut renderer = Renderer::new(Rc::new(Model::new(cube_model_data()).unwrap()), material);
        let light = Light::default();

        renderer.render(&mut device, &properties(&light)).unwrap();
        renderer.render(&mut device, &properties(&light)).unwrap();
        assert_eq!(device.live_buffers(), 2);

        renderer.set_model(Rc::new(Model::from_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap()));
        assert!(!renderer.is_uploaded());
        renderer.render(&mut device, &properties(&light)).unwrap();
        device.collect_released();
        assert_eq!(device.live_buffers(), 2);
    }

    #[test]
    fn test_empty_model_skips_draw() {
        let mut device = RecordingDevice::new();
        let material: Rc<dyn Material> =
            Rc::new(UnlitMaterial::new(&mut device, [1.0; 4]).unwrap());
        let mut renderer = Renderer::new(Rc::new(Model::new(ModelData::default()).unwrap()), material);
        let light = Light::default();

        device.clear([0.0; 4]);
        renderer.render(&mut device, &properties(&light)).unwrap();
        device.present().unwrap();
        assert!(device.last_frame().unwrap().draws.is_empty());
        assert_eq!(device.live_buffers(), 0);
    }
}

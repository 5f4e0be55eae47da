//! Material system
//!
//! A material owns one compiled program and knows which uniforms and vertex
//! attributes that program consumes. Materials are shared between renderers
//! as `Rc<dyn Material>`; the base color is interior-mutable so a shared
//! material can be recolored without rebuilding anything.

use std::cell::Cell;
use std::ops::{Deref, DerefMut};

use cgmath::{InnerSpace, Vector3};

use crate::gfx::device::{
    GraphicsDevice, ProgramHandle, ShaderInterface, ShaderSource, UniformKind, VertexAttribute,
};
use crate::gfx::error::RenderResult;
use crate::gfx::light::Light;
use crate::gfx::rendering::RenderProperties;

pub const POSITION_ATTRIBUTE: &str = "aPosition";
pub const NORMAL_ATTRIBUTE: &str = "aNormal";

pub const MODEL_MATRIX: &str = "uModelMatrix";
pub const VIEW_MATRIX: &str = "uViewMatrix";
pub const PROJECTION_MATRIX: &str = "uProjectionMatrix";
pub const COLOR: &str = "uColor";
pub const LIGHT_DIRECTION: &str = "uLightDirection";
pub const LIGHT_COLOR: &str = "uLightColor";
pub const AMBIENT_COLOR: &str = "uAmbientColor";

/// Shading capability shared by every material variant
pub trait Material {
    fn name(&self) -> &str;

    fn program(&self) -> &ProgramHandle;

    /// RGBA base color
    fn color(&self) -> [f32; 4];

    fn set_color(&self, color: [f32; 4]);

    /// Vertex attribute names this material's program reads, in location order
    fn vertex_attributes(&self) -> &'static [&'static str];

    /// Pushes every uniform the program declares for one draw
    fn apply_uniforms(
        &self,
        device: &mut dyn GraphicsDevice,
        properties: &RenderProperties,
    ) -> RenderResult<()>;

    fn set_vertex_attribute(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        attribute: VertexAttribute,
    ) -> RenderResult<()> {
        device.set_vertex_attribute(self.program(), name, attribute)
    }

    /// Makes this material's program current until the guard is dropped
    fn activate<'d>(&self, device: &'d mut dyn GraphicsDevice) -> ActiveProgram<'d> {
        device.use_program(Some(self.program()));
        ActiveProgram { device }
    }
}

/// Scope guard returned by [`Material::activate`]
///
/// Derefs to the device so draws can be issued while the program is bound.
/// Dropping it deactivates the program, including on early `?` returns.
pub struct ActiveProgram<'d> {
    device: &'d mut dyn GraphicsDevice,
}

impl<'d> Deref for ActiveProgram<'d> {
    type Target = dyn GraphicsDevice + 'd;

    fn deref(&self) -> &Self::Target {
        &*self.device
    }
}

impl<'d> DerefMut for ActiveProgram<'d> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.device
    }
}

impl Drop for ActiveProgram<'_> {
    fn drop(&mut self) {
        self.device.use_program(None);
    }
}

fn push_transform_uniforms(
    device: &mut dyn GraphicsDevice,
    program: &ProgramHandle,
    properties: &RenderProperties,
    color: [f32; 4],
) -> RenderResult<()> {
    device.set_uniform(program, MODEL_MATRIX, properties.model_matrix.into())?;
    device.set_uniform(program, VIEW_MATRIX, properties.view_matrix.into())?;
    device.set_uniform(program, PROJECTION_MATRIX, properties.projection_matrix.into())?;
    device.set_uniform(program, COLOR, color.into())
}

fn transform_interface() -> ShaderInterface {
    ShaderInterface::new()
        .uniform(MODEL_MATRIX, UniformKind::Mat4)
        .uniform(VIEW_MATRIX, UniformKind::Mat4)
        .uniform(PROJECTION_MATRIX, UniformKind::Mat4)
        .uniform(COLOR, UniformKind::Vec4)
        .attribute(POSITION_ATTRIBUTE, 0)
}

/// Flat color, no lighting
pub struct UnlitMaterial {
    program: ProgramHandle,
    color: Cell<[f32; 4]>,
}

impl UnlitMaterial {
    pub fn shader_source() -> ShaderSource {
        ShaderSource {
            label: "unlit".to_string(),
            vertex: include_str!("shaders/unlit.vert.wgsl").to_string(),
            fragment: include_str!("shaders/unlit.frag.wgsl").to_string(),
            interface: transform_interface(),
        }
    }

    pub fn new(device: &mut dyn GraphicsDevice, color: [f32; 4]) -> RenderResult<Self> {
        Ok(Self {
            program: device.create_program(&Self::shader_source())?,
            color: Cell::new(color),
        })
    }
}

impl Material for UnlitMaterial {
    fn name(&self) -> &str {
        "unlit"
    }

    fn program(&self) -> &ProgramHandle {
        &self.program
    }

    fn color(&self) -> [f32; 4] {
        self.color.get()
    }

    fn set_color(&self, color: [f32; 4]) {
        self.color.set(color);
    }

    fn vertex_attributes(&self) -> &'static [&'static str] {
        &[POSITION_ATTRIBUTE]
    }

    fn apply_uniforms(
        &self,
        device: &mut dyn GraphicsDevice,
        properties: &RenderProperties,
    ) -> RenderResult<()> {
        push_transform_uniforms(device, &self.program, properties, self.color())
    }
}

/// Lambert diffuse plus ambient under the scene's directional light
///
/// Normals are transformed by the upper 3x3 of the model matrix, so
/// non-uniform scale skews shading.
pub struct LitMaterial {
    program: ProgramHandle,
    color: Cell<[f32; 4]>,
}

impl LitMaterial {
    pub fn shader_source() -> ShaderSource {
        ShaderSource {
            label: "lit".to_string(),
            vertex: include_str!("shaders/lit.vert.wgsl").to_string(),
            fragment: include_str!("shaders/lit.frag.wgsl").to_string(),
            interface: transform_interface()
                .uniform(LIGHT_DIRECTION, UniformKind::Vec3)
                .uniform(LIGHT_COLOR, UniformKind::Vec3)
                .uniform(AMBIENT_COLOR, UniformKind::Vec3)
                .attribute(NORMAL_ATTRIBUTE, 1),
        }
    }

    pub fn new(device: &mut dyn GraphicsDevice, color: [f32; 4]) -> RenderResult<Self> {
        Ok(Self {
            program: device.create_program(&Self::shader_source())?,
            color: Cell::new(color),
        })
    }
}

impl Material for LitMaterial {
    fn name(&self) -> &str {
        "lit"
    }

    fn program(&self) -> &ProgramHandle {
        &self.program
    }

    fn color(&self) -> [f32; 4] {
        self.color.get()
    }

    fn set_color(&self, color: [f32; 4]) {
        self.color.set(color);
    }

    fn vertex_attributes(&self) -> &'static [&'static str] {
        &[POSITION_ATTRIBUTE, NORMAL_ATTRIBUTE]
    }

    fn apply_uniforms(
        &self,
        device: &mut dyn GraphicsDevice,
        properties: &RenderProperties,
    ) -> RenderResult<()> {
        push_transform_uniforms(device, &self.program, properties, self.color())?;
        let light = properties.light;
        device.set_uniform(&self.program, LIGHT_DIRECTION, light.direction().into())?;
        device.set_uniform(&self.program, LIGHT_COLOR, light.color().into())?;
        device.set_uniform(&self.program, AMBIENT_COLOR, light.ambient_color().into())
    }
}

/// Per-channel light reaching a surface with the given world-space normal,
/// as computed by the lit fragment shader
pub fn lambert_intensity(normal: Vector3<f32>, light: &Light) -> Vector3<f32> {
    let diffuse = normal.normalize().dot(-light.direction()).max(0.0);
    light.ambient_color() + light.color() * diffuse
}

/// Final lit color for `color` on a surface with the given normal
pub fn shade(color: [f32; 4], normal: Vector3<f32>, light: &Light) -> [f32; 4] {
    let intensity = lambert_intensity(normal, light);
    [
        color[0] * intensity.x,
        color[1] * intensity.y,
        color[2] * intensity.z,
        color[3],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::device::RecordingDevice;
    use cgmath::{Matrix4, SquareMatrix};

    fn light() -> Light {
        Light::new(
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
        )
    }

    #[test]
    fn test_facing_light_is_brighter_than_perpendicular() {
        let light = light();
        let color = [0.5, 0.5, 0.5, 1.0];
        let facing = shade(color, Vector3::new(0.0, 1.0, 0.0), &light);
        let perpendicular = shade(color, Vector3::new(1.0, 0.0, 0.0), &light);
        let away = shade(color, Vector3::new(0.0, -1.0, 0.0), &light);

        assert!(facing[0] > perpendicular[0]);
        assert_eq!(perpendicular, away);
        assert_eq!(perpendicular, [0.25, 0.25, 0.25, 1.0]);
        assert_eq!(facing[3], 1.0);
    }

    #[test]
    fn test_unnormalized_normals_shade_the_same() {
        let light = light();
        let short = lambert_intensity(Vector3::new(0.0, 0.5, 0.0), &light);
        let unit = lambert_intensity(Vector3::new(0.0, 1.0, 0.0), &light);
        assert!((short - unit).magnitude() < 1e-6);
    }

    #[test]
    fn test_shader_sources_declare_their_interface() {
        for source in [UnlitMaterial::shader_source(), LitMaterial::shader_source()] {
            source.validate().unwrap();
        }
        assert_eq!(LitMaterial::shader_source().interface.layout().size(), 256);
        assert_eq!(UnlitMaterial::shader_source().interface.layout().size(), 208);
    }

    #[test]
    fn test_lit_uniforms_are_staged() {
        let mut device = RecordingDevice::new();
        let material = LitMaterial::new(&mut device, [1.0, 0.0, 0.0, 1.0]).unwrap();
        let light = light();
        let properties = RenderProperties {
            model_matrix: Matrix4::identity(),
            view_matrix: Matrix4::identity(),
            projection_matrix: Matrix4::identity(),
            light: &light,
        };

        material.set_color([0.0, 1.0, 0.0, 1.0]);
        let mut active = material.activate(&mut device);
        material.apply_uniforms(&mut *active, &properties).unwrap();
        drop(active);
        assert_eq!(device.current_program(), None);
        assert_eq!(material.color(), [0.0, 1.0, 0.0, 1.0]);
    }
}

use crate::gfx::{camera::Camera, device::GraphicsDevice, error::RenderResult, light::Light};

use super::object::{ObjectRenderProps, SceneGraph};

/// Main scene: the object tree, one camera and one directional light
pub struct Scene {
    pub graph: SceneGraph,
    pub camera: Camera,
    pub light: Light,
    pub clear_color: [f32; 4],
}

impl Scene {
    /// Creates an empty scene with a black clear color
    pub fn new(camera: Camera, light: Light) -> Self {
        Self {
            graph: SceneGraph::new(),
            camera,
            light,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Clears the frame and renders every root with the camera and light
    ///
    /// Rendering does not change the scene, so rendering twice without
    /// changes issues identical draws.
    pub fn render(&mut self, device: &mut dyn GraphicsDevice) -> RenderResult<()> {
        device.clear(self.clear_color);
        let props = ObjectRenderProps {
            view_matrix: self.camera.view_matrix(),
            projection_matrix: self.camera.projection_matrix(),
            light: &self.light,
        };
        self.graph.render(device, &props)
    }

    /// Matches the camera aspect and device viewport to a new canvas size
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("ignoring resize to {width}x{height}");
            return;
        }
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        device.set_viewport(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use cgmath::Vector3;

    use crate::gfx::camera::Projection;
    use crate::gfx::device::RecordingDevice;
    use crate::gfx::geometry::{cube_model_data, Model};
    use crate::gfx::rendering::Renderer;
    use crate::gfx::resources::{LitMaterial, Material};
    use crate::gfx::transform::Transform;

    fn cube_scene(device: &mut RecordingDevice) -> Scene {
        let material: Rc<dyn Material> =
            Rc::new(LitMaterial::new(device, [0.25, 1.0, 0.75, 1.0]).unwrap());
        let cube = Rc::new(Model::new(cube_model_data()).unwrap());

        let mut scene = Scene::new(Camera::default(), Light::default()).with_clear_color([0.1, 0.1, 0.1, 1.0]);
        let root = scene
            .graph
            .add_root(Transform::default(), Some(Renderer::new(cube.clone(), material.clone())));
        let mut offset = Transform::default();
        offset.translate(Vector3::new(2.0, 0.0, 0.0));
        scene
            .graph
            .add_child(root, offset, Some(Renderer::new(cube, material)))
            .unwrap();
        scene
    }

    #[test]
    fn test_rendering_twice_records_identical_frames() {
        let mut device = RecordingDevice::new();
        let mut scene = cube_scene(&mut device);

        for _ in 0..2 {
            scene.render(&mut device).unwrap();
            device.present().unwrap();
        }

        let frames = device.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].draws.len(), 2);
        assert_eq!(frames[0].clear_color, Some([0.1, 0.1, 0.1, 1.0]));
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn test_resize_changes_only_aspect() {
        let mut device = RecordingDevice::new();
        let mut scene = Scene::new(
            Camera::new(Transform::default(), Projection::new(1.0472, 1.0, 0.1, 1000.0)),
            Light::default(),
        );

        scene.resize(&mut device, 1600, 900);
        let projection = *scene.camera.projection();
        assert_eq!(projection.aspect_ratio, 1600.0 / 900.0);
        assert_eq!(
            (projection.fov_y, projection.near, projection.far),
            (1.0472, 0.1, 1000.0)
        );

        scene.resize(&mut device, 0, 900);
        assert_eq!(scene.camera.projection().aspect_ratio, 1600.0 / 900.0);

        device.clear([0.0; 4]);
        device.present().unwrap();
        assert_eq!(device.last_frame().unwrap().viewport, Some((1600, 900)));
    }

    #[test]
    fn test_dropping_scene_releases_device_resources() {
        let mut device = RecordingDevice::new();
        let mut scene = cube_scene(&mut device);
        scene.render(&mut device).unwrap();
        device.present().unwrap();
        assert_eq!(device.live_programs(), 1);
        assert_eq!(device.live_buffers(), 4);

        drop(scene);
        assert_eq!(device.collect_released(), 5);
        assert_eq!(device.live_programs(), 0);
        assert_eq!(device.live_buffers(), 0);
    }
}
